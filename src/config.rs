//! 配置与端点解析
//!
//! 前端部署时在站点根目录放置 `/config.json`（`{"API_BASE_URL": "..."}`），
//! 首次请求时加载一次并缓存，加载失败则回退到默认地址。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::request::{HttpClient, HttpRequest};
use crate::session::TokenPolicy;

// =========================================================
// 默认值
// =========================================================

pub const DEFAULT_CONFIG_PATH: &str = "/config.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TOKEN_KEY: &str = "stroll_token";
pub const DEFAULT_USER_KEY: &str = "stroll_user";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// `/config.json` 的内容
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "API_BASE_URL")]
    pub api_base_url: String,
}

/// 客户端运行时设置
///
/// 所有字段都有默认值，测试或嵌入方可以按需覆盖。
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub config_path: String,
    pub default_base_url: String,
    pub request_timeout: Duration,
    pub token_key: String,
    pub user_key: String,
    pub token_policy: TokenPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            default_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            user_key: DEFAULT_USER_KEY.to_string(),
            token_policy: TokenPolicy::Permissive,
        }
    }
}

// =========================================================
// EndpointResolver
// =========================================================

/// 端点解析器
///
/// 基础地址在进程生命周期内只解析一次，之后不再失效。
pub struct EndpointResolver<C> {
    client: Rc<C>,
    config_path: String,
    default_base: String,
    base: RefCell<Option<String>>,
}

impl<C: HttpClient> EndpointResolver<C> {
    pub fn new(client: Rc<C>, settings: &ClientSettings) -> Self {
        Self {
            client,
            config_path: settings.config_path.clone(),
            default_base: normalize_base(&settings.default_base_url),
            base: RefCell::new(None),
        }
    }

    /// 已缓存的基础地址（尚未解析时为 None）
    pub fn cached_base(&self) -> Option<String> {
        self.base.borrow().clone()
    }

    /// 解析基础地址，失败时静默回退到默认值，不重试
    pub async fn resolve_base(&self) -> String {
        if let Some(base) = self.cached_base() {
            return base;
        }

        let loaded = match self.load_config().await {
            Ok(config) => {
                debug!(base = %config.api_base_url, "loaded api config");
                normalize_base(&config.api_base_url)
            }
            Err(e) => {
                warn!(error = %e, default = %self.default_base, "failed to load config, using default");
                self.default_base.clone()
            }
        };

        // 并发解析时以先写入者为准
        self.base
            .borrow_mut()
            .get_or_insert_with(|| loaded)
            .clone()
    }

    /// 拼接完整请求地址
    pub async fn resolve(&self, path: &str) -> String {
        let base = self.resolve_base().await;
        join_url(&base, path)
    }

    async fn load_config(&self) -> crate::Result<AppConfig> {
        let resp = self
            .client
            .send(HttpRequest::get(&self.config_path))
            .await?
            .error_for_status()?;
        let config: AppConfig = resp.json()?;
        if config.api_base_url.trim().is_empty() {
            return Err(crate::StrollError::Decode("API_BASE_URL is empty".into()));
        }
        Ok(config)
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// 保证 path 以单个 `/` 开头后与 base 拼接
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use serde_json::json;

    fn resolver(client: &Rc<MockHttpClient>) -> EndpointResolver<MockHttpClient> {
        EndpointResolver::new(client.clone(), &ClientSettings::default())
    }

    #[test]
    fn join_normalizes_separator() {
        assert_eq!(join_url("http://h", "/api/places"), "http://h/api/places");
        assert_eq!(join_url("http://h", "api/places"), "http://h/api/places");
        assert_eq!(join_url("http://h", "//api"), "http://h/api");
    }

    #[tokio::test]
    async fn loads_config_once() {
        let client = Rc::new(MockHttpClient::new());
        client.mock_response(
            "/config.json",
            200,
            json!({ "API_BASE_URL": "https://api.example.com/" }),
        );
        let resolver = resolver(&client);

        assert_eq!(
            resolver.resolve("/api/places").await,
            "https://api.example.com/api/places"
        );
        assert_eq!(
            resolver.resolve("api/place/3").await,
            "https://api.example.com/api/place/3"
        );
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn falls_back_on_http_error_and_memoizes() {
        let client = Rc::new(MockHttpClient::new());
        let resolver = resolver(&client);

        assert_eq!(resolver.resolve_base().await, DEFAULT_API_BASE_URL);

        // 即使之后配置可用，也不会重新加载
        client.mock_response("/config.json", 200, json!({ "API_BASE_URL": "https://late" }));
        assert_eq!(resolver.resolve_base().await, DEFAULT_API_BASE_URL);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn falls_back_on_network_and_parse_errors() {
        let client = Rc::new(MockHttpClient::new());
        client.mock_failure("/config.json", "offline");
        assert_eq!(resolver(&client).resolve_base().await, DEFAULT_API_BASE_URL);

        let client = Rc::new(MockHttpClient::new());
        client.mock_raw("/config.json", 200, "not json");
        assert_eq!(resolver(&client).resolve_base().await, DEFAULT_API_BASE_URL);

        let client = Rc::new(MockHttpClient::new());
        client.mock_response("/config.json", 200, json!({ "API_BASE_URL": "  " }));
        assert_eq!(resolver(&client).resolve_base().await, DEFAULT_API_BASE_URL);
    }
}
