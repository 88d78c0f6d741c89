use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{Result, StrollError};
use stroll_shared::MessageBody;

pub use stroll_shared::protocol::HttpMethod;

#[cfg(test)]
use futures::channel::oneshot;
#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::VecDeque;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// multipart 表单中的一项
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// 已序列化的 JSON 文本
    Json(String),
    /// multipart/form-data，Content-Type 由浏览器生成
    Multipart(Vec<FormPart>),
}

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
    /// 超时时间，由具体客户端实现
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// 附加 `Authorization: Bearer <token>`
    pub fn with_bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.is_empty() => self.with_header(
                stroll_shared::HEADER_AUTHORIZATION,
                &format!("Bearer {}", t),
            ),
            _ => self,
        }
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let text = serde_json::to_string(body)
            .map_err(|e| StrollError::Decode(format!("request body: {}", e)))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(RequestBody::Json(text));
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 解析 JSON 响应体；空响应体按 `null` 处理，以便状态型接口使用 `IgnoredAny`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(text).map_err(StrollError::from)
    }

    /// 非 2xx 时转换为错误，并尽量取出服务端的 `message`
    pub fn error_for_status(self) -> Result<Self> {
        if self.ok() {
            return Ok(self);
        }
        let message = serde_json::from_str::<MessageBody>(&self.body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_default();
        Err(StrollError::Status {
            status: self.status,
            message,
        })
    }
}

/// HTTP 客户端特性 (Trait)
///
/// (?Send) 是因为浏览器环境下的 future 不是 Send 的。
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient + ?Sized> HttpClient for Rc<C> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<RequestBody>,
}

#[cfg(test)]
impl RecordedRequest {
    pub fn json_body(&self) -> Option<serde_json::Value> {
        match &self.body {
            Some(RequestBody::Json(text)) => serde_json::from_str(text).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
enum MockReply {
    Response(u16, String),
    Failure(String),
    /// 等待 gate 触发后再返回
    Gated(u16, String, Option<oneshot::Receiver<()>>),
}

#[cfg(test)]
pub struct MockHttpClient {
    // URL -> 依次返回的响应，最后一个会被重复使用
    responses: RefCell<HashMap<String, VecDeque<MockReply>>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, url: &str, reply: MockReply) {
        self.responses
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.push(url, MockReply::Response(status, body.to_string()));
    }

    pub fn mock_raw(&self, url: &str, status: u16, body: &str) {
        self.push(url, MockReply::Response(status, body.to_string()));
    }

    pub fn mock_failure(&self, url: &str, message: &str) {
        self.push(url, MockReply::Failure(message.to_string()));
    }

    /// 响应会一直挂起，直到返回的 sender 被触发（或被丢弃）
    pub fn mock_gated(&self, url: &str, status: u16, body: serde_json::Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(url, MockReply::Gated(status, body.to_string(), Some(rx)));
        tx
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.borrow().last().cloned()
    }

    fn next_reply(&self, url: &str) -> Option<MockReply> {
        let mut responses = self.responses.borrow_mut();
        let queue = responses.get_mut(url)?;
        if queue.len() > 1 {
            return queue.pop_front();
        }
        match queue.front_mut()? {
            MockReply::Response(status, body) => Some(MockReply::Response(*status, body.clone())),
            MockReply::Failure(msg) => Some(MockReply::Failure(msg.clone())),
            MockReply::Gated(status, body, rx) => {
                Some(MockReply::Gated(*status, body.clone(), rx.take()))
            }
        }
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: req.url.clone(),
            method: req.method,
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        match self.next_reply(&req.url) {
            Some(MockReply::Response(status, body)) => Ok(HttpResponse { status, body }),
            Some(MockReply::Failure(msg)) => Err(StrollError::Network(msg)),
            Some(MockReply::Gated(status, body, rx)) => {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(HttpResponse { status, body })
            }
            None => Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}
