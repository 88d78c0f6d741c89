use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

// =========================================================
// 错误类别
// =========================================================

/// 错误类别
///
/// 调用方据此决定降级方式：保留旧结果、显示内联提示或禁用操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 网络/传输失败（含超时）
    Network,
    /// 非 2xx 响应
    Status,
    /// 响应体无法解析
    Decode,
    /// 定位权限被拒或不可用
    Geolocation,
    /// 地图/逆地理编码服务不可用
    MapService,
    /// 表单校验失败
    Validation,
    /// 请求被更新的请求取代
    Superseded,
}

impl ErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Status => "HTTP_STATUS",
            ErrorKind::Decode => "MALFORMED_RESPONSE",
            ErrorKind::Geolocation => "GEOLOCATION_UNAVAILABLE",
            ErrorKind::MapService => "MAP_SERVICE_UNAVAILABLE",
            ErrorKind::Validation => "INVALID_INPUT",
            ErrorKind::Superseded => "SUPERSEDED",
        }
    }
}

// =========================================================
// 字段级错误
// =========================================================

/// 表单字段 -> 错误消息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// 无错误时返回 Ok，否则包装为校验错误
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StrollError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msg) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, msg)?;
            first = false;
        }
        Ok(())
    }
}

// =========================================================
// 核心错误类型
// =========================================================

#[derive(Debug, Error)]
pub enum StrollError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("geolocation unavailable: {0}")]
    Geolocation(String),

    #[error("map service unavailable: {0}")]
    MapService(String),

    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    #[error("request superseded by a newer one")]
    Aborted,
}

impl StrollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrollError::Network(_) | StrollError::Timeout => ErrorKind::Network,
            StrollError::Status { .. } => ErrorKind::Status,
            StrollError::Decode(_) => ErrorKind::Decode,
            StrollError::Geolocation(_) => ErrorKind::Geolocation,
            StrollError::MapService(_) => ErrorKind::MapService,
            StrollError::Validation(_) => ErrorKind::Validation,
            StrollError::Aborted => ErrorKind::Superseded,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }

    /// 面向用户的提示文本
    ///
    /// 服务端返回了 message 时优先使用，否则给出通用提示。
    pub fn user_message(&self) -> String {
        match self {
            StrollError::Status { message, .. } if !message.is_empty() => message.clone(),
            StrollError::Status { status, .. } => format!("Request failed ({})", status),
            StrollError::Network(_) | StrollError::Timeout => {
                "A network error occurred. Please try again.".to_string()
            }
            StrollError::Decode(_) => "Unexpected response from the server.".to_string(),
            StrollError::Geolocation(_) => {
                "Could not get your location. Check the location permission.".to_string()
            }
            StrollError::MapService(_) => "The map service is unavailable.".to_string(),
            StrollError::Validation(errors) => errors.to_string(),
            StrollError::Aborted => String::new(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            StrollError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StrollError {
    fn from(e: serde_json::Error) -> Self {
        StrollError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StrollError>;
