//! 会话存储
//!
//! token 与用户资料分别保存在两个固定键下。每次读取都直接访问底层存储，
//! 不做跨视图缓存：其他标签页可能随时清除会话。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ClientSettings;
use stroll_shared::{Timestamp, UserProfile};

// =========================================================
// 存储抽象
// =========================================================

/// 字符串键值存储（浏览器中为 localStorage）
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str) -> bool;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> bool {
        (**self).remove(key)
    }
}

/// 内存存储，用于测试与非浏览器环境
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) -> bool {
        self.data.borrow_mut().remove(key);
        true
    }
}

// =========================================================
// Token 校验
// =========================================================

/// 无法解码的 token 如何处理；能解码的 token 一律按 `exp` 判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// 视为有效（旧客户端行为）
    #[default]
    Permissive,
    /// 视为无效
    Strict,
}

/// token 中我们唯一关心的声明
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// 从 token 中读出的过期信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenExpiry {
    /// payload 带有数值型 `exp`
    At(Timestamp),
    /// payload 能解码，但没有可用的 `exp`
    Missing,
    /// 不是 JWT 形式，或 payload 无法解码
    Undecodable,
}

const JWT_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const JWT_PAYLOAD_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 尝试从 JWT 形式的 token 中读取过期时间（秒）
pub fn token_expiry(token: &str) -> TokenExpiry {
    decode_claim(token).map_or(TokenExpiry::Undecodable, |claim| {
        match claim.exp.as_ref().and_then(serde_json::Value::as_f64) {
            Some(secs) => TokenExpiry::At(Timestamp::from_secs(secs)),
            None => TokenExpiry::Missing,
        }
    })
}

fn decode_claim(token: &str) -> Option<ExpiryClaim> {
    let mut parts = token.split('.');
    let (_, payload) = (parts.next()?, parts.next()?);
    let bytes = JWT_PAYLOAD
        .decode(payload)
        .or_else(|_| JWT_PAYLOAD_STANDARD.decode(payload))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

// =========================================================
// Session
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// 为请求提供 bearer token
pub trait TokenSource {
    fn bearer_token(&self) -> Option<String>;
}

pub struct SessionStore<S> {
    store: S,
    token_key: String,
    user_key: String,
    policy: TokenPolicy,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S, settings: &ClientSettings) -> Self {
        Self {
            store,
            token_key: settings.token_key.clone(),
            user_key: settings.user_key.clone(),
            policy: settings.token_policy,
        }
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 覆盖保存 token 与用户资料
    pub fn save(&self, token: &str, user: &UserProfile) {
        self.store.set(&self.token_key, token);
        match serde_json::to_string(user) {
            Ok(json) => {
                self.store.set(&self.user_key, &json);
            }
            Err(e) => {
                warn!(error = %e, "failed to serialize user profile");
                self.store.remove(&self.user_key);
            }
        }
        debug!(user = %user.id, "session saved");
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(&self.token_key).filter(|t| !t.is_empty())
    }

    /// 用户资料损坏时视为缺失
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(&self.user_key)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn read(&self) -> Option<Session> {
        let token = self.token()?;
        Some(Session {
            token,
            user: self.user(),
        })
    }

    pub fn clear(&self) {
        self.store.remove(&self.token_key);
        self.store.remove(&self.user_key);
        debug!("session cleared");
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Timestamp::now())
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        let Some(token) = self.token() else {
            return false;
        };
        match token_expiry(&token) {
            TokenExpiry::At(exp) => exp > now,
            TokenExpiry::Missing => {
                debug!("token payload has no usable exp");
                false
            }
            TokenExpiry::Undecodable => self.policy == TokenPolicy::Permissive,
        }
    }

    /// 当前有效会话的用户 ID
    pub fn current_user_id(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        self.user().map(|u| u.id)
    }
}

impl<S: KeyValueStore> TokenSource for SessionStore<S> {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn jwt_with(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), &ClientSettings::default())
    }

    fn user() -> UserProfile {
        UserProfile {
            id: "walker".into(),
            display_name: "Walker".into(),
            email: Some("w@example.com".into()),
        }
    }

    #[test]
    fn no_token_is_invalid() {
        let s = store();
        assert!(!s.is_valid());
        assert!(s.read().is_none());
    }

    #[test]
    fn expired_token_is_invalid() {
        let s = store();
        s.save(&jwt_with(r#"{"sub":"walker","exp":1000}"#), &user());
        assert!(!s.is_valid_at(Timestamp::from_secs(1000.0)));
        assert!(!s.is_valid_at(Timestamp::from_secs(2000.0)));
    }

    #[test]
    fn future_expiry_is_valid() {
        let s = store();
        s.save(&jwt_with(r#"{"exp":5000}"#), &user());
        assert!(s.is_valid_at(Timestamp::from_secs(4999.0)));
    }

    #[test]
    fn opaque_token_follows_policy() {
        let s = store();
        s.save("opaque-token", &user());
        assert!(s.is_valid_at(Timestamp::from_secs(0.0)));

        let strict = store().with_policy(TokenPolicy::Strict);
        strict.save("opaque-token", &user());
        assert!(!strict.is_valid_at(Timestamp::from_secs(0.0)));
    }

    #[test]
    fn decodable_payload_without_exp_is_invalid() {
        assert_eq!(token_expiry(&jwt_with(r#"{"sub":"walker"}"#)), TokenExpiry::Missing);
        assert_eq!(token_expiry(&jwt_with(r#"{"exp":"soon"}"#)), TokenExpiry::Missing);
        assert_eq!(token_expiry("a.%%%.c"), TokenExpiry::Undecodable);
        assert_eq!(token_expiry("single"), TokenExpiry::Undecodable);

        let s = store();
        s.save(&jwt_with(r#"{"sub":"walker"}"#), &user());
        assert!(!s.is_valid_at(Timestamp::from_secs(0.0)));
        assert!(!s.is_valid());
        assert!(s.current_user_id().is_none());

        let strict = store().with_policy(TokenPolicy::Strict);
        strict.save(&jwt_with(r#"{"sub":"walker"}"#), &user());
        assert!(!strict.is_valid_at(Timestamp::from_secs(0.0)));
    }

    #[test]
    fn padded_payload_decodes() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":42}"#);
        let token = format!("h.{}.s", payload);
        assert_eq!(token_expiry(&token), TokenExpiry::At(Timestamp::from_secs(42.0)));
    }

    #[test]
    fn save_overwrites_and_clear_removes_both() {
        let s = store();
        s.save("t1", &user());
        let mut other = user();
        other.id = "runner".into();
        s.save("t2", &other);

        let session = s.read().unwrap();
        assert_eq!(session.token, "t2");
        assert_eq!(session.user_id(), Some("runner"));
        assert_eq!(s.bearer_token().as_deref(), Some("t2"));

        s.clear();
        assert!(s.read().is_none());
        assert!(s.user().is_none());
    }

    #[test]
    fn reads_are_not_cached() {
        let backing = Rc::new(MemoryStore::new());
        let s = SessionStore::new(backing.clone(), &ClientSettings::default());
        s.save("t1", &user());
        assert!(s.is_valid());

        // 另一个标签页清除了会话
        backing.remove("stroll_token");
        assert!(!s.is_valid());
        assert_eq!(s.current_user_id(), None);
    }

    #[test]
    fn corrupt_profile_is_absent() {
        let backing = Rc::new(MemoryStore::new());
        let s = SessionStore::new(backing.clone(), &ClientSettings::default());
        backing.set("stroll_token", "t");
        backing.set("stroll_user", "{broken");
        assert!(s.read().unwrap().user.is_none());
    }
}
