//! 登录、注册与 ID 检查

use std::rc::Rc;

use tracing::{info, warn};

use crate::api::StrollApi;
use crate::error::{FieldErrors, Result, StrollError};
use crate::forms::{IdCheck, LoginForm, RegisterForm, user_id_format_error};
use crate::request::HttpClient;
use crate::session::{KeyValueStore, SessionStore};
use stroll_shared::{RegisterResponse, UserProfile};

pub struct AuthService<C, S> {
    api: StrollApi<C>,
    sessions: Rc<SessionStore<S>>,
}

impl<C, S> Clone for AuthService<C, S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<C: HttpClient, S: KeyValueStore> AuthService<C, S> {
    pub fn new(api: StrollApi<C>, sessions: Rc<SessionStore<S>>) -> Self {
        Self { api, sessions }
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    /// 校验通过后才会发起请求；成功时保存会话
    pub async fn login(&self, form: &LoginForm) -> Result<UserProfile> {
        form.validate()?;
        let resp = self
            .api
            .login(&form.to_request())
            .await
            .inspect_err(|e| warn!(error = %e, "login failed"))?;
        self.sessions.save(&resp.token, &resp.user);
        info!(user = %resp.user.id, "logged in");
        Ok(resp.user)
    }

    /// 先检查格式，再询问服务端 ID 是否可用
    pub async fn check_id(&self, user_id: &str) -> Result<IdCheck> {
        if let Some(msg) = user_id_format_error(user_id) {
            let mut errors = FieldErrors::new();
            errors.insert("userId", msg);
            return Err(StrollError::Validation(errors));
        }
        let availability = self
            .api
            .check_id(user_id)
            .await
            .inspect_err(|e| warn!(error = %e, "id check failed"))?;
        Ok(if availability.available {
            IdCheck::Available
        } else {
            IdCheck::Taken
        })
    }

    /// ID 检查未通过时不会发起注册请求
    pub async fn register(&self, form: &RegisterForm, id_check: &IdCheck) -> Result<RegisterResponse> {
        form.validate(id_check)?;
        let resp = self
            .api
            .register(&form.to_request())
            .await
            .inspect_err(|e| warn!(error = %e, "registration failed"))?;
        info!(user = %form.user_id, "registered");
        Ok(resp)
    }

    pub fn logout(&self) {
        self.sessions.clear();
        info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{mock_client, url};
    use crate::config::ClientSettings;
    use crate::error::ErrorKind;
    use crate::request::MockHttpClient;
    use crate::session::MemoryStore;
    use serde_json::json;

    fn service(client: &Rc<MockHttpClient>) -> AuthService<MockHttpClient, MemoryStore> {
        let settings = ClientSettings::default();
        let sessions = Rc::new(SessionStore::new(MemoryStore::new(), &settings));
        let api = StrollApi::new(client.clone(), &settings).with_tokens(sessions.clone());
        AuthService::new(api, sessions)
    }

    #[tokio::test]
    async fn invalid_login_never_hits_the_network() {
        let client = mock_client();
        let auth = service(&client);
        let err = auth
            .login(&LoginForm {
                user_id: "abc".into(),
                password: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().get("password").is_some());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn login_saves_session() {
        let client = mock_client();
        client.mock_response(
            &url("/api/auth/login"),
            200,
            json!({"token": "tok", "user": {"userId": "walker", "nickname": "Walker"}}),
        );
        let auth = service(&client);
        let user = auth
            .login(&LoginForm {
                user_id: "walker".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(user.display_name, "Walker");
        assert_eq!(auth.sessions().token().as_deref(), Some("tok"));
        assert_eq!(auth.sessions().current_user_id().as_deref(), Some("walker"));

        auth.logout();
        assert!(!auth.sessions().is_valid());
    }

    #[tokio::test]
    async fn login_rejection_surfaces_server_message() {
        let client = mock_client();
        client.mock_response(
            &url("/api/auth/login"),
            401,
            json!({"message": "Wrong ID or password"}),
        );
        let auth = service(&client);
        let err = auth
            .login(&LoginForm {
                user_id: "walker".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Wrong ID or password");
        assert!(auth.sessions().read().is_none());
    }

    #[tokio::test]
    async fn taken_id_blocks_registration() {
        let client = mock_client();
        client.mock_response(
            &url("/api/auth/check-id/walker"),
            200,
            json!({"available": false, "message": "taken"}),
        );
        let auth = service(&client);

        let check = auth.check_id("walker").await.unwrap();
        assert_eq!(check, IdCheck::Taken);

        let form = RegisterForm {
            user_id: "walker".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            nickname: "Walker".into(),
            email: "w@example.com".into(),
        };
        let err = auth.register(&form, &check).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.field_errors().unwrap().get("userId").is_some());
        assert!(
            !client
                .urls()
                .iter()
                .any(|u| u.ends_with("/api/auth/register"))
        );
    }

    #[tokio::test]
    async fn available_id_allows_registration() {
        let client = mock_client();
        client.mock_response(&url("/api/auth/check-id/walker"), 200, json!({"available": true}));
        client.mock_response(&url("/api/auth/register"), 201, json!({"message": "welcome"}));
        let auth = service(&client);

        let check = auth.check_id("walker").await.unwrap();
        let form = RegisterForm {
            user_id: "walker".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            nickname: "Walker".into(),
            email: "w@example.com".into(),
        };
        let resp = auth.register(&form, &check).await.unwrap();
        assert_eq!(resp.message, "welcome");
        assert_eq!(
            client.last_request().unwrap().json_body().unwrap()["userId"],
            "walker"
        );
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_locally() {
        let client = mock_client();
        let auth = service(&client);
        let err = auth.check_id("a b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(client.request_count(), 0);
    }
}
