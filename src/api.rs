use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{ClientSettings, EndpointResolver};
use crate::error::Result;
use crate::query::SearchQuery;
use crate::request::{FormPart, HttpClient, HttpMethod, HttpRequest};
use crate::session::TokenSource;
use stroll_shared::protocol::{
    ApiRequest, CheckIdRequest, DeletePlaceRequest, DeleteReviewRequest, PlaceDetailRequest,
    PlaceReviewsRequest, ToggleWishRequest,
};
use stroll_shared::{
    CreatePlaceResponse, CreateReviewRequest, IdAvailability, LoginRequest, LoginResponse,
    PlaceDetailResponse, PlacePage, RegisterRequest, RegisterResponse, Review,
};

pub const PLACES_PATH: &str = "/api/places";
pub const CREATE_PLACE_PATH: &str = "/api/place";

// =========================================================
// 业务逻辑: StrollApi
// =========================================================

/// 类型化的 API 客户端
///
/// 这里接受任何实现了 HttpClient 的客户端，从而解耦了具体的 HTTP 实现。
/// 基础地址通过共享的 EndpointResolver 解析，token 由 TokenSource 按需读取。
pub struct StrollApi<C> {
    client: Rc<C>,
    resolver: Rc<EndpointResolver<C>>,
    tokens: Option<Rc<dyn TokenSource>>,
    timeout: Duration,
}

impl<C> Clone for StrollApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            resolver: self.resolver.clone(),
            tokens: self.tokens.clone(),
            timeout: self.timeout,
        }
    }
}

impl<C: HttpClient> StrollApi<C> {
    pub fn new(client: Rc<C>, settings: &ClientSettings) -> Self {
        let resolver = Rc::new(EndpointResolver::new(client.clone(), settings));
        Self {
            client,
            resolver,
            tokens: None,
            timeout: settings.request_timeout,
        }
    }

    pub fn with_tokens(mut self, tokens: Rc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn resolver(&self) -> &EndpointResolver<C> {
        &self.resolver
    }

    async fn request(&self, method: HttpMethod, path: &str, authenticated: bool) -> HttpRequest {
        let url = self.resolver.resolve(path).await;
        let token = if authenticated {
            self.tokens.as_ref().and_then(|t| t.bearer_token())
        } else {
            None
        };
        HttpRequest::new(&url, method)
            .with_bearer(token.as_deref())
            .with_timeout(self.timeout)
    }

    async fn execute<T: DeserializeOwned>(&self, req: HttpRequest) -> Result<T> {
        let method = req.method;
        let url = req.url.clone();
        debug!(method = method.as_str(), url = %url, "api request");

        let resp = self.client.send(req).await.inspect_err(|e| {
            warn!(method = method.as_str(), url = %url, error = %e, "api request failed");
        })?;
        let resp = resp.error_for_status().inspect_err(|e| {
            warn!(method = method.as_str(), url = %url, error = %e, "api returned error status");
        })?;
        resp.json()
    }

    /// 发送不带请求体的端点请求
    pub async fn send<R: ApiRequest>(&self, request: &R) -> Result<R::Response> {
        let req = self
            .request(R::METHOD, &request.path(), R::AUTHENTICATED)
            .await;
        self.execute(req).await
    }

    /// 发送以 JSON 作为请求体的端点请求
    pub async fn send_json<R: ApiRequest + Serialize>(&self, request: &R) -> Result<R::Response> {
        let req = self
            .request(R::METHOD, &request.path(), R::AUTHENTICATED)
            .await
            .with_json(request)?;
        self.execute(req).await
    }

    // ---------------------------------------------------------
    // Places
    // ---------------------------------------------------------

    pub async fn search_places(&self, query: &SearchQuery) -> Result<PlacePage> {
        let path = format!("{}?{}", PLACES_PATH, query.request_query_string());
        let req = self.request(HttpMethod::Get, &path, true).await;
        self.execute(req).await
    }

    pub async fn place_detail(&self, place_no: u64) -> Result<PlaceDetailResponse> {
        self.send(&PlaceDetailRequest { place_no }).await
    }

    pub async fn place_reviews(&self, place_no: u64) -> Result<Vec<Review>> {
        let payload = self.send(&PlaceReviewsRequest { place_no }).await?;
        Ok(payload.into_reviews())
    }

    pub async fn create_place(&self, parts: Vec<FormPart>) -> Result<CreatePlaceResponse> {
        let req = self
            .request(HttpMethod::Post, CREATE_PLACE_PATH, true)
            .await
            .with_multipart(parts);
        self.execute(req).await
    }

    pub async fn delete_place(&self, place_no: u64) -> Result<()> {
        self.send(&DeletePlaceRequest { place_no }).await?;
        Ok(())
    }

    pub async fn toggle_wish(&self, place_no: u64) -> Result<()> {
        self.send(&ToggleWishRequest { place_no }).await?;
        Ok(())
    }

    // ---------------------------------------------------------
    // Reviews
    // ---------------------------------------------------------

    pub async fn create_review(&self, review: &CreateReviewRequest) -> Result<()> {
        self.send_json(review).await?;
        Ok(())
    }

    pub async fn delete_review(&self, place_no: u64, user_id: &str) -> Result<()> {
        self.send(&DeleteReviewRequest {
            place_no,
            user_id: user_id.to_string(),
        })
        .await?;
        Ok(())
    }

    // ---------------------------------------------------------
    // Auth
    // ---------------------------------------------------------

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        self.send_json(req).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse> {
        self.send_json(req).await
    }

    pub async fn check_id(&self, user_id: &str) -> Result<IdAvailability> {
        self.send(&CheckIdRequest {
            user_id: user_id.to_string(),
        })
        .await
    }
}
