use crate::{
    CreateReviewRequest, IdAvailability, LoginRequest, LoginResponse, PlaceDetailResponse,
    RegisterRequest, RegisterResponse, ReviewsPayload,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
///
/// Endpoints whose path carries identifiers build it in [`ApiRequest::path`];
/// only requests that also implement `Serialize` are sent with a JSON body.
pub trait ApiRequest {
    /// The response type returned by this request. Status-only endpoints use [`IgnoredAny`].
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Whether the request needs the bearer token.
    const AUTHENTICATED: bool = true;

    /// The URL path, relative to the API base.
    fn path(&self) -> String;
}

// =========================================================
// Auth
// =========================================================

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;

    fn path(&self) -> String {
        "/api/auth/login".to_string()
    }
}

impl ApiRequest for RegisterRequest {
    type Response = RegisterResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTHENTICATED: bool = false;

    fn path(&self) -> String {
        "/api/auth/register".to_string()
    }
}

/// Check whether a user id is still free
#[derive(Debug, Clone)]
pub struct CheckIdRequest {
    pub user_id: String,
}

impl ApiRequest for CheckIdRequest {
    type Response = IdAvailability;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTHENTICATED: bool = false;

    fn path(&self) -> String {
        format!("/api/auth/check-id/{}", self.user_id)
    }
}

// =========================================================
// Places
// =========================================================

#[derive(Debug, Clone, Copy)]
pub struct PlaceDetailRequest {
    pub place_no: u64,
}

impl ApiRequest for PlaceDetailRequest {
    type Response = PlaceDetailResponse;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/api/place/{}", self.place_no)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaceReviewsRequest {
    pub place_no: u64,
}

impl ApiRequest for PlaceReviewsRequest {
    type Response = ReviewsPayload;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/api/place/{}/reviews", self.place_no)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeletePlaceRequest {
    pub place_no: u64,
}

impl ApiRequest for DeletePlaceRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/api/place/{}", self.place_no)
    }
}

/// Toggle the wish flag (server flips it)
#[derive(Debug, Clone, Copy)]
pub struct ToggleWishRequest {
    pub place_no: u64,
}

impl ApiRequest for ToggleWishRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("/api/wish/{}", self.place_no)
    }
}

// =========================================================
// Reviews
// =========================================================

impl ApiRequest for CreateReviewRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/api/review".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteReviewRequest {
    pub place_no: u64,
    pub user_id: String,
}

impl ApiRequest for DeleteReviewRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/api/place/{}/review/{}", self.place_no, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_embed_identifiers() {
        assert_eq!(PlaceDetailRequest { place_no: 4 }.path(), "/api/place/4");
        assert_eq!(
            PlaceReviewsRequest { place_no: 4 }.path(),
            "/api/place/4/reviews"
        );
        assert_eq!(
            DeleteReviewRequest {
                place_no: 4,
                user_id: "12".into()
            }
            .path(),
            "/api/place/4/review/12"
        );
        assert_eq!(ToggleWishRequest { place_no: 9 }.path(), "/api/wish/9");
        assert_eq!(
            CheckIdRequest {
                user_id: "walker".into()
            }
            .path(),
            "/api/auth/check-id/walker"
        );
    }

    #[test]
    fn only_auth_endpoints_skip_the_token() {
        assert!(!LoginRequest::AUTHENTICATED);
        assert!(!RegisterRequest::AUTHENTICATED);
        assert!(!CheckIdRequest::AUTHENTICATED);
        assert!(CreateReviewRequest::AUTHENTICATED);
        assert!(DeletePlaceRequest::AUTHENTICATED);
    }
}
