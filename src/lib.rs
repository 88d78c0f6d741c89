//! 附近宠物友好地点浏览客户端的核心逻辑
//!
//! 不依赖 DOM：HTTP、存储、地图与定位都通过 trait 注入，
//! 浏览器适配器在 `stroll-frontend` 中实现，测试中使用 mock。

use std::rc::Rc;

pub mod api;
pub mod auth;
pub mod browse;
pub mod config;
pub mod error;
pub mod forms;
pub mod nav;
pub mod pagination;
pub mod picker;
pub mod place;
pub mod query;
pub mod request;
pub mod route;
pub mod session;

pub use api::StrollApi;
pub use auth::AuthService;
pub use browse::{BrowseController, BrowseState, FetchOutcome, FilterDraft, browse_href};
pub use config::{AppConfig, ClientSettings, EndpointResolver};
pub use error::{ErrorKind, FieldErrors, Result, StrollError};
pub use pagination::PageWindow;
pub use picker::{Geolocator, LocationPicker, MapProvider, PickerState};
pub use place::{Confirm, DeleteOutcome, PlaceController, PlaceViewState};
pub use query::SearchQuery;
pub use request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use route::AppRoute;
pub use session::{KeyValueStore, Session, SessionStore, TokenExpiry, TokenPolicy, TokenSource};

/// 按依赖顺序装配好的服务
///
/// 会话与端点解析器各只有一份，由所有视图共享。
pub struct Services<C, S> {
    pub sessions: Rc<SessionStore<S>>,
    pub api: StrollApi<C>,
}

impl<C, S> Clone for Services<C, S> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            api: self.api.clone(),
        }
    }
}

impl<C: HttpClient, S: KeyValueStore + 'static> Services<C, S> {
    pub fn new(client: C, store: S, settings: &ClientSettings) -> Self {
        let sessions = Rc::new(SessionStore::new(store, settings));
        let api = StrollApi::new(Rc::new(client), settings).with_tokens(sessions.clone());
        Self { sessions, api }
    }

    pub fn auth(&self) -> AuthService<C, S> {
        AuthService::new(self.api.clone(), self.sessions.clone())
    }

    pub fn browse(&self) -> BrowseController<C> {
        BrowseController::new(self.api.clone())
    }

    pub fn place(&self) -> PlaceController<C, S> {
        PlaceController::new(self.api.clone(), self.sessions.clone())
    }

    /// 路由守卫：每次导航都重新读取会话，token 可能已过期或被其他标签页清除
    pub fn guard(&self, route: &AppRoute) -> Option<AppRoute> {
        route.guard(self.sessions.is_valid())
    }
}
