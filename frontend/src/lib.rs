//! Stroll 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `stroll`: 平台无关的业务逻辑（查询、分页、选点、会话、表单校验）
//! - `web`: 浏览器能力适配（fetch、localStorage、定位、地图、路由）
//! - `auth`: 认证状态管理
//! - `components`: UI 组件层

mod auth;
mod components {
    pub mod browse;
    mod common;
    pub mod home;
    pub mod location_picker;
    pub mod login;
    pub mod my_page;
    pub mod nav;
    pub mod new_place;
    mod pagination;
    pub mod place;
    pub mod register;
}

use crate::auth::{AppServices, AuthContext, init_auth};
use crate::components::browse::BrowsePage;
use crate::components::home::HomePage;
use crate::components::login::LoginPage;
use crate::components::my_page::MyPage;
use crate::components::nav::NavBar;
use crate::components::new_place::NewPlacePage;
use crate::components::place::PlacePage;
use crate::components::register::RegisterPage;

use leptos::prelude::*;
use stroll::{AppRoute, ClientSettings};

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。核心库中的能力接口都在这里落地。
pub(crate) mod web {
    mod console;
    mod dialog;
    mod geolocation;
    mod http;
    mod kakao;
    pub mod router;
    mod storage;
    mod timer;

    pub use console::init_logging;
    pub use dialog::BrowserConfirm;
    pub use geolocation::BrowserGeolocator;
    pub use http::FetchClient;
    pub use kakao::KakaoMap;
    pub use storage::BrowserStorage;
}

pub use web::init_logging;
use web::router::{Link, Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Around => view! { <BrowsePage /> }.into_any(),
        AppRoute::Place(place_no) => view! { <PlacePage place_no=place_no /> }.into_any(),
        AppRoute::NewPlace => view! { <NewPlacePage /> }.into_any(),
        AppRoute::MyPage => view! { <MyPage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <RegisterPage /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-[60vh]">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                    <Link to=AppRoute::Home.to_path() class="btn btn-primary mt-6">"Back to home"</Link>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 装配服务并创建认证上下文
    let services = AppServices::new(
        web::FetchClient,
        web::BrowserStorage,
        &ClientSettings::default(),
    );
    let auth_ctx = AuthContext::new(services);
    provide_context(auth_ctx);

    // 2. 初始化认证状态（从 LocalStorage 读取会话）
    init_auth(&auth_ctx);

    // 3. 守卫回调与认证信号，用于注入路由服务（解耦！）
    let guard = auth_ctx.guard_callback();
    let is_authenticated = auth_ctx.is_authenticated_signal();

    view! {
        // 4. 路由器组件：每次导航都重新检查会话
        <Router guard=guard is_authenticated=is_authenticated>
            <NavBar />
            <main class="min-h-screen bg-base-200">
                <RouterOutlet matcher=route_matcher />
            </main>
        </Router>
    }
}
