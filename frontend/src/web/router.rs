//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 验证 -> 处理 -> 加载"的导航流程。
//!
//! 除路由外还维护当前查询串：浏览页以 URL 查询串为唯一数据源，
//! 查询串变化（包括前进/后退）都会驱动重新取数。

use leptos::prelude::*;
use stroll::AppRoute;
use stroll::route::split_location;
use tracing::info;
use wasm_bindgen::prelude::*;

/// 获取当前浏览器路径与查询串（不含 `?`）
fn current_location() -> (String, String) {
    let location = web_sys::window().map(|w| w.location());
    let path = location
        .as_ref()
        .and_then(|l| l.pathname().ok())
        .unwrap_or_else(|| "/".to_string());
    let search = location
        .and_then(|l| l.search().ok())
        .unwrap_or_default();
    (path, search.trim_start_matches('?').to_string())
}

fn join_location(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// 写入 History 状态（内部工具函数）
///
/// `use_push` 为 false 时替换当前记录，用于重定向。
fn write_history_state(location: &str, use_push: bool) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = if use_push {
                history.push_state_with_url(&JsValue::NULL, "", Some(location))
            } else {
                history.replace_state_with_url(&JsValue::NULL, "", Some(location))
            };
        }
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 通过注入守卫回调与认证信号实现与认证系统的解耦：
/// 导航时由回调重新读取会话，信号只用于响应登录/登出。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
    /// 当前查询串
    query: ReadSignal<String>,
    set_query: WriteSignal<String>,
    /// 导航守卫（注入的回调，每次调用都重新读取会话）
    guard: Callback<AppRoute, Option<AppRoute>>,
    /// 认证状态（注入的信号，实现解耦）
    is_authenticated: Signal<bool>,
}

impl RouterService {
    /// 创建新的路由服务
    ///
    /// # Arguments
    /// * `guard` - 导航守卫，返回需要重定向到的路由
    /// * `is_authenticated` - 认证状态信号，由外部注入实现解耦
    fn new(guard: Callback<AppRoute, Option<AppRoute>>, is_authenticated: Signal<bool>) -> Self {
        // 1. 初始化当前路由（从 URL 解析）
        let (path, query) = current_location();
        let (current_route, set_route) = signal(AppRoute::from_path(&path));
        let (query, set_query) = signal(query);

        Self {
            current_route,
            set_route,
            query,
            set_query,
            guard,
            is_authenticated,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 获取当前查询串信号
    pub fn query(&self) -> ReadSignal<String> {
        self.query
    }

    /// **核心方法：导航与守卫**
    ///
    /// `to` 可以带查询串，例如 `/aroundme?page=2`。
    /// 流程：请求 -> 验证(Guard) -> 处理 -> 加载
    pub fn navigate(&self, to: &str) {
        let (path, query) = split_location(to);
        self.navigate_to(path, query, true);
    }

    /// 导航到指定位置
    ///
    /// # Arguments
    /// * `path` - 目标路径
    /// * `query` - 查询串（不含 `?`）
    /// * `use_push` - true 使用 pushState, false 使用 replaceState
    fn navigate_to(&self, path: &str, query: &str, use_push: bool) {
        let target_route = AppRoute::from_path(path);

        // --- Step 1: 验证目标路由 ---
        if let Some(redirect) = self.guard.run(target_route.clone()) {
            info!(from = %target_route, to = %redirect, "route guard redirect");
            write_history_state(&redirect.to_path(), use_push);
            self.set_query.set(String::new());
            self.set_route.set(redirect);
            return;
        }

        // --- Step 2: 加载页面 (更新状态) ---
        // 未匹配的路径保留原样，方便用户看到自己输入了什么
        let canonical = match target_route {
            AppRoute::NotFound => path.to_string(),
            ref route => route.to_path(),
        };
        write_history_state(&join_location(&canonical, query), use_push);
        self.set_query.set(query.to_string());
        self.set_route.set(target_route);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let router = *self;

        let closure = Closure::<dyn Fn()>::new(move || {
            // popstate 时也执行守卫逻辑，重定向使用 replaceState
            let (path, query) = current_location();
            router.navigate_to(&path, &query, false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 设置认证状态变化时的自动重定向
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let set_query = self.set_query;
        let is_authenticated = self.is_authenticated;

        // 使用 Effect 监听认证状态变化
        Effect::new(move |_| {
            let is_auth = is_authenticated.get();
            let route = current_route.get_untracked();

            // 登录后离开登录/注册页，登出后离开受保护页面
            if let Some(redirect) = route.guard(is_auth) {
                info!(from = %route, to = %redirect, "auth state changed, redirecting");
                write_history_state(&redirect.to_path(), true);
                set_query.set(String::new());
                set_route.set(redirect);
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(
    guard: Callback<AppRoute, Option<AppRoute>>,
    is_authenticated: Signal<bool>,
) -> RouterService {
    let router = RouterService::new(guard, is_authenticated);

    // 初始化监听器
    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 导航守卫
    guard: Callback<AppRoute, Option<AppRoute>>,
    /// 认证状态信号
    is_authenticated: Signal<bool>,
    /// 子组件
    children: Children,
) -> impl IntoView {
    // 提供路由服务到 Context
    provide_router(guard, is_authenticated);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();
    // 只有路由本身变化才重建页面；同一页面内的查询串变化由页面自己响应
    let current = Memo::new(move |_| router.current_route().get());

    move || matcher(current.get())
}

/// 站内链接：拦截点击，交给路由服务导航
#[component]
pub fn Link(
    /// 目标地址，可带查询串
    #[prop(into)]
    to: String,
    #[prop(optional, into)] class: String,
    /// 子内容
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        // 保留新标签页打开等浏览器默认行为
        if ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
