//! 认证模块
//!
//! 管理用户认证状态，与路由系统解耦。
//! 路由服务通过注入的认证信号来检查认证状态。
//!
//! 会话本身保存在 localStorage 中（见 `stroll::SessionStore`），
//! 这里的信号只是它的响应式镜像：登录、登出以及其他标签页写入存储时刷新。

use leptos::prelude::*;
use stroll::{AppRoute, Services};
use stroll::forms::LoginForm;
use stroll_shared::UserProfile;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::web::{BrowserStorage, FetchClient};

/// 浏览器中装配好的服务
pub type AppServices = Services<FetchClient, BrowserStorage>;

/// 认证状态
#[derive(Clone, Default, PartialEq)]
pub struct AuthState {
    /// 是否已认证（token 存在且未过期）
    pub is_authenticated: bool,
    /// 当前用户
    pub user: Option<UserProfile>,
}

/// 认证上下文
///
/// 包含读写信号与共享服务，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    /// 认证状态（只读）
    pub state: ReadSignal<AuthState>,
    set_state: WriteSignal<AuthState>,
    /// 服务里有 `Rc`，只能放在本线程存储中
    services: StoredValue<AppServices, LocalStorage>,
}

impl AuthContext {
    /// 创建新的认证上下文
    pub fn new(services: AppServices) -> Self {
        let (state, set_state) = signal(AuthState::default());
        Self {
            state,
            set_state,
            services: StoredValue::new_local(services),
        }
    }

    pub fn services(&self) -> AppServices {
        self.services.get_value()
    }

    /// 从会话存储重新读取认证状态
    pub fn refresh(&self) {
        let services = self.services();
        let is_authenticated = services.sessions.is_valid();
        let user = if is_authenticated {
            services.sessions.user()
        } else {
            None
        };
        let next = AuthState {
            is_authenticated,
            user,
        };
        // 状态未变时不通知，避免每次导航都触发依赖认证状态的 Effect
        if self.state.with_untracked(|s| *s != next) {
            debug!(is_authenticated, "auth state refreshed");
            self.set_state.set(next);
        }
    }

    /// 导航守卫：重新读取会话判断目标路由，并让认证信号跟上会话
    pub fn guard(&self, route: AppRoute) -> Option<AppRoute> {
        let redirect = self.services().guard(&route);
        self.refresh();
        redirect
    }

    /// 守卫回调（用于路由服务注入）
    pub fn guard_callback(&self) -> Callback<AppRoute, Option<AppRoute>> {
        let ctx = *self;
        Callback::new(move |route: AppRoute| ctx.guard(route))
    }

    /// 获取认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.get().is_authenticated)
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 初始化认证状态
///
/// 读取已保存的会话，并监听其他标签页对 localStorage 的修改。
pub fn init_auth(ctx: &AuthContext) {
    ctx.refresh();

    let ctx = *ctx;
    let closure = Closure::<dyn Fn()>::new(move || ctx.refresh());
    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref());
    }
    // 泄漏闭包以保持监听器存活
    closure.forget();
}

/// 登录并刷新状态
///
/// 导航由路由服务的认证状态监听自动处理。
pub async fn login(ctx: &AuthContext, form: LoginForm) -> stroll::Result<UserProfile> {
    let user = ctx.services().auth().login(&form).await?;
    ctx.refresh();
    Ok(user)
}

/// 注销并清除状态
///
/// 注意：不需要手动导航，路由服务会监听认证状态变化并自动重定向
pub fn logout(ctx: &AuthContext) {
    ctx.services().auth().logout();
    ctx.refresh();
}
