//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由、守卫规则以及路径/查询串的拆分。

use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 首页 (默认路由)
    #[default]
    Home,
    /// 附近地点浏览页
    Around,
    /// 地点详情
    Place(u64),
    /// 新建地点 (需要认证)
    NewPlace,
    /// 我的页面 (需要认证)
    MyPage,
    Login,
    Register,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举，忽略查询串与片段
    pub fn from_path(path: &str) -> Self {
        let (path, _) = split_location(path);
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match path {
            "/" => Self::Home,
            "/aroundme" | "/around" => Self::Around,
            "/newplace" => Self::NewPlace,
            "/mypage" => Self::MyPage,
            "/login" => Self::Login,
            "/register" => Self::Register,
            _ => Self::parse_place(path).unwrap_or(Self::NotFound),
        }
    }

    fn parse_place(path: &str) -> Option<Self> {
        let no = path
            .strip_prefix("/place/")
            .or_else(|| path.strip_prefix("/detail/"))?;
        no.parse().ok().map(Self::Place)
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Around => "/aroundme".to_string(),
            Self::Place(no) => format!("/place/{}", no),
            Self::NewPlace => "/newplace".to_string(),
            Self::MyPage => "/mypage".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::NewPlace | Self::MyPage)
    }

    /// 定义已认证用户是否应该离开此路由（登录/注册页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Home
    }

    /// 守卫：返回需要重定向到的路由，放行时为 None
    pub fn guard(&self, authenticated: bool) -> Option<Self> {
        if self.requires_auth() && !authenticated {
            Some(Self::auth_failure_redirect())
        } else if self.should_redirect_when_authenticated() && authenticated {
            Some(Self::auth_success_redirect())
        } else {
            None
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

/// 把 `/path?query#hash` 拆成 path 与 query（均不含分隔符）
pub fn split_location(location: &str) -> (&str, &str) {
    let location = location.split('#').next().unwrap_or(location);
    match location.split_once('?') {
        Some((path, query)) => (path, query),
        None => (location, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_and_aliases() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path(""), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/aroundme?category=cafe"), AppRoute::Around);
        assert_eq!(AppRoute::from_path("/around/"), AppRoute::Around);
        assert_eq!(AppRoute::from_path("/place/12"), AppRoute::Place(12));
        assert_eq!(AppRoute::from_path("/detail/12#reviews"), AppRoute::Place(12));
        assert_eq!(AppRoute::from_path("/place/abc"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/dashboard"), AppRoute::NotFound);
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            AppRoute::Home,
            AppRoute::Around,
            AppRoute::Place(3),
            AppRoute::NewPlace,
            AppRoute::MyPage,
            AppRoute::Login,
            AppRoute::Register,
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn guards_protected_and_guest_routes() {
        assert_eq!(AppRoute::NewPlace.guard(false), Some(AppRoute::Login));
        assert_eq!(AppRoute::MyPage.guard(false), Some(AppRoute::Login));
        assert_eq!(AppRoute::NewPlace.guard(true), None);

        assert_eq!(AppRoute::Login.guard(true), Some(AppRoute::Home));
        assert_eq!(AppRoute::Register.guard(true), Some(AppRoute::Home));
        assert_eq!(AppRoute::Login.guard(false), None);

        assert_eq!(AppRoute::Around.guard(false), None);
        assert_eq!(AppRoute::Place(1).guard(true), None);
    }

    #[test]
    fn splits_query_from_path() {
        assert_eq!(split_location("/aroundme?page=2#top"), ("/aroundme", "page=2"));
        assert_eq!(split_location("/mypage"), ("/mypage", ""));
    }
}
