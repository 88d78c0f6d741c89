//! 导航栏状态
//!
//! 滚动标志只影响样式；搜索提交只是跳转到浏览页，不直接取数。

use url::form_urlencoded;

use crate::query::PARAM_KEYWORDS;
use crate::route::AppRoute;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub scrolled: bool,
    pub search_open: bool,
    pub search_text: String,
}

impl NavState {
    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.scrolled = scroll_y > 0.0;
    }

    pub fn open_search(&mut self) {
        self.search_open = true;
    }

    /// 失去焦点或提交后收起并清空
    pub fn close_search(&mut self) {
        self.search_open = false;
        self.search_text.clear();
    }

    /// 提交搜索：关键词非空时返回跳转地址
    pub fn submit_search(&mut self) -> Option<String> {
        let target = search_href(&self.search_text);
        self.close_search();
        target
    }
}

/// `/aroundme?keywords=...`，关键词为空白时返回 None
pub fn search_href(keywords: &str) -> Option<String> {
    let keywords = keywords.trim();
    if keywords.is_empty() {
        return None;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(PARAM_KEYWORDS, keywords)
        .finish();
    Some(format!("{}?{}", AppRoute::Around.to_path(), query))
}

/// 首页分类快捷入口
pub fn category_href(category: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(crate::query::PARAM_CATEGORY, category)
        .finish();
    format!("{}?{}", AppRoute::Around.to_path(), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_toggles_style_flag() {
        let mut nav = NavState::default();
        nav.on_scroll(12.0);
        assert!(nav.scrolled);
        nav.on_scroll(0.0);
        assert!(!nav.scrolled);
    }

    #[test]
    fn search_redirects_with_trimmed_keywords() {
        let mut nav = NavState::default();
        nav.open_search();
        nav.search_text = "  dog cafe ".into();
        assert_eq!(
            nav.submit_search().as_deref(),
            Some("/aroundme?keywords=dog+cafe")
        );
        assert_eq!(nav, NavState::default());
    }

    #[test]
    fn blank_search_goes_nowhere() {
        let mut nav = NavState::default();
        nav.open_search();
        nav.search_text = "   ".into();
        assert_eq!(nav.submit_search(), None);
        assert!(!nav.search_open);
    }

    #[test]
    fn category_shortcut() {
        assert_eq!(category_href("cafe"), "/aroundme?category=cafe");
    }
}
