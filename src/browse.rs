//! 浏览控制器
//!
//! URL 查询串是唯一的事实来源：所有筛选操作都只产生新的 `SearchQuery`，
//! 由视图写回地址栏，地址栏变化再触发 `sync_from_url` 与 `fetch`。
//! 每次取数都带递增序号，并中止上一条尚未完成的请求，只有最新请求的结果会被应用。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use tracing::{debug, info, warn};

use crate::api::StrollApi;
use crate::picker::Geolocator;
use crate::query::SearchQuery;
use crate::request::HttpClient;
use crate::route::AppRoute;
use stroll_shared::{
    Coordinates, LocationSelection, MAX_DISTANCE_UNIT, MAX_STAR, MIN_DISTANCE_UNIT, OrderBy,
    PlaceSummary,
};

/// 尚未提交到 URL 的筛选输入
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDraft {
    pub keywords: String,
    pub max_distance_unit: u32,
    pub min_star: u8,
}

impl FilterDraft {
    pub fn from_query(query: &SearchQuery) -> Self {
        Self {
            keywords: query.keywords.clone(),
            max_distance_unit: query.max_distance_unit,
            min_star: query.min_star,
        }
    }
}

impl Default for FilterDraft {
    fn default() -> Self {
        Self::from_query(&SearchQuery::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseState {
    /// 最近一次从 URL 派生出的查询
    pub query: SearchQuery,
    pub draft: FilterDraft,
    pub places: Vec<PlaceSummary>,
    pub last_page: u32,
    pub loading: bool,
    pub error: Option<String>,
    /// 选点器给出的地址文本，仅用于展示
    pub location_label: Option<String>,
}

/// 一次取数的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// 已有更新的请求，本次结果被丢弃
    Superseded,
    /// 请求失败，保留旧结果
    Failed,
}

/// "定位到我" 的结果：需要写回 URL 的查询与选点器的初始中心
#[derive(Debug, Clone, PartialEq)]
pub struct LocateResult {
    pub commit: Option<SearchQuery>,
    pub picker_center: Option<Coordinates>,
}

type Listener = Box<dyn Fn(&BrowseState)>;

struct BrowseInner<C> {
    api: StrollApi<C>,
    state: RefCell<BrowseState>,
    seq: Cell<u64>,
    in_flight: RefCell<Option<AbortHandle>>,
    /// `location_label` 对应的坐标
    label_at: Cell<Option<Coordinates>>,
    listener: RefCell<Option<Listener>>,
}

pub struct BrowseController<C> {
    inner: Rc<BrowseInner<C>>,
}

impl<C> Clone for BrowseController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: HttpClient> BrowseController<C> {
    pub fn new(api: StrollApi<C>) -> Self {
        Self {
            inner: Rc::new(BrowseInner {
                api,
                state: RefCell::new(BrowseState::default()),
                seq: Cell::new(0),
                in_flight: RefCell::new(None),
                label_at: Cell::new(None),
                listener: RefCell::new(None),
            }),
        }
    }

    pub fn on_change(&self, f: impl Fn(&BrowseState) + 'static) {
        *self.inner.listener.borrow_mut() = Some(Box::new(f));
    }

    pub fn state(&self) -> BrowseState {
        self.inner.state.borrow().clone()
    }

    pub fn query(&self) -> SearchQuery {
        self.inner.state.borrow().query.clone()
    }

    fn update(&self, f: impl FnOnce(&mut BrowseState)) {
        f(&mut self.inner.state.borrow_mut());
        let snapshot = self.state();
        if let Some(listener) = self.inner.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }

    // ---------------------------------------------------------
    // URL -> 状态 -> 请求
    // ---------------------------------------------------------

    /// 从地址栏查询串重新派生状态，同时把未提交的输入重置为 URL 中的值
    pub fn sync_from_url(&self, query_string: &str) -> SearchQuery {
        let query = SearchQuery::from_query_string(query_string);
        // 地址文本只跟随产生它的那次选点
        if query.coordinates.is_none() || query.coordinates != self.inner.label_at.get() {
            self.inner.label_at.set(None);
        }
        let keep_label = self.inner.label_at.get().is_some();
        self.update(|s| {
            if !keep_label {
                s.location_label = None;
            }
            s.draft = FilterDraft::from_query(&query);
            s.query = query.clone();
        });
        query
    }

    /// 同步 URL 并为其发起取数
    pub async fn load_from_url(&self, query_string: &str) -> FetchOutcome {
        let query = self.sync_from_url(query_string);
        self.fetch(query).await
    }

    /// 为给定查询取数
    ///
    /// 新请求发起时上一条请求会被中止；即便中止前响应已经到达，
    /// 序号不匹配的结果也不会被应用。
    pub async fn fetch(&self, query: SearchQuery) -> FetchOutcome {
        let seq = self.inner.seq.get() + 1;
        self.inner.seq.set(seq);

        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.inner.in_flight.borrow_mut().replace(handle) {
            debug!(seq, "aborting superseded search");
            previous.abort();
        }
        self.update(|s| s.loading = true);

        let api = self.inner.api.clone();
        let request = async move { api.search_places(&query).await };
        let result = Abortable::new(request, registration).await;

        if self.inner.seq.get() != seq {
            debug!(seq, latest = self.inner.seq.get(), "discarding stale search response");
            return FetchOutcome::Superseded;
        }
        self.inner.in_flight.borrow_mut().take();

        match result {
            Ok(Ok(page)) => {
                info!(seq, count = page.places.len(), last_page = page.last_page, "search applied");
                self.update(|s| {
                    s.places = page.places;
                    s.last_page = page.last_page;
                    s.loading = false;
                    s.error = None;
                });
                FetchOutcome::Applied
            }
            Ok(Err(e)) => {
                warn!(seq, error = %e, code = e.error_code(), "search failed, keeping previous results");
                let message = e.user_message();
                self.update(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
                FetchOutcome::Failed
            }
            Err(_aborted) => {
                self.update(|s| s.loading = false);
                FetchOutcome::Superseded
            }
        }
    }

    // ---------------------------------------------------------
    // 本地输入
    // ---------------------------------------------------------

    pub fn edit_keywords(&self, keywords: &str) {
        let keywords = keywords.to_string();
        self.update(|s| s.draft.keywords = keywords);
    }

    pub fn edit_distance(&self, unit: u32) {
        self.update(|s| {
            s.draft.max_distance_unit = unit.clamp(MIN_DISTANCE_UNIT, MAX_DISTANCE_UNIT)
        });
    }

    pub fn edit_min_star(&self, star: u8) {
        self.update(|s| s.draft.min_star = star.min(MAX_STAR));
    }

    // ---------------------------------------------------------
    // 提交：以下操作都返回需要写入 URL 的新查询
    // ---------------------------------------------------------

    /// 选择分类：立即提交并回到第一页
    pub fn select_category(&self, category: &str) -> SearchQuery {
        SearchQuery {
            category: category.to_string(),
            page: 1,
            ..self.query()
        }
    }

    /// 提交关键词与筛选条件：回到第一页
    pub fn submit(&self) -> SearchQuery {
        let state = self.inner.state.borrow();
        SearchQuery {
            keywords: state.draft.keywords.trim().to_string(),
            max_distance_unit: state.draft.max_distance_unit,
            min_star: state.draft.min_star,
            page: 1,
            ..state.query.clone()
        }
    }

    pub fn set_order(&self, order_by: OrderBy) -> SearchQuery {
        SearchQuery {
            order_by,
            page: 1,
            ..self.query()
        }
    }

    /// 翻页：保留其他条件，页码限制在 [1, last_page]
    pub fn go_to_page(&self, page: u32) -> SearchQuery {
        let last = self.inner.state.borrow().last_page.max(1);
        self.query().with_page(page.clamp(1, last))
    }

    pub fn set_location(&self, at: Coordinates) -> SearchQuery {
        SearchQuery {
            coordinates: Some(at),
            page: 1,
            ..self.query()
        }
    }

    /// 采用选点器的结果
    pub fn apply_selection(&self, selection: &LocationSelection) -> SearchQuery {
        let query = self.set_location(selection.coordinates());
        let label = selection.address.clone();
        self.inner.label_at.set(query.coordinates);
        self.update(|s| s.location_label = Some(label));
        query
    }

    pub fn clear_location(&self) -> SearchQuery {
        self.inner.label_at.set(None);
        self.update(|s| s.location_label = None);
        SearchQuery {
            coordinates: None,
            page: 1,
            ..self.query()
        }
    }

    /// 请求定位；成功时把坐标写入 URL 并以此为中心打开选点器，
    /// 失败时仍打开选点器但不给初始中心
    pub async fn locate<G: Geolocator + ?Sized>(&self, geo: &G) -> LocateResult {
        match geo.current_position().await {
            Ok(pos) => LocateResult {
                commit: Some(self.set_location(pos)),
                picker_center: Some(pos),
            },
            Err(e) => {
                warn!(error = %e, "geolocation failed, opening picker without a center");
                LocateResult {
                    commit: None,
                    picker_center: None,
                }
            }
        }
    }
}

/// 浏览页的完整地址
pub fn browse_href(query: &SearchQuery) -> String {
    format!("{}?{}", AppRoute::Around.to_path(), query.to_query_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{mock_client, url};
    use crate::config::ClientSettings;
    use crate::picker::tests::FakeGeo;
    use crate::request::MockHttpClient;
    use serde_json::json;

    fn controller(client: &Rc<MockHttpClient>) -> BrowseController<MockHttpClient> {
        BrowseController::new(StrollApi::new(client.clone(), &ClientSettings::default()))
    }

    fn search_url(query: &SearchQuery) -> String {
        url(&format!("/api/places?{}", query.request_query_string()))
    }

    fn page_of(names: &[&str], last_page: u32) -> serde_json::Value {
        let places: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"placeId": i + 1, "name": name, "starRating": 4.0}))
            .collect();
        json!({ "places": places, "lastPage": last_page })
    }

    fn names(state: &BrowseState) -> Vec<String> {
        state.places.iter().map(|p| p.name.clone()).collect()
    }

    #[tokio::test]
    async fn loads_results_from_url() {
        let client = mock_client();
        let ctrl = controller(&client);
        let query = SearchQuery::from_query_string("category=cafe&maxDistance=10&minStar=3");
        client.mock_response(&search_url(&query), 200, page_of(&["Latte Dog"], 2));

        assert_eq!(
            ctrl.load_from_url("?category=cafe&maxDistance=10&minStar=3").await,
            FetchOutcome::Applied
        );
        let state = ctrl.state();
        assert_eq!(names(&state), vec!["Latte Dog"]);
        assert_eq!(state.last_page, 2);
        assert!(!state.loading);
        assert_eq!(state.draft.max_distance_unit, 10);

        let sent = client.last_request().unwrap().url;
        assert!(sent.contains("category=cafe&maxDistance=1000&minStar=3"));
        assert!(!sent.contains("x="));
    }

    #[tokio::test]
    async fn failure_keeps_previous_results() {
        let client = mock_client();
        let ctrl = controller(&client);
        let first = SearchQuery::default();
        client.mock_response(&search_url(&first), 200, page_of(&["Park"], 1));
        ctrl.fetch(first).await;

        let second = ctrl.select_category("hospital");
        client.mock_failure(&search_url(&second), "offline");
        assert_eq!(ctrl.fetch(second.clone()).await, FetchOutcome::Failed);

        let third = ctrl.select_category("grooming");
        client.mock_raw(&search_url(&third), 200, "{not json");
        assert_eq!(ctrl.fetch(third).await, FetchOutcome::Failed);

        let state = ctrl.state();
        assert_eq!(names(&state), vec!["Park"]);
        assert!(!state.loading);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn latest_request_wins_when_responses_arrive_out_of_order() {
        let client = mock_client();
        let ctrl = controller(&client);

        let s1 = ctrl.select_category("cafe");
        let s2 = ctrl.select_category("pension");
        let gate1 = client.mock_gated(&search_url(&s1), 200, page_of(&["Stale"], 1));
        let gate2 = client.mock_gated(&search_url(&s2), 200, page_of(&["Fresh"], 1));

        let (o1, o2, _) = futures::join!(ctrl.fetch(s1), ctrl.fetch(s2), async move {
            let _ = gate2.send(());
            tokio::task::yield_now().await;
            let _ = gate1.send(());
        });

        assert_eq!(o1, FetchOutcome::Superseded);
        assert_eq!(o2, FetchOutcome::Applied);
        let state = ctrl.state();
        assert_eq!(names(&state), vec!["Fresh"]);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn stale_response_leaves_newer_request_loading() {
        let client = mock_client();
        let ctrl = controller(&client);

        let s1 = ctrl.select_category("cafe");
        let s2 = ctrl.select_category("pension");
        let gate1 = client.mock_gated(&search_url(&s1), 200, page_of(&["Stale"], 1));
        let gate2 = client.mock_gated(&search_url(&s2), 200, page_of(&["Fresh"], 1));

        let observer = ctrl.clone();
        let (o1, _, loading_after_stale) =
            futures::join!(ctrl.fetch(s1), ctrl.fetch(s2), async move {
                let _ = gate1.send(());
                tokio::task::yield_now().await;
                let loading = observer.state().loading;
                let _ = gate2.send(());
                loading
            });
        assert_eq!(o1, FetchOutcome::Superseded);
        assert!(loading_after_stale);
        assert_eq!(names(&ctrl.state()), vec!["Fresh"]);
        assert!(!ctrl.state().loading);
    }

    #[tokio::test]
    async fn commits_reset_page_except_pagination() {
        let client = mock_client();
        let ctrl = controller(&client);
        ctrl.sync_from_url("category=cafe&page=3&minStar=2&keywords=old");
        ctrl.inner.state.borrow_mut().last_page = 10;

        let q = ctrl.select_category("hospital");
        assert_eq!((q.category.as_str(), q.page, q.min_star), ("hospital", 1, 2));

        let q = ctrl.set_order(OrderBy::Star);
        assert_eq!((q.order_by, q.page), (OrderBy::Star, 1));

        let q = ctrl.go_to_page(7);
        assert_eq!((q.category.as_str(), q.page, q.keywords.as_str()), ("cafe", 7, "old"));
        assert_eq!(ctrl.go_to_page(99).page, 10);
        assert_eq!(ctrl.go_to_page(0).page, 1);
    }

    #[tokio::test]
    async fn drafts_are_only_committed_on_submit() {
        let client = mock_client();
        let ctrl = controller(&client);
        ctrl.sync_from_url("category=cafe&page=4");

        ctrl.edit_keywords("  dog park  ");
        ctrl.edit_distance(80);
        ctrl.edit_min_star(4);
        assert_eq!(ctrl.query().keywords, "");
        assert_eq!(client.request_count(), 0);

        let q = ctrl.submit();
        assert_eq!(q.keywords, "dog park");
        assert_eq!(q.max_distance_unit, MAX_DISTANCE_UNIT);
        assert_eq!(q.min_star, 4);
        assert_eq!(q.category, "cafe");
        assert_eq!(q.page, 1);

        // URL 变化会覆盖未提交的输入
        ctrl.sync_from_url("keywords=vet");
        assert_eq!(ctrl.state().draft.keywords, "vet");
    }

    #[tokio::test]
    async fn location_set_and_clear() {
        let client = mock_client();
        let ctrl = controller(&client);
        ctrl.sync_from_url("page=2&category=cafe");

        let here = Coordinates::new(37.5, 127.0);
        let result = ctrl.locate(FakeGeo::at(here).as_ref()).await;
        assert_eq!(result.picker_center, Some(here));
        let committed = result.commit.unwrap();
        assert_eq!(committed.coordinates, Some(here));
        assert_eq!(committed.page, 1);
        assert!(browse_href(&committed).ends_with("x=127&y=37.5"));

        let denied = ctrl.locate(FakeGeo::denied().as_ref()).await;
        assert_eq!(denied.commit, None);
        assert_eq!(denied.picker_center, None);

        let q = ctrl.apply_selection(&LocationSelection {
            lat: 35.0,
            lng: 129.0,
            address: "Busan".into(),
        });
        assert_eq!(q.coordinates, Some(Coordinates::new(35.0, 129.0)));
        assert_eq!(ctrl.state().location_label.as_deref(), Some("Busan"));

        // 写回 URL 后地址文本仍然保留，换到别的坐标才清除
        ctrl.sync_from_url(&q.to_query_string());
        assert_eq!(ctrl.state().location_label.as_deref(), Some("Busan"));
        ctrl.sync_from_url("x=128&y=36");
        assert!(ctrl.state().location_label.is_none());

        let q = ctrl.clear_location();
        assert_eq!(q.coordinates, None);
        assert!(ctrl.state().location_label.is_none());
    }

    #[test]
    fn href_points_at_browse_view() {
        let href = browse_href(&SearchQuery::default());
        assert_eq!(
            href,
            "/aroundme?category=&maxDistance=50&minStar=0&orderBy=distance&page=1"
        );
    }
}
