//! 地图选点
//!
//! 选点逻辑只依赖 `MapProvider` 与 `Geolocator` 两个能力接口，
//! 浏览器中由地图 SDK 和 geolocation API 的适配器实现，测试中使用假实现。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use stroll_shared::{Coordinates, LocationSelection};

/// 没有初始中心且定位失败时使用的中心点（首尔市厅）
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(37.5665, 126.978);
pub const DEFAULT_ZOOM_LEVEL: u8 = 3;

/// 设备定位
#[async_trait(?Send)]
pub trait Geolocator {
    async fn current_position(&self) -> Result<Coordinates>;
}

/// 地图能力接口
#[async_trait(?Send)]
pub trait MapProvider {
    fn create_map(&self, center: Coordinates, level: u8) -> Result<()>;
    fn set_center(&self, center: Coordinates);
    /// 地图上始终只有一个标记，新的位置覆盖旧的
    fn place_marker(&self, at: Coordinates);
    /// 无匹配地址时返回 `Ok(None)`
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Option<String>>;
}

#[async_trait(?Send)]
impl<T: Geolocator + ?Sized> Geolocator for Rc<T> {
    async fn current_position(&self) -> Result<Coordinates> {
        (**self).current_position().await
    }
}

#[async_trait(?Send)]
impl<T: MapProvider + ?Sized> MapProvider for Rc<T> {
    fn create_map(&self, center: Coordinates, level: u8) -> Result<()> {
        (**self).create_map(center, level)
    }

    fn set_center(&self, center: Coordinates) {
        (**self).set_center(center)
    }

    fn place_marker(&self, at: Coordinates) {
        (**self).place_marker(at)
    }

    async fn reverse_geocode(&self, at: Coordinates) -> Result<Option<String>> {
        (**self).reverse_geocode(at).await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickerState {
    pub open: bool,
    pub center: Option<Coordinates>,
    /// 当前候选位置，地址解析完成前使用坐标文本
    pub selection: Option<LocationSelection>,
    pub resolving: bool,
    pub error: Option<String>,
}

type Listener = Box<dyn Fn(&PickerState)>;

struct PickerInner<M, G> {
    map: M,
    geo: G,
    state: RefCell<PickerState>,
    // 每次打开/关闭递增，用于丢弃关闭后才返回的异步结果
    generation: Cell<u64>,
    // 每次选点递增，只有最新一次选点的地址会被采用
    selection_seq: Cell<u64>,
    listener: RefCell<Option<Listener>>,
}

pub struct LocationPicker<M, G> {
    inner: Rc<PickerInner<M, G>>,
}

impl<M, G> Clone for LocationPicker<M, G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: MapProvider, G: Geolocator> LocationPicker<M, G> {
    pub fn new(map: M, geo: G) -> Self {
        Self {
            inner: Rc::new(PickerInner {
                map,
                geo,
                state: RefCell::new(PickerState::default()),
                generation: Cell::new(0),
                selection_seq: Cell::new(0),
                listener: RefCell::new(None),
            }),
        }
    }

    /// 状态变化时回调（视图层据此刷新）
    pub fn on_change(&self, f: impl Fn(&PickerState) + 'static) {
        *self.inner.listener.borrow_mut() = Some(Box::new(f));
    }

    pub fn state(&self) -> PickerState {
        self.inner.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().open
    }

    fn update(&self, f: impl FnOnce(&mut PickerState)) {
        f(&mut self.inner.state.borrow_mut());
        let snapshot = self.state();
        if let Some(listener) = self.inner.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        self.inner.generation.get() == generation && self.inner.state.borrow().open
    }

    /// 打开选择器并创建地图
    ///
    /// 给出初始中心时直接选中该点；否则尝试静默定位，失败则停留在默认中心。
    pub async fn open(&self, initial: Option<Coordinates>) -> Result<()> {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        self.inner.selection_seq.set(0);

        let center = initial.filter(Coordinates::is_finite).unwrap_or(DEFAULT_CENTER);
        self.update(|s| {
            *s = PickerState {
                open: true,
                center: Some(center),
                ..PickerState::default()
            };
        });

        if let Err(e) = self.inner.map.create_map(center, DEFAULT_ZOOM_LEVEL) {
            warn!(error = %e, "failed to create map");
            let message = e.user_message();
            self.update(|s| s.error = Some(message));
            return Err(e);
        }

        match initial {
            Some(at) if at.is_finite() => self.select(at).await,
            _ => match self.inner.geo.current_position().await {
                Ok(pos) if self.is_live(generation) => {
                    self.recenter(pos);
                    self.select(pos).await;
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "silent geolocation failed, keeping default center"),
            },
        }
        Ok(())
    }

    fn recenter(&self, at: Coordinates) {
        self.inner.map.set_center(at);
        self.update(|s| s.center = Some(at));
    }

    /// 选中地图上的一点并解析地址
    ///
    /// 新的选点会覆盖旧的；关闭后或被更新选点取代后返回的地址会被丢弃。
    pub async fn select(&self, at: Coordinates) {
        let generation = self.inner.generation.get();
        if !self.is_live(generation) {
            return;
        }
        let seq = self.inner.selection_seq.get() + 1;
        self.inner.selection_seq.set(seq);

        self.inner.map.place_marker(at);
        self.update(|s| {
            s.selection = Some(LocationSelection {
                lat: at.lat,
                lng: at.lng,
                address: at.display_fallback(),
            });
            s.resolving = true;
            s.error = None;
        });

        let address = match self.inner.map.reverse_geocode(at).await {
            Ok(Some(address)) if !address.trim().is_empty() => address,
            Ok(_) => at.display_fallback(),
            Err(e) => {
                warn!(error = %e, "reverse geocode failed");
                at.display_fallback()
            }
        };

        if !self.is_live(generation) || self.inner.selection_seq.get() != seq {
            debug!(seq, "dropping stale geocode result");
            return;
        }
        self.update(|s| {
            s.selection = Some(LocationSelection {
                lat: at.lat,
                lng: at.lng,
                address,
            });
            s.resolving = false;
        });
    }

    /// 移动到当前位置，定位失败时把错误展示给用户
    pub async fn use_current_location(&self) -> Result<()> {
        let generation = self.inner.generation.get();
        match self.inner.geo.current_position().await {
            Ok(pos) => {
                if self.is_live(generation) {
                    self.recenter(pos);
                    self.select(pos).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "geolocation denied");
                if self.is_live(generation) {
                    let message = e.user_message();
                    self.update(|s| s.error = Some(message));
                }
                Err(e)
            }
        }
    }

    /// 确认选点：返回最后一次选中的位置并关闭；尚未选点时保持打开
    pub fn confirm(&self) -> Option<LocationSelection> {
        let selection = {
            let state = self.inner.state.borrow();
            if !state.open {
                return None;
            }
            state.selection.clone()?
        };
        self.close();
        Some(selection)
    }

    pub fn cancel(&self) {
        self.close();
    }

    fn close(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.update(|s| *s = PickerState::default());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::StrollError;
    use futures::channel::oneshot;
    use std::collections::VecDeque;

    type GeocodeReply = (Option<oneshot::Receiver<()>>, Result<Option<String>>);

    #[derive(Default)]
    pub(crate) struct FakeMap {
        pub calls: RefCell<Vec<String>>,
        replies: RefCell<VecDeque<GeocodeReply>>,
        pub fail_create: Cell<bool>,
    }

    impl FakeMap {
        pub fn reply(&self, result: Result<Option<String>>) {
            self.replies.borrow_mut().push_back((None, result));
        }

        pub fn gated_reply(&self, result: Result<Option<String>>) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.replies.borrow_mut().push_back((Some(rx), result));
            tx
        }
    }

    #[async_trait(?Send)]
    impl MapProvider for FakeMap {
        fn create_map(&self, center: Coordinates, level: u8) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("create {} {} {}", center.lat, center.lng, level));
            if self.fail_create.get() {
                return Err(StrollError::MapService("sdk missing".into()));
            }
            Ok(())
        }

        fn set_center(&self, center: Coordinates) {
            self.calls
                .borrow_mut()
                .push(format!("center {} {}", center.lat, center.lng));
        }

        fn place_marker(&self, at: Coordinates) {
            self.calls
                .borrow_mut()
                .push(format!("marker {} {}", at.lat, at.lng));
        }

        async fn reverse_geocode(&self, _at: Coordinates) -> Result<Option<String>> {
            let reply = self.replies.borrow_mut().pop_front();
            match reply {
                Some((gate, result)) => {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    result
                }
                None => Ok(None),
            }
        }
    }

    pub(crate) struct FakeGeo(pub RefCell<Option<Coordinates>>);

    impl FakeGeo {
        pub fn at(pos: Coordinates) -> Rc<Self> {
            Rc::new(Self(RefCell::new(Some(pos))))
        }

        pub fn denied() -> Rc<Self> {
            Rc::new(Self(RefCell::new(None)))
        }
    }

    #[async_trait(?Send)]
    impl Geolocator for FakeGeo {
        async fn current_position(&self) -> Result<Coordinates> {
            self.0
                .borrow()
                .ok_or_else(|| StrollError::Geolocation("permission denied".into()))
        }
    }

    fn picker(map: &Rc<FakeMap>, geo: Rc<FakeGeo>) -> LocationPicker<Rc<FakeMap>, Rc<FakeGeo>> {
        LocationPicker::new(map.clone(), geo)
    }

    const HERE: Coordinates = Coordinates::new(37.5, 127.0);
    const THERE: Coordinates = Coordinates::new(35.1, 129.0);

    #[tokio::test]
    async fn opens_at_default_center_when_location_denied() {
        let map = Rc::new(FakeMap::default());
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();

        let state = p.state();
        assert!(state.open);
        assert_eq!(state.center, Some(DEFAULT_CENTER));
        assert!(state.selection.is_none());
        assert!(state.error.is_none());
        assert_eq!(map.calls.borrow()[0], "create 37.5665 126.978 3");
    }

    #[tokio::test]
    async fn silent_fix_recenters_and_selects() {
        let map = Rc::new(FakeMap::default());
        map.reply(Ok(Some("Jongno-gu".into())));
        let p = picker(&map, FakeGeo::at(HERE));
        p.open(None).await.unwrap();

        let state = p.state();
        assert_eq!(state.center, Some(HERE));
        assert_eq!(state.selection.unwrap().address, "Jongno-gu");
        assert!(map.calls.borrow().contains(&"marker 37.5 127".to_string()));
    }

    #[tokio::test]
    async fn geocode_failure_falls_back_to_coordinates() {
        let map = Rc::new(FakeMap::default());
        map.reply(Err(StrollError::MapService("quota".into())));
        map.reply(Ok(None));
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();

        p.select(HERE).await;
        assert_eq!(p.state().selection.unwrap().address, "lat 37.5000, lng 127.0000");

        p.select(THERE).await;
        let selection = p.state().selection.unwrap();
        assert_eq!(selection.lat, 35.1);
        assert_eq!(selection.address, "lat 35.1000, lng 129.0000");
    }

    #[tokio::test]
    async fn confirm_emits_last_selection_and_closes() {
        let map = Rc::new(FakeMap::default());
        map.reply(Ok(Some("first".into())));
        map.reply(Ok(Some("second".into())));
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();
        assert_eq!(p.confirm(), None);
        assert!(p.is_open());

        p.select(HERE).await;
        p.select(THERE).await;
        let selection = p.confirm().unwrap();
        assert_eq!(selection.address, "second");
        assert_eq!(selection.coordinates(), THERE);
        assert!(!p.is_open());
        assert_eq!(p.confirm(), None);
    }

    #[tokio::test]
    async fn cancel_emits_nothing() {
        let map = Rc::new(FakeMap::default());
        let p = picker(&map, FakeGeo::denied());
        p.open(Some(HERE)).await.unwrap();
        assert!(p.state().selection.is_some());

        p.cancel();
        assert_eq!(p.state(), PickerState::default());
    }

    #[tokio::test]
    async fn geocode_after_close_is_discarded() {
        let map = Rc::new(FakeMap::default());
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();

        let gate = map.gated_reply(Ok(Some("late".into())));
        let closer = p.clone();
        futures::join!(p.select(HERE), async move {
            closer.cancel();
            let _ = gate.send(());
        });
        assert_eq!(p.state(), PickerState::default());
    }

    #[tokio::test]
    async fn older_geocode_cannot_overwrite_newer_selection() {
        let map = Rc::new(FakeMap::default());
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();

        let slow = map.gated_reply(Ok(Some("old".into())));
        map.reply(Ok(Some("new".into())));
        let other = p.clone();
        futures::join!(p.select(HERE), async move {
            other.select(THERE).await;
            let _ = slow.send(());
        });

        let selection = p.state().selection.unwrap();
        assert_eq!(selection.address, "new");
        assert_eq!(selection.coordinates(), THERE);
    }

    #[tokio::test]
    async fn current_location_denied_surfaces_error() {
        let map = Rc::new(FakeMap::default());
        let p = picker(&map, FakeGeo::denied());
        p.open(None).await.unwrap();

        let err = p.use_current_location().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Geolocation);
        assert!(p.state().error.is_some());
        assert!(p.is_open());
    }

    #[tokio::test]
    async fn map_creation_failure_is_reported() {
        let map = Rc::new(FakeMap::default());
        map.fail_create.set(true);
        let p = picker(&map, FakeGeo::at(HERE));
        assert!(p.open(None).await.is_err());
        assert!(p.state().error.is_some());
    }
}
