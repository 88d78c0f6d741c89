//! Kakao Maps JavaScript SDK 适配器
//!
//! SDK 由 index.html 加载，需要带上 `services` 库用于逆地理编码。
//! 地图在选点弹窗每次打开时重新创建，地图上最多只有一个标记。

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use js_sys::{Object, Reflect};
use stroll::{MapProvider, Result, StrollError};
use stroll_shared::Coordinates;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["kakao", "maps"], js_name = LatLng)]
    type LatLng;

    #[wasm_bindgen(constructor, catch, js_namespace = ["kakao", "maps"], js_class = "LatLng")]
    fn new(lat: f64, lng: f64) -> std::result::Result<LatLng, JsValue>;

    #[wasm_bindgen(method, js_name = getLat)]
    fn get_lat(this: &LatLng) -> f64;

    #[wasm_bindgen(method, js_name = getLng)]
    fn get_lng(this: &LatLng) -> f64;

    #[wasm_bindgen(js_namespace = ["kakao", "maps"], js_name = Map)]
    type KakaoMapHandle;

    #[wasm_bindgen(constructor, catch, js_namespace = ["kakao", "maps"], js_class = "Map")]
    fn new(
        container: &web_sys::Element,
        options: &JsValue,
    ) -> std::result::Result<KakaoMapHandle, JsValue>;

    #[wasm_bindgen(method, js_name = setCenter)]
    fn set_center(this: &KakaoMapHandle, center: &LatLng);

    #[wasm_bindgen(js_namespace = ["kakao", "maps"], js_name = Marker)]
    type Marker;

    #[wasm_bindgen(constructor, catch, js_namespace = ["kakao", "maps"], js_class = "Marker")]
    fn new(options: &JsValue) -> std::result::Result<Marker, JsValue>;

    #[wasm_bindgen(method, js_name = setPosition)]
    fn set_position(this: &Marker, position: &LatLng);

    #[wasm_bindgen(js_namespace = ["kakao", "maps", "services"], js_name = Geocoder)]
    type Geocoder;

    #[wasm_bindgen(constructor, catch, js_namespace = ["kakao", "maps", "services"], js_class = "Geocoder")]
    fn new() -> std::result::Result<Geocoder, JsValue>;

    #[wasm_bindgen(method, js_name = coord2Address)]
    fn coord2address(this: &Geocoder, lng: f64, lat: f64, callback: &js_sys::Function);

    #[wasm_bindgen(catch, js_namespace = ["kakao", "maps", "event"], js_name = addListener)]
    fn add_listener(
        target: &JsValue,
        kind: &str,
        handler: &js_sys::Function,
    ) -> std::result::Result<(), JsValue>;
}

/// Kakao 逆地理编码返回 "OK" / "ZERO_RESULT" / "ERROR"
const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULT: &str = "ZERO_RESULT";

fn sdk_error(e: JsValue) -> StrollError {
    StrollError::MapService(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

fn lat_lng(at: Coordinates) -> Result<LatLng> {
    LatLng::new(at.lat, at.lng).map_err(sdk_error)
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// 从 coord2Address 的结果中取地址：优先道路名地址，其次地番地址
fn first_address(result: &JsValue) -> Option<String> {
    let first = get(result, "0")?;
    ["road_address", "address"]
        .iter()
        .filter_map(|key| get(&first, key))
        .filter_map(|addr| get(&addr, "address_name"))
        .filter_map(|name| name.as_string())
        .find(|name| !name.is_empty())
}

type ClickHandler = Rc<dyn Fn(Coordinates)>;

/// 绑定到指定 DOM 容器的 Kakao 地图
pub struct KakaoMap {
    container_id: String,
    map: RefCell<Option<KakaoMapHandle>>,
    marker: RefCell<Option<Marker>>,
    on_click: RefCell<Option<ClickHandler>>,
    click_listener: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl KakaoMap {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            map: RefCell::new(None),
            marker: RefCell::new(None),
            on_click: RefCell::new(None),
            click_listener: RefCell::new(None),
        }
    }

    /// 设置地图点击回调，对之后创建的地图生效
    pub fn set_on_click(&self, f: impl Fn(Coordinates) + 'static) {
        *self.on_click.borrow_mut() = Some(Rc::new(f));
    }

    fn container(&self) -> Result<web_sys::Element> {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&self.container_id))
            .ok_or_else(|| {
                StrollError::MapService(format!("map container #{} not found", self.container_id))
            })
    }

    fn listen_clicks(&self, map: &KakaoMapHandle) -> Result<()> {
        let Some(on_click) = self.on_click.borrow().clone() else {
            return Ok(());
        };
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let Some(position) = get(&event, "latLng") else {
                return;
            };
            let position: LatLng = position.unchecked_into();
            on_click(Coordinates::new(position.get_lat(), position.get_lng()));
        });
        add_listener(map, "click", listener.as_ref().unchecked_ref()).map_err(sdk_error)?;
        *self.click_listener.borrow_mut() = Some(listener);
        Ok(())
    }
}

#[async_trait(?Send)]
impl MapProvider for KakaoMap {
    fn create_map(&self, center: Coordinates, level: u8) -> Result<()> {
        let container = self.container()?;
        let options = Object::new();
        Reflect::set(&options, &"center".into(), &lat_lng(center)?).map_err(sdk_error)?;
        Reflect::set(&options, &"level".into(), &JsValue::from(level)).map_err(sdk_error)?;

        let map = KakaoMapHandle::new(&container, &options).map_err(sdk_error)?;
        self.listen_clicks(&map)?;
        debug!(lat = center.lat, lng = center.lng, level, "map created");

        *self.marker.borrow_mut() = None;
        *self.map.borrow_mut() = Some(map);
        Ok(())
    }

    fn set_center(&self, center: Coordinates) {
        let map = self.map.borrow();
        let Some(map) = map.as_ref() else {
            return;
        };
        match lat_lng(center) {
            Ok(position) => map.set_center(&position),
            Err(e) => warn!(error = %e, "failed to move map center"),
        }
    }

    fn place_marker(&self, at: Coordinates) {
        let position = match lat_lng(at) {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "failed to place marker");
                return;
            }
        };

        if let Some(marker) = self.marker.borrow().as_ref() {
            marker.set_position(&position);
            return;
        }

        let Some(map) = self.map.borrow().as_ref().map(|m| JsValue::from(m.clone())) else {
            return;
        };
        let options = Object::new();
        let created = Reflect::set(&options, &"map".into(), &map)
            .and_then(|_| Reflect::set(&options, &"position".into(), &position))
            .and_then(|_| Marker::new(&options));
        match created {
            Ok(marker) => *self.marker.borrow_mut() = Some(marker),
            Err(e) => warn!(error = %sdk_error(e), "failed to place marker"),
        }
    }

    async fn reverse_geocode(&self, at: Coordinates) -> Result<Option<String>> {
        let geocoder = Geocoder::new().map_err(sdk_error)?;
        let (tx, rx) = oneshot::channel::<Result<Option<String>>>();

        let callback = Closure::once_into_js(move |result: JsValue, status: JsValue| {
            let status = status.as_string().unwrap_or_default();
            let reply = match status.as_str() {
                STATUS_OK => Ok(first_address(&result)),
                STATUS_ZERO_RESULT => Ok(None),
                other => Err(StrollError::MapService(format!("geocoder status {}", other))),
            };
            let _ = tx.send(reply);
        });
        geocoder.coord2address(at.lng, at.lat, callback.unchecked_ref());

        rx.await
            .map_err(|_| StrollError::MapService("geocoder callback was dropped".into()))?
    }
}
