//! 浏览器定位：`navigator.geolocation.getCurrentPosition` 的异步封装

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use stroll::{Geolocator, Result, StrollError};
use stroll_shared::Coordinates;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{GeolocationPosition, GeolocationPositionError};

type Reply = Rc<RefCell<Option<oneshot::Sender<Result<Coordinates>>>>>;

fn reply(slot: &Reply, result: Result<Coordinates>) {
    if let Some(tx) = slot.borrow_mut().take() {
        let _ = tx.send(result);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserGeolocator;

#[async_trait(?Send)]
impl Geolocator for BrowserGeolocator {
    async fn current_position(&self) -> Result<Coordinates> {
        let geolocation = web_sys::window()
            .ok_or_else(|| StrollError::Geolocation("无法获取 window 对象".into()))?
            .navigator()
            .geolocation()
            .map_err(|_| StrollError::Geolocation("geolocation is not supported".into()))?;

        let (tx, rx) = oneshot::channel();
        let slot: Reply = Rc::new(RefCell::new(Some(tx)));

        // once_into_js: 回调被调用后自行释放，调用方提前放弃也不会触发已释放的闭包
        let on_success = {
            let slot = slot.clone();
            Closure::once_into_js(move |pos: GeolocationPosition| {
                let coords = pos.coords();
                reply(
                    &slot,
                    Ok(Coordinates::new(coords.latitude(), coords.longitude())),
                );
            })
        };
        let on_error = {
            let slot = slot.clone();
            Closure::once_into_js(move |err: GeolocationPositionError| {
                reply(&slot, Err(StrollError::Geolocation(err.message())));
            })
        };

        geolocation
            .get_current_position_with_error_callback(
                on_success.unchecked_ref(),
                Some(on_error.unchecked_ref()),
            )
            .map_err(|e| StrollError::Geolocation(format!("{:?}", e)))?;

        rx.await
            .map_err(|_| StrollError::Geolocation("position request was dropped".into()))?
    }
}
