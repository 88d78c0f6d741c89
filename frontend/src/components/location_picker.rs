//! 地图选点弹窗

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::LocationPicker;
use stroll_shared::{Coordinates, LocationSelection};

use crate::web::{BrowserGeolocator, KakaoMap};

const MAP_CONTAINER_ID: &str = "location-picker-map";

/// 打开选点器的请求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerRequest {
    /// 初始中心；None 时选点器会尝试静默定位
    pub center: Option<Coordinates>,
}

#[component]
pub fn LocationPickerModal(
    /// 写入 Some 打开弹窗，关闭时由弹窗写回 None
    request: RwSignal<Option<PickerRequest>>,
    /// 用户确认选点
    on_select: Callback<LocationSelection>,
) -> impl IntoView {
    let map = Rc::new(KakaoMap::new(MAP_CONTAINER_ID));
    let picker = LocationPicker::new(map.clone(), BrowserGeolocator);

    let (state, set_state) = signal(picker.state());
    picker.on_change(move |s| set_state.set(s.clone()));

    // 地图点击经由信号转交，地图回调不直接持有选点器
    let (clicked, set_clicked) = signal(Option::<Coordinates>::None);
    map.set_on_click(move |at| set_clicked.set(Some(at)));

    let picker = StoredValue::new_local(picker);

    Effect::new(move |_| {
        let Some(req) = request.get() else {
            return;
        };
        let picker = picker.get_value();
        if picker.is_open() {
            return;
        }
        spawn_local(async move {
            // 失败信息已经写入选点器状态
            let _ = picker.open(req.center).await;
        });
    });

    Effect::new(move |_| {
        if let Some(at) = clicked.get() {
            let picker = picker.get_value();
            spawn_local(async move { picker.select(at).await });
        }
    });

    let on_current_location = move |_| {
        let picker = picker.get_value();
        spawn_local(async move {
            let _ = picker.use_current_location().await;
        });
    };

    let on_confirm = move |_| {
        if let Some(selection) = picker.with_value(|p| p.confirm()) {
            request.set(None);
            on_select.run(selection);
        }
    };

    let on_cancel = move |_| {
        picker.with_value(|p| p.cancel());
        request.set(None);
    };

    view! {
        // 容器始终保留在 DOM 中，地图 SDK 需要在打开时找到它
        <div class=move || if state.get().open { "modal modal-open" } else { "modal" }>
            <div class="modal-box w-11/12 max-w-3xl">
                <h3 class="font-bold text-lg">"Choose a location"</h3>
                <p class="text-sm text-base-content/70">"Click on the map to pick a spot."</p>

                <div id=MAP_CONTAINER_ID class="w-full h-96 rounded-box mt-4 bg-base-200"></div>

                <div class="mt-4 min-h-6">
                    {move || state.get().selection.map(|s| view! {
                        <p class="text-sm">
                            <span class="font-semibold">"Selected: "</span>
                            {s.address}
                        </p>
                    })}
                    <Show when=move || state.get().resolving>
                        <span class="loading loading-dots loading-xs"></span>
                    </Show>
                </div>

                <Show when=move || state.get().error.is_some()>
                    <div role="alert" class="alert alert-warning text-sm py-2 mt-2">
                        <span>{move || state.get().error.unwrap_or_default()}</span>
                    </div>
                </Show>

                <div class="modal-action">
                    <button class="btn btn-ghost" on:click=on_current_location>"Use my location"</button>
                    <button class="btn" on:click=on_cancel>"Cancel"</button>
                    <button
                        class="btn btn-primary"
                        disabled=move || state.get().selection.is_none()
                        on:click=on_confirm
                    >
                        "Confirm"
                    </button>
                </div>
            </div>
        </div>
    }
}
