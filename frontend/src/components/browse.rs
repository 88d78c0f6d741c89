//! 附近地点浏览页
//!
//! 所有筛选操作只改地址栏，地址栏的查询串变化再驱动取数。

use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::{AppRoute, SearchQuery, browse_href};
use stroll_shared::{
    BROWSE_CATEGORIES, LocationSelection, MAX_DISTANCE_UNIT, MAX_STAR, METERS_PER_DISTANCE_UNIT,
    MIN_DISTANCE_UNIT, OrderBy, PLACEHOLDER_IMAGE, PlaceSummary,
};

use crate::auth::use_auth;
use crate::components::common::{Spinner, Stars};
use crate::components::location_picker::{LocationPickerModal, PickerRequest};
use crate::components::pagination::Pagination;
use crate::web::BrowserGeolocator;
use crate::web::router::{Link, use_router};

fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

#[component]
pub fn BrowsePage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let controller = auth.services().browse();
    let (state, set_state) = signal(controller.state());
    controller.on_change(move |s| set_state.set(s.clone()));
    let controller = StoredValue::new_local(controller);

    // 地址栏 -> 状态 -> 请求
    Effect::new(move |_| {
        let query_string = router.query().get();
        let controller = controller.get_value();
        spawn_local(async move {
            controller.load_from_url(&query_string).await;
        });
    });

    let commit = move |query: SearchQuery| router.navigate(&browse_href(&query));

    let picker_request = RwSignal::new(None::<PickerRequest>);
    let on_select = Callback::new(move |selection: LocationSelection| {
        commit(controller.with_value(|c| c.apply_selection(&selection)));
    });

    let on_locate = move |_| {
        let controller = controller.get_value();
        spawn_local(async move {
            let result = controller.locate(&BrowserGeolocator).await;
            if let Some(query) = result.commit {
                commit(query);
            }
            picker_request.set(Some(PickerRequest {
                center: result.picker_center,
            }));
        });
    };

    let on_pick = move |_| {
        let center = state.with_untracked(|s| s.query.coordinates);
        picker_request.set(Some(PickerRequest { center }));
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        commit(controller.with_value(|c| c.submit()));
    };

    let on_page = Callback::new(move |page: u32| {
        commit(controller.with_value(|c| c.go_to_page(page)));
    });

    let current_page = Signal::derive(move || state.with(|s| s.query.page));
    let last_page = Signal::derive(move || state.with(|s| s.last_page));

    view! {
        <div class="max-w-6xl mx-auto p-4 md:p-8 space-y-6">
            // 分类
            <div role="tablist" class="tabs tabs-boxed flex-wrap">
                {BROWSE_CATEGORIES
                    .iter()
                    .map(|category| {
                        let key = category.key;
                        view! {
                            <a
                                role="tab"
                                class=move || {
                                    if state.with(|s| s.query.category == key) { "tab tab-active" } else { "tab" }
                                }
                                on:click=move |_| commit(controller.with_value(|c| c.select_category(key)))
                            >
                                {category.label}
                            </a>
                        }
                    })
                    .collect_view()}
            </div>

            // 关键词与筛选
            <form class="card bg-base-100 shadow" on:submit=on_submit>
                <div class="card-body grid gap-4 md:grid-cols-4 items-end">
                    <label class="form-control md:col-span-2">
                        <span class="label-text">"Keywords"</span>
                        <input
                            type="search"
                            class="input input-bordered"
                            placeholder="dog cafe, park..."
                            prop:value=move || state.with(|s| s.draft.keywords.clone())
                            on:input=move |ev| controller.with_value(|c| c.edit_keywords(&event_target_value(&ev)))
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text">
                            "Within "
                            {move || {
                                let unit = state.with(|s| s.draft.max_distance_unit);
                                format_distance((unit * METERS_PER_DISTANCE_UNIT) as f64)
                            }}
                        </span>
                        <input
                            type="range"
                            class="range range-sm range-primary"
                            min=MIN_DISTANCE_UNIT.to_string()
                            max=MAX_DISTANCE_UNIT.to_string()
                            prop:value=move || state.with(|s| s.draft.max_distance_unit.to_string())
                            on:input=move |ev| {
                                if let Ok(unit) = event_target_value(&ev).parse() {
                                    controller.with_value(|c| c.edit_distance(unit));
                                }
                            }
                        />
                    </label>
                    <label class="form-control">
                        <span class="label-text">"Minimum rating"</span>
                        <select
                            class="select select-bordered"
                            prop:value=move || state.with(|s| s.draft.min_star.to_string())
                            on:change=move |ev| {
                                if let Ok(star) = event_target_value(&ev).parse() {
                                    controller.with_value(|c| c.edit_min_star(star));
                                }
                            }
                        >
                            {(0..=MAX_STAR)
                                .map(|star| {
                                    let label = if star == 0 { "Any".to_string() } else { format!("{}+", star) };
                                    view! { <option value=star.to_string()>{label}</option> }
                                })
                                .collect_view()}
                        </select>
                    </label>
                    <button type="submit" class="btn btn-primary md:col-start-4">"Search"</button>
                </div>
            </form>

            // 位置与排序
            <div class="flex flex-wrap items-center gap-2">
                <span class="badge badge-outline badge-lg">
                    {move || state.with(|s| match (&s.location_label, s.query.coordinates) {
                        (Some(label), _) => label.clone(),
                        (None, Some(at)) => at.display_fallback(),
                        (None, None) => "Location not set".to_string(),
                    })}
                </span>
                <button class="btn btn-sm" on:click=on_locate>"Near me"</button>
                <button class="btn btn-sm" on:click=on_pick>"Pick on map"</button>
                <Show when=move || state.with(|s| s.query.coordinates.is_some())>
                    <button
                        class="btn btn-sm btn-ghost"
                        on:click=move |_| commit(controller.with_value(|c| c.clear_location()))
                    >
                        "Clear"
                    </button>
                </Show>

                <div class="flex-1"></div>
                <select
                    class="select select-bordered select-sm"
                    prop:value=move || state.with(|s| s.query.order_by.as_str().to_string())
                    on:change=move |ev| {
                        if let Some(order_by) = OrderBy::parse(&event_target_value(&ev)) {
                            commit(controller.with_value(|c| c.set_order(order_by)));
                        }
                    }
                >
                    <option value=OrderBy::Distance.as_str()>"Nearest"</option>
                    <option value=OrderBy::Star.as_str()>"Top rated"</option>
                </select>
            </div>

            <Show when=move || state.with(|s| s.error.is_some())>
                <div role="alert" class="alert alert-error">
                    <span>{move || state.with(|s| s.error.clone().unwrap_or_default())}</span>
                </div>
            </Show>

            // 结果
            <Show
                when=move || !(state.with(|s| s.loading && s.places.is_empty()))
                fallback=|| view! { <Spinner /> }
            >
                <Show
                    when=move || state.with(|s| !s.places.is_empty())
                    fallback=|| view! {
                        <p class="text-center py-12 text-base-content/50">"No places match your search."</p>
                    }
                >
                    <div class=move || {
                        if state.with(|s| s.loading) {
                            "grid gap-4 sm:grid-cols-2 lg:grid-cols-3 opacity-50"
                        } else {
                            "grid gap-4 sm:grid-cols-2 lg:grid-cols-3"
                        }
                    }>
                        <For
                            each=move || state.with(|s| s.places.clone())
                            key=|p| p.place_id
                            children=move |place| view! { <PlaceCard place=place /> }
                        />
                    </div>
                </Show>
            </Show>

            <Pagination current=current_page last=last_page on_select=on_page />

            <LocationPickerModal request=picker_request on_select=on_select />
        </div>
    }
}

#[component]
fn PlaceCard(place: PlaceSummary) -> impl IntoView {
    let href = AppRoute::Place(place.place_id).to_path();
    let address = place.full_address();
    let distance = place.distance_meters.map(format_distance);

    view! {
        <Link to=href class="card bg-base-100 shadow hover:shadow-lg transition-shadow">
            <figure class="h-48">
                <img src=place.thumbnail() alt=place.name.clone() class="object-cover w-full h-full"
                    // 缩略图缺失时换成占位图
                    on:error=|ev| {
                        let img = event_target::<web_sys::HtmlImageElement>(&ev);
                        if !img.src().ends_with(PLACEHOLDER_IMAGE) {
                            img.set_src(PLACEHOLDER_IMAGE);
                        }
                    }
                />
            </figure>
            <div class="card-body p-4">
                <h2 class="card-title text-base">{place.name.clone()}</h2>
                <Stars value=place.star_rating />
                <p class="text-sm text-base-content/70">{address}</p>
                {distance.map(|d| view! { <span class="badge badge-ghost">{d}</span> })}
            </div>
        </Link>
    }
}
