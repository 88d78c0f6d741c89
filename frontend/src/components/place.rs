//! 地点详情页：图片、收藏、评论

use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::{AppRoute, DeleteOutcome, FieldErrors};
use stroll_shared::{MAX_STAR, Review, format_date};

use crate::auth::use_auth;
use crate::components::common::{FieldError, Spinner, Stars, Toast};
use crate::web::BrowserConfirm;
use crate::web::router::use_router;

#[component]
pub fn PlacePage(place_no: u64) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let controller = auth.services().place();
    let (state, set_state) = signal(controller.state());
    controller.on_change(move |s| set_state.set(s.clone()));
    let controller = StoredValue::new_local(controller);

    let toast = RwSignal::new(None::<(String, bool)>);
    let (review_errors, set_review_errors) = signal(FieldErrors::new());

    {
        let controller = controller.get_value();
        spawn_local(async move {
            // 失败信息已经写入页面状态
            let _ = controller.load(place_no).await;
        });
    }

    // 控制器给出的提示转交给 Toast
    Effect::new(move |_| {
        if state.with(|s| s.notice.is_some()) {
            if let Some(message) = controller.with_value(|c| c.take_notice()) {
                toast.set(Some((message, false)));
            }
        }
    });

    let is_authenticated = move || auth.state.with(|s| s.is_authenticated);

    // 会话每次重新读取，登录状态变化后按钮随之更新
    let can_delete_place = move || {
        auth.state.track();
        state.track();
        controller.with_value(|c| c.can_delete_place())
    };

    let on_wish = move |_| {
        let controller = controller.get_value();
        spawn_local(async move {
            if let Err(e) = controller.toggle_wish().await {
                toast.set(Some((e.user_message(), true)));
            }
        });
    };

    let on_delete_place = move |_| {
        let controller = controller.get_value();
        spawn_local(async move {
            if controller.delete_place(&BrowserConfirm).await == DeleteOutcome::Deleted {
                router.navigate(&AppRoute::Around.to_path());
            }
        });
    };

    let on_submit_review = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let controller = controller.get_value();
        spawn_local(async move {
            match controller.submit_review().await {
                Ok(()) => set_review_errors.set(FieldErrors::new()),
                Err(e) => {
                    if let Some(errors) = e.field_errors() {
                        set_review_errors.set(errors.clone());
                    }
                }
            }
        });
    };

    let delete_review = move |review: Review| {
        let controller = controller.get_value();
        spawn_local(async move {
            controller.delete_review(&review, &BrowserConfirm).await;
        });
    };

    view! {
        <div class="max-w-4xl mx-auto p-4 md:p-8 space-y-6">
            <Toast notice=toast />

            <Show when=move || state.with(|s| s.error.is_some())>
                <div role="alert" class="alert alert-error">
                    <span>{move || state.with(|s| s.error.clone().unwrap_or_default())}</span>
                </div>
            </Show>

            <Show
                when=move || state.with(|s| s.place.is_some())
                fallback=move || view! {
                    <Show when=move || state.with(|s| s.loading)>
                        <Spinner />
                    </Show>
                }
            >
                // 标题与操作
                <div class="flex flex-wrap items-start justify-between gap-4">
                    <div>
                        <h1 class="text-3xl font-bold">
                            {move || state.with(|s| s.place.as_ref().map(|p| p.name.clone()).unwrap_or_default())}
                        </h1>
                        <p class="text-base-content/70">
                            {move || state.with(|s| s.place.as_ref().map(|p| p.address.clone()).unwrap_or_default())}
                        </p>
                        {move || state.with(|s| s.place.as_ref().map(|p| p.star_rating)).map(|star| view! { <Stars value=star /> })}
                    </div>
                    <div class="flex gap-2">
                        <Show when=is_authenticated>
                            <button class="btn btn-outline btn-secondary" on:click=on_wish>
                                {move || {
                                    let wished = state.with(|s| s.place.as_ref().is_some_and(|p| p.wished));
                                    if wished { "♥ Saved" } else { "♡ Save" }
                                }}
                            </button>
                        </Show>
                        <Show when=can_delete_place>
                            <button class="btn btn-outline btn-error" on:click=on_delete_place>"Delete place"</button>
                        </Show>
                    </div>
                </div>

                // 图片
                <div class="space-y-2">
                    <img
                        class="w-full max-h-[28rem] object-cover rounded-box"
                        src=move || state.with(|s| s.image_src().unwrap_or_default())
                    />
                    <div class="flex gap-2 overflow-x-auto">
                        {move || {
                            let (images, selected) = state.with(|s| {
                                (s.place.as_ref().map(|p| p.images.clone()).unwrap_or_default(), s.selected_image)
                            });
                            images
                                .into_iter()
                                .enumerate()
                                .map(|(index, src)| {
                                    let class = if index == selected {
                                        "w-20 h-20 object-cover rounded cursor-pointer ring ring-primary"
                                    } else {
                                        "w-20 h-20 object-cover rounded cursor-pointer opacity-70"
                                    };
                                    view! {
                                        <img
                                            src=src
                                            class=class
                                            on:click=move |_| controller.with_value(|c| c.select_image(index))
                                        />
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </div>

                <p class="whitespace-pre-line">
                    {move || state.with(|s| s.place.as_ref().and_then(|p| p.description.clone()).unwrap_or_default())}
                </p>

                // 评论
                <div class="divider">"Reviews"</div>

                <Show when=is_authenticated>
                    <form class="card bg-base-100 shadow" on:submit=on_submit_review>
                        <div class="card-body gap-2">
                            <div class="rating">
                                {(1..=MAX_STAR)
                                    .map(|star| view! {
                                        <input
                                            type="radio"
                                            name="review-star"
                                            class="mask mask-star-2 bg-warning"
                                            prop:checked=move || state.with(|s| s.draft.star == star)
                                            on:change=move |_| {
                                                let content = state.with_untracked(|s| s.draft.content.clone());
                                                controller.with_value(|c| c.edit_review(star, &content));
                                            }
                                        />
                                    })
                                    .collect_view()}
                            </div>
                            <FieldError errors=review_errors field="star" />
                            <textarea
                                class="textarea textarea-bordered"
                                placeholder="How was your visit?"
                                prop:value=move || state.with(|s| s.draft.content.clone())
                                on:input=move |ev| {
                                    let star = state.with_untracked(|s| s.draft.star);
                                    controller.with_value(|c| c.edit_review(star, &event_target_value(&ev)));
                                }
                            ></textarea>
                            <FieldError errors=review_errors field="content" />
                            <div class="card-actions justify-end">
                                <button type="submit" class="btn btn-primary btn-sm">"Post review"</button>
                            </div>
                        </div>
                    </form>
                </Show>

                <Show
                    when=move || state.with(|s| !s.reviews.is_empty())
                    fallback=|| view! { <p class="text-base-content/50">"No reviews yet."</p> }
                >
                    <ul class="space-y-3">
                        {move || {
                            auth.state.track();
                            state
                                .with(|s| s.reviews.clone())
                                .into_iter()
                                .map(|review| {
                                    let deletable = controller.with_value(|c| c.can_delete_review(&review));
                                    let target = review.clone();
                                    view! {
                                        <li class="card bg-base-100 shadow-sm">
                                            <div class="card-body p-4">
                                                <div class="flex items-center justify-between">
                                                    <div class="flex items-center gap-2">
                                                        <span class="font-semibold">{review.author_name.clone()}</span>
                                                        <Stars value=f64::from(review.star_rating) />
                                                    </div>
                                                    <span class="text-xs text-base-content/50">
                                                        {format_date(&review.created_at)}
                                                    </span>
                                                </div>
                                                <p>{review.content.clone()}</p>
                                                {deletable.then(|| view! {
                                                    <button
                                                        class="btn btn-ghost btn-xs text-error self-end"
                                                        on:click=move |_| delete_review(target.clone())
                                                    >
                                                        "Delete"
                                                    </button>
                                                })}
                                            </div>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                </Show>
            </Show>
        </div>
    }
}
