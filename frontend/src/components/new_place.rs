//! 新建地点表单（multipart 上传图片）

use js_sys::Uint8Array;
use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::forms::{ImageFile, NewPlaceForm, check_images};
use stroll::{AppRoute, FieldErrors};
use stroll_shared::PLACE_CATEGORIES;
use tracing::warn;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlInputElement;

use crate::auth::use_auth;
use crate::components::common::FieldError;
use crate::web::router::use_router;

/// 读出文件选择框中的全部文件
async fn read_files(input: HtmlInputElement) -> Vec<ImageFile> {
    let Some(list) = input.files() else {
        return Vec::new();
    };
    let mut files = Vec::with_capacity(list.length() as usize);
    for index in 0..list.length() {
        let Some(file) = list.get(index) else {
            continue;
        };
        match JsFuture::from(file.array_buffer()).await {
            Ok(buffer) => files.push(ImageFile {
                name: file.name(),
                content_type: file.type_(),
                bytes: Uint8Array::new(&buffer).to_vec(),
            }),
            Err(e) => warn!(file = %file.name(), error = ?e, "failed to read file"),
        }
    }
    files
}

#[component]
pub fn NewPlacePage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let form = RwSignal::new(NewPlaceForm::default());
    let (field_errors, set_field_errors) = signal(FieldErrors::new());
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (is_submitting, set_is_submitting) = signal(false);

    let on_files = move |ev: web_sys::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        spawn_local(async move {
            let images = read_files(input).await;
            // 选图后立即校验数量、类型与大小
            match check_images(&images) {
                Ok(()) => set_field_errors.update(|e| e.remove("imgs")),
                Err(e) => {
                    if let Some(msg) = e.field_errors().and_then(|f| f.get("imgs")) {
                        let msg = msg.to_string();
                        set_field_errors.update(|errors| errors.insert("imgs", msg));
                    }
                }
            }
            form.update(|f| f.images = images);
        });
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let current = form.get();
        if let Err(e) = current.validate() {
            set_field_errors.set(e.field_errors().cloned().unwrap_or_default());
            return;
        }

        set_field_errors.set(FieldErrors::new());
        set_error_msg.set(None);
        set_is_submitting.set(true);

        spawn_local(async move {
            match auth.services().api.create_place(current.into_parts()).await {
                Ok(created) => {
                    let target = created
                        .place_no
                        .map(AppRoute::Place)
                        .unwrap_or(AppRoute::Around);
                    router.navigate(&target.to_path());
                }
                Err(e) => set_error_msg.set(Some(e.user_message())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="max-w-2xl mx-auto p-4 md:p-8">
            <h1 class="text-3xl font-bold mb-6">"Add a place"</h1>

            <form class="card bg-base-100 shadow-xl" on:submit=on_submit>
                <div class="card-body gap-4">
                    <Show when=move || error_msg.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error_msg.get().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    <label class="form-control">
                        <span class="label-text">"Place name"</span>
                        <input
                            type="text"
                            class="input input-bordered"
                            prop:value=move || form.with(|f| f.place_name.clone())
                            on:input=move |ev| form.update(|f| f.place_name = event_target_value(&ev))
                        />
                        <FieldError errors=field_errors field="placeName" />
                    </label>

                    <label class="form-control">
                        <span class="label-text">"Category"</span>
                        <select
                            class="select select-bordered"
                            prop:value=move || form.with(|f| f.category.clone())
                            on:change=move |ev| form.update(|f| f.category = event_target_value(&ev))
                        >
                            <option value="" disabled=true>"Choose a category"</option>
                            {PLACE_CATEGORIES
                                .iter()
                                .map(|c| view! { <option value=c.key>{c.label}</option> })
                                .collect_view()}
                        </select>
                        <FieldError errors=field_errors field="category" />
                    </label>

                    <label class="form-control">
                        <span class="label-text">"Address"</span>
                        <input
                            type="text"
                            class="input input-bordered"
                            prop:value=move || form.with(|f| f.address.clone())
                            on:input=move |ev| form.update(|f| f.address = event_target_value(&ev))
                        />
                        <FieldError errors=field_errors field="address" />
                    </label>

                    <label class="form-control">
                        <span class="label-text">"Detail address"</span>
                        <input
                            type="text"
                            class="input input-bordered"
                            prop:value=move || form.with(|f| f.detail_address.clone())
                            on:input=move |ev| form.update(|f| f.detail_address = event_target_value(&ev))
                        />
                        <FieldError errors=field_errors field="detailAddress" />
                    </label>

                    <label class="form-control">
                        <span class="label-text">"Description"</span>
                        <textarea
                            class="textarea textarea-bordered h-32"
                            prop:value=move || form.with(|f| f.content.clone())
                            on:input=move |ev| form.update(|f| f.content = event_target_value(&ev))
                        ></textarea>
                        <FieldError errors=field_errors field="content" />
                    </label>

                    <label class="form-control">
                        <span class="label-text">"Photos (up to 5, 5MB each)"</span>
                        <input
                            type="file"
                            multiple=true
                            accept="image/*"
                            class="file-input file-input-bordered"
                            on:change=on_files
                        />
                        <span class="label-text-alt">
                            {move || form.with(|f| {
                                f.images.iter().map(|i| i.name.as_str()).collect::<Vec<_>>().join(", ")
                            })}
                        </span>
                        <FieldError errors=field_errors field="imgs" />
                    </label>

                    <div class="card-actions justify-end mt-4">
                        <button class="btn btn-primary" disabled=move || is_submitting.get()>
                            {move || if is_submitting.get() {
                                view! { <span class="loading loading-spinner"></span> "Saving..." }.into_any()
                            } else {
                                "Save".into_any()
                            }}
                        </button>
                    </div>
                </div>
            </form>
        </div>
    }
}
