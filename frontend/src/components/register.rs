use crate::auth::use_auth;
use crate::components::common::FieldError;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::forms::{IdCheck, RegisterForm};
use stroll::{AppRoute, FieldErrors};

#[component]
pub fn RegisterPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let form = RwSignal::new(RegisterForm::default());
    let (id_check, set_id_check) = signal(IdCheck::Unchecked);
    let (checking, set_checking) = signal(false);
    let (is_submitting, set_is_submitting) = signal(false);
    let (field_errors, set_field_errors) = signal(FieldErrors::new());
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    // ID 改动后之前的检查结果作废
    let on_user_id = move |ev: web_sys::Event| {
        form.update(|f| f.user_id = event_target_value(&ev));
        set_id_check.set(IdCheck::Unchecked);
    };

    let on_check_id = move |_| {
        let user_id = form.with(|f| f.user_id.clone());
        set_checking.set(true);
        spawn_local(async move {
            match auth.services().auth().check_id(&user_id).await {
                Ok(result) => {
                    set_id_check.set(result);
                    set_field_errors.update(|e| e.remove("userId"));
                }
                Err(e) => {
                    match e.field_errors() {
                        Some(errors) => set_field_errors.set(errors.clone()),
                        None => set_error_msg.set(Some(e.user_message())),
                    }
                    set_id_check.set(IdCheck::Failed);
                }
            }
            set_checking.set(false);
        });
    };

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let current = form.get();
        let check = id_check.get();
        if let Err(e) = current.validate(&check) {
            set_field_errors.set(e.field_errors().cloned().unwrap_or_default());
            return;
        }

        set_field_errors.set(FieldErrors::new());
        set_error_msg.set(None);
        set_is_submitting.set(true);

        spawn_local(async move {
            match auth.services().auth().register(&current, &check).await {
                Ok(_) => router.navigate(&AppRoute::Login.to_path()),
                Err(e) => match e.field_errors() {
                    Some(errors) => set_field_errors.set(errors.clone()),
                    None => set_error_msg.set(Some(e.user_message())),
                },
            }
            set_is_submitting.set(false);
        });
    };

    let id_status = move || match id_check.get() {
        IdCheck::Available => Some(("This ID is available.", "text-success")),
        IdCheck::Taken => Some(("This ID is already taken.", "text-error")),
        IdCheck::Failed | IdCheck::Unchecked => None,
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <h1 class="text-3xl font-bold mb-4">"Sign up"</h1>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <div class="form-control">
                            <label class="label" for="userId">
                                <span class="label-text">"ID"</span>
                            </label>
                            <div class="join w-full">
                                <input
                                    id="userId"
                                    type="text"
                                    on:input=on_user_id
                                    prop:value=move || form.with(|f| f.user_id.clone())
                                    class="input input-bordered join-item flex-1"
                                />
                                <button
                                    type="button"
                                    class="btn join-item"
                                    on:click=on_check_id
                                    disabled=move || checking.get()
                                >
                                    "Check"
                                </button>
                            </div>
                            {move || id_status().map(|(text, class)| view! {
                                <span class=format!("label-text-alt {}", class)>{text}</span>
                            })}
                            <FieldError errors=field_errors field="userId" />
                        </div>

                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                autocomplete="new-password"
                                on:input=move |ev| form.update(|f| f.password = event_target_value(&ev))
                                prop:value=move || form.with(|f| f.password.clone())
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="password" />
                        </div>

                        <div class="form-control">
                            <label class="label" for="confirmPassword">
                                <span class="label-text">"Confirm password"</span>
                            </label>
                            <input
                                id="confirmPassword"
                                type="password"
                                autocomplete="new-password"
                                on:input=move |ev| form.update(|f| f.confirm_password = event_target_value(&ev))
                                prop:value=move || form.with(|f| f.confirm_password.clone())
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="confirmPassword" />
                        </div>

                        <div class="form-control">
                            <label class="label" for="nickname">
                                <span class="label-text">"Nickname"</span>
                            </label>
                            <input
                                id="nickname"
                                type="text"
                                on:input=move |ev| form.update(|f| f.nickname = event_target_value(&ev))
                                prop:value=move || form.with(|f| f.nickname.clone())
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="nickname" />
                        </div>

                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                on:input=move |ev| form.update(|f| f.email = event_target_value(&ev))
                                prop:value=move || form.with(|f| f.email.clone())
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="email" />
                        </div>

                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing up..." }.into_any()
                                } else {
                                    "Sign up".into_any()
                                }}
                            </button>
                        </div>
                        <p class="text-sm text-center mt-2">
                            "Already have an account? "
                            <Link to=AppRoute::Login.to_path() class="link link-primary">"Log in"</Link>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
