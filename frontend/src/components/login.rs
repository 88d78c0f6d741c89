use crate::auth::{login, use_auth};
use crate::components::common::FieldError;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use stroll::forms::LoginForm;
use stroll::{AppRoute, FieldErrors};

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();

    let (user_id, set_user_id) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (field_errors, set_field_errors) = signal(FieldErrors::new());
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let form = LoginForm {
            user_id: user_id.get(),
            password: password.get(),
        };
        // 本地校验不通过时不发请求
        if let Err(e) = form.validate() {
            set_field_errors.set(e.field_errors().cloned().unwrap_or_default());
            return;
        }

        set_field_errors.set(FieldErrors::new());
        set_error_msg.set(None);
        set_is_submitting.set(true);

        spawn_local(async move {
            // 成功后路由服务会根据认证状态自动跳转
            if let Err(e) = login(&auth, form).await {
                set_error_msg.set(Some(e.user_message()));
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Log in"</h1>
                    <p class="text-base-content/70">"Find pet-friendly places around you"</p>
                </div>

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
                            <input
                                id="userId"
                                type="text"
                                autocomplete="username"
                                on:input=move |ev| set_user_id.set(event_target_value(&ev))
                                prop:value=user_id
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="userId" />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                autocomplete="current-password"
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                prop:value=password
                                class="input input-bordered"
                            />
                            <FieldError errors=field_errors field="password" />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Logging in..." }.into_any()
                                } else {
                                    "Log in".into_any()
                                }}
                            </button>
                        </div>
                        <p class="text-sm text-center mt-2">
                            "No account yet? "
                            <Link to=AppRoute::Register.to_path() class="link link-primary">"Sign up"</Link>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
