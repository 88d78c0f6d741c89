use leptos::prelude::*;
use stroll::AppRoute;

use crate::auth::{logout, use_auth};
use crate::web::router::Link;

#[component]
pub fn MyPage() -> impl IntoView {
    let auth = use_auth();
    let user = move || auth.state.with(|s| s.user.clone());

    view! {
        <div class="max-w-xl mx-auto p-4 md:p-8">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h1 class="card-title text-2xl">"My page"</h1>
                    {move || user().map(|u| view! {
                        <dl class="grid grid-cols-3 gap-2 mt-4">
                            <dt class="font-semibold">"ID"</dt>
                            <dd class="col-span-2">{u.id}</dd>
                            <dt class="font-semibold">"Nickname"</dt>
                            <dd class="col-span-2">{u.display_name}</dd>
                            <dt class="font-semibold">"Email"</dt>
                            <dd class="col-span-2">{u.email.unwrap_or_else(|| "-".to_string())}</dd>
                        </dl>
                    })}
                    <div class="card-actions justify-end mt-6">
                        <Link to=AppRoute::NewPlace.to_path() class="btn btn-primary">"Add a place"</Link>
                        <button class="btn btn-outline btn-error" on:click=move |_| logout(&auth)>"Log out"</button>
                    </div>
                </div>
            </div>
        </div>
    }
}
