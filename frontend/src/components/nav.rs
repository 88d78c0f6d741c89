//! 顶部导航栏

use leptos::prelude::*;
use stroll::AppRoute;
use stroll::nav::NavState;

use crate::auth::{logout, use_auth};
use crate::web::router::{Link, use_router};

#[component]
pub fn NavBar() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let nav = RwSignal::new(NavState::default());

    // 页面滚动后导航栏加阴影
    let _scroll = window_event_listener(leptos::ev::scroll, move |_| {
        let y = window().scroll_y().unwrap_or(0.0);
        if (y > 0.0) != nav.with_untracked(|n| n.scrolled) {
            nav.update(|n| n.on_scroll(y));
        }
    });

    let on_search_key = move |ev: leptos::web_sys::KeyboardEvent| {
        match ev.key().as_str() {
            "Enter" => {
                ev.prevent_default();
                if let Some(href) = nav.try_update(|n| n.submit_search()).flatten() {
                    router.navigate(&href);
                }
            }
            "Escape" => nav.update(|n| n.close_search()),
            _ => {}
        }
    };

    let on_logout = move |_| logout(&auth);

    view! {
        <div class=move || {
            if nav.with(|n| n.scrolled) {
                "navbar sticky top-0 z-40 bg-base-100 shadow-md"
            } else {
                "navbar sticky top-0 z-40 bg-base-100"
            }
        }>
            <div class="flex-1 gap-2">
                <Link to=AppRoute::Home.to_path() class="btn btn-ghost text-xl">"Stroll"</Link>
                <Link to=AppRoute::Around.to_path() class="btn btn-ghost btn-sm">"Around me"</Link>
            </div>
            <div class="flex-none gap-2">
                <Show
                    when=move || nav.with(|n| n.search_open)
                    fallback=move || view! {
                        <button class="btn btn-ghost btn-circle" on:click=move |_| nav.update(|n| n.open_search())>
                            "🔍"
                        </button>
                    }
                >
                    <input
                        type="search"
                        class="input input-bordered input-sm w-48 md:w-64"
                        placeholder="Search places"
                        autofocus=true
                        prop:value=move || nav.with(|n| n.search_text.clone())
                        on:input=move |ev| nav.update(|n| n.search_text = event_target_value(&ev))
                        on:keydown=on_search_key
                        on:blur=move |_| nav.update(|n| n.close_search())
                    />
                </Show>

                <Show
                    when=move || auth.state.with(|s| s.is_authenticated)
                    fallback=|| view! {
                        <Link to=AppRoute::Login.to_path() class="btn btn-primary btn-sm">"Log in"</Link>
                    }
                >
                    <Link to=AppRoute::NewPlace.to_path() class="btn btn-ghost btn-sm">"Add place"</Link>
                    <Link to=AppRoute::MyPage.to_path() class="btn btn-ghost btn-sm">
                        {move || auth.state.with(|s| s.user.as_ref().map(|u| u.display_name.clone()).unwrap_or_default())}
                    </Link>
                    <button class="btn btn-outline btn-sm" on:click=on_logout>"Log out"</button>
                </Show>
            </div>
        </div>
    }
}
