use leptos::prelude::*;
use stroll::AppRoute;
use stroll::nav::category_href;
use stroll_shared::BROWSE_CATEGORIES;

use crate::web::router::Link;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="hero min-h-[60vh] bg-base-200">
            <div class="hero-content text-center">
                <div class="max-w-xl">
                    <h1 class="text-5xl font-bold">"Go places with your pet"</h1>
                    <p class="py-6 text-base-content/70">
                        "Cafes, parks, pensions and vets that welcome pets, close to where you are."
                    </p>
                    <Link to=AppRoute::Around.to_path() class="btn btn-primary">"Explore around me"</Link>
                </div>
            </div>
        </div>

        <div class="max-w-4xl mx-auto p-8 grid grid-cols-2 md:grid-cols-3 gap-4">
            {BROWSE_CATEGORIES
                .iter()
                .filter(|c| !c.key.is_empty())
                .map(|c| view! {
                    <Link to=category_href(c.key) class="card bg-base-100 shadow hover:shadow-lg">
                        <div class="card-body items-center">
                            <span class="card-title">{c.label}</span>
                        </div>
                    </Link>
                })
                .collect_view()}
        </div>
    }
}
