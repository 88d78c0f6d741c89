use leptos::prelude::*;
use stroll::PageWindow;

/// 页码条：最多显示 5 个页码，外加上一页/下一页
#[component]
pub fn Pagination(
    #[prop(into)] current: Signal<u32>,
    #[prop(into)] last: Signal<u32>,
    on_select: Callback<u32>,
) -> impl IntoView {
    let window = move || PageWindow::new(current.get(), last.get());

    view! {
        <Show when=move || !window().is_empty()>
            <div class="join mt-8 justify-center w-full">
                <button
                    class="join-item btn btn-sm"
                    disabled=move || !window().has_prev()
                    on:click=move |_| {
                        if let Some(page) = window().prev() {
                            on_select.run(page);
                        }
                    }
                >
                    "«"
                </button>
                {move || {
                    let w = window();
                    let current = w.current;
                    w.pages()
                        .map(|page| {
                            let active = page == current;
                            view! {
                                <button
                                    class=if active { "join-item btn btn-sm btn-active" } else { "join-item btn btn-sm" }
                                    on:click=move |_| on_select.run(page)
                                >
                                    {page}
                                </button>
                            }
                        })
                        .collect_view()
                }}
                <button
                    class="join-item btn btn-sm"
                    disabled=move || !window().has_next()
                    on:click=move |_| {
                        if let Some(page) = window().next() {
                            on_select.run(page);
                        }
                    }
                >
                    "»"
                </button>
            </div>
        </Show>
    }
}
