//! 页面间共用的小组件

use leptos::prelude::*;
use stroll::FieldErrors;
use stroll_shared::MAX_STAR;

/// 表单字段下方的错误提示
#[component]
pub fn FieldError(errors: ReadSignal<FieldErrors>, field: &'static str) -> impl IntoView {
    let message = move || errors.with(|e| e.get(field).map(str::to_string));
    view! {
        <Show when=move || message().is_some()>
            <span class="label-text-alt text-error">{move || message().unwrap_or_default()}</span>
        </Show>
    }
}

/// 顶部提示框，3 秒后自动消失
#[component]
pub fn Toast(notice: RwSignal<Option<(String, bool)>>) -> impl IntoView {
    Effect::new(move |_| {
        if notice.get().is_some() {
            set_timeout(move || notice.set(None), std::time::Duration::from_secs(3));
        }
    });

    view! {
        <Show when=move || notice.get().is_some()>
            <div class="toast toast-top toast-end z-50">
                <div class=move || {
                    let is_err = notice.get().map(|(_, e)| e).unwrap_or(false);
                    if is_err { "alert alert-error shadow-lg" } else { "alert alert-success shadow-lg" }
                }>
                    <span>{move || notice.get().map(|(m, _)| m).unwrap_or_default()}</span>
                </div>
            </div>
        </Show>
    }
}

/// 只读星级
#[component]
pub fn Stars(#[prop(into)] value: f64) -> impl IntoView {
    let filled = value.round().clamp(0.0, MAX_STAR as f64) as usize;
    let text = format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_STAR as usize - filled)
    );
    view! {
        <span class="text-warning" title=format!("{:.1}", value)>{text}</span>
    }
}

/// 加载中
#[component]
pub fn Spinner() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center py-12">
            <span class="loading loading-spinner loading-lg text-primary"></span>
        </div>
    }
}
