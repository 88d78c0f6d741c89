//! 浏览器原生确认框

use async_trait::async_trait;
use stroll::Confirm;

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserConfirm;

#[async_trait(?Send)]
impl Confirm for BrowserConfirm {
    async fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}
