//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 实现 `stroll::HttpClient`。
//! 每个请求都挂一个 `AbortController`：请求 future 被丢弃（被新请求取代）
//! 或超时时会真正中止底层 fetch。

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Uint8Array};
use stroll::request::{FormPart, RequestBody};
use stroll::{HttpRequest, HttpResponse, Result, StrollError};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AbortController, AbortSignal, Blob, BlobPropertyBag, FormData, Headers, Request, RequestInit,
    Response,
};

use super::timer::Timeout;

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

/// future 被丢弃时中止 fetch；正常完成后解除
struct AbortOnDrop {
    controller: AbortController,
    armed: bool,
}

impl AbortOnDrop {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if self.armed {
            debug!("aborting in-flight fetch");
            self.controller.abort();
        }
    }
}

fn form_data(parts: &[FormPart]) -> Result<FormData> {
    let build = |e| StrollError::Network(format!("构建 FormData 失败: {}", js_error(e)));
    let form = FormData::new().map_err(build)?;
    for part in parts {
        match part {
            FormPart::Text { name, value } => form.append_with_str(name, value).map_err(build)?,
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let chunk = Uint8Array::from(bytes.as_slice());
                let bag = BlobPropertyBag::new();
                bag.set_type(content_type);
                let blob = Blob::new_with_u8_array_sequence_and_options(&Array::of1(&chunk), &bag)
                    .map_err(build)?;
                form.append_with_blob_and_filename(name, &blob, file_name)
                    .map_err(build)?;
            }
        }
    }
    Ok(form)
}

fn build_request(req: &HttpRequest, signal: &AbortSignal) -> Result<Request> {
    let build = |e| StrollError::Network(format!("请求构建失败: {}", js_error(e)));

    let headers = Headers::new().map_err(build)?;
    for (key, value) in &req.headers {
        headers.set(key, value).map_err(build)?;
    }

    let opts = RequestInit::new();
    opts.set_method(req.method.as_str());
    opts.set_headers(&headers.into());
    opts.set_signal(Some(signal));

    match &req.body {
        Some(RequestBody::Json(text)) => opts.set_body(&JsValue::from_str(text)),
        // 不设置 Content-Type，由浏览器生成 boundary
        Some(RequestBody::Multipart(parts)) => opts.set_body(&form_data(parts)?.into()),
        None => {}
    }

    Request::new_with_str_and_init(&req.url, &opts).map_err(build)
}

/// 基于 fetch 的 HTTP 客户端
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchClient;

#[async_trait(?Send)]
impl stroll::HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let window =
            web_sys::window().ok_or_else(|| StrollError::Network("无法获取 window 对象".into()))?;
        let controller = AbortController::new()
            .map_err(|e| StrollError::Network(format!("创建 AbortController 失败: {}", js_error(e))))?;
        let request = build_request(&req, &controller.signal())?;

        let mut guard = AbortOnDrop {
            controller: controller.clone(),
            armed: true,
        };

        let timed_out = Rc::new(Cell::new(false));
        let _timer = req.timeout.and_then(|timeout| {
            let flag = timed_out.clone();
            let controller = controller.clone();
            Timeout::new(timeout.as_millis() as u32, move || {
                flag.set(true);
                controller.abort();
            })
        });
        let failure = |e: JsValue| {
            if timed_out.get() {
                StrollError::Timeout
            } else {
                StrollError::Network(js_error(e))
            }
        };

        let result = async {
            let value = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(&failure)?;
            let response: Response = value
                .dyn_into()
                .map_err(|e| StrollError::Decode(format!("Response 类型转换失败: {}", js_error(e))))?;
            let promise = response.text().map_err(&failure)?;
            let text = JsFuture::from(promise).await.map_err(&failure)?;
            Ok::<_, StrollError>(HttpResponse {
                status: response.status(),
                body: text.as_string().unwrap_or_default(),
            })
        }
        .await;

        guard.disarm();
        result
    }
}
