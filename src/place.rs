//! 地点详情页控制器

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::StrollApi;
use crate::error::{FieldErrors, Result, StrollError};
use crate::request::HttpClient;
use crate::session::{KeyValueStore, SessionStore};
use stroll_shared::{CreateReviewRequest, MAX_STAR, PlaceDetail, Review};

const DEFAULT_REVIEW_STAR: u8 = 3;

/// 破坏性操作前向用户确认
#[async_trait(?Send)]
pub trait Confirm {
    async fn confirm(&self, message: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub star: u8,
    pub content: String,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            star: DEFAULT_REVIEW_STAR,
            content: String::new(),
        }
    }
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.content.trim().is_empty() {
            errors.insert("content", "Please write a review.");
        }
        if !(1..=MAX_STAR).contains(&self.star) {
            errors.insert("star", "Rating must be between 1 and 5.");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceViewState {
    pub place: Option<PlaceDetail>,
    pub reviews: Vec<Review>,
    pub loading: bool,
    pub error: Option<String>,
    /// 操作结果提示
    pub notice: Option<String>,
    pub draft: ReviewDraft,
    pub selected_image: usize,
}

impl PlaceViewState {
    /// 当前展示的大图
    pub fn image_src(&self) -> Option<String> {
        let place = self.place.as_ref()?;
        Some(
            place
                .images
                .get(self.selected_image)
                .cloned()
                .unwrap_or_else(|| place.cover_image()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// 用户取消
    Cancelled,
    /// 当前用户不是作者/所有者
    NotAllowed,
    Failed,
}

type Listener = Box<dyn Fn(&PlaceViewState)>;

struct PlaceInner<C, S> {
    api: StrollApi<C>,
    sessions: Rc<SessionStore<S>>,
    state: RefCell<PlaceViewState>,
    place_no: Cell<Option<u64>>,
    listener: RefCell<Option<Listener>>,
}

pub struct PlaceController<C, S> {
    inner: Rc<PlaceInner<C, S>>,
}

impl<C, S> Clone for PlaceController<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: HttpClient, S: KeyValueStore> PlaceController<C, S> {
    pub fn new(api: StrollApi<C>, sessions: Rc<SessionStore<S>>) -> Self {
        Self {
            inner: Rc::new(PlaceInner {
                api,
                sessions,
                state: RefCell::new(PlaceViewState::default()),
                place_no: Cell::new(None),
                listener: RefCell::new(None),
            }),
        }
    }

    pub fn on_change(&self, f: impl Fn(&PlaceViewState) + 'static) {
        *self.inner.listener.borrow_mut() = Some(Box::new(f));
    }

    pub fn state(&self) -> PlaceViewState {
        self.inner.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut PlaceViewState)) {
        f(&mut self.inner.state.borrow_mut());
        let snapshot = self.state();
        if let Some(listener) = self.inner.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }

    fn is_current(&self, place_no: u64) -> bool {
        self.inner.place_no.get() == Some(place_no)
    }

    /// 加载详情；响应未内嵌评论时单独请求评论列表
    ///
    /// 切换到其他地点后才返回的结果会被丢弃。
    pub async fn load(&self, place_no: u64) -> Result<()> {
        self.inner.place_no.set(Some(place_no));
        self.update(|s| {
            *s = PlaceViewState {
                loading: true,
                ..PlaceViewState::default()
            }
        });

        let detail = match self.inner.api.place_detail(place_no).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(place_no, error = %e, "failed to load place");
                if self.is_current(place_no) {
                    let message = e.user_message();
                    self.update(|s| {
                        s.loading = false;
                        s.error = Some(message);
                    });
                }
                return Err(e);
            }
        };
        if !self.is_current(place_no) {
            debug!(place_no, "dropping detail for a place no longer shown");
            return Ok(());
        }

        let embedded = detail.replies.is_some();
        self.update(|s| {
            s.place = Some(detail.place);
            s.reviews = detail.replies.unwrap_or_default();
            s.loading = false;
        });
        if !embedded {
            self.refresh_reviews().await;
        }
        Ok(())
    }

    /// 重新拉取评论列表；失败时保留旧列表
    pub async fn refresh_reviews(&self) {
        let Some(place_no) = self.inner.place_no.get() else {
            return;
        };
        match self.inner.api.place_reviews(place_no).await {
            Ok(reviews) if self.is_current(place_no) => self.update(|s| s.reviews = reviews),
            Ok(_) => {}
            Err(e) => warn!(place_no, error = %e, "failed to load reviews"),
        }
    }

    /// 每次都重新读取会话，不缓存
    pub fn current_user_id(&self) -> Option<String> {
        self.inner.sessions.current_user_id()
    }

    pub fn can_delete_review(&self, review: &Review) -> bool {
        self.current_user_id()
            .is_some_and(|id| review.is_written_by(&id))
    }

    pub fn can_delete_place(&self) -> bool {
        let state = self.inner.state.borrow();
        match (self.current_user_id(), state.place.as_ref()) {
            (Some(id), Some(place)) => !place.owner_id.is_empty() && place.owner_id == id,
            _ => false,
        }
    }

    pub fn select_image(&self, index: usize) {
        self.update(|s| {
            let count = s.place.as_ref().map_or(0, |p| p.images.len());
            if index < count {
                s.selected_image = index;
            }
        });
    }

    /// 收藏开关：只有服务端返回 2xx 后才翻转本地状态
    pub async fn toggle_wish(&self) -> Result<()> {
        let Some(place_no) = self.inner.place_no.get() else {
            return Ok(());
        };
        match self.inner.api.toggle_wish(place_no).await {
            Ok(()) => {
                if self.is_current(place_no) {
                    self.update(|s| {
                        if let Some(place) = s.place.as_mut() {
                            place.wished = !place.wished;
                        }
                    });
                }
                Ok(())
            }
            Err(e) => {
                warn!(place_no, error = %e, "wish toggle failed");
                Err(e)
            }
        }
    }

    /// 取走操作提示，视图展示后即清除
    pub fn take_notice(&self) -> Option<String> {
        let notice = self.inner.state.borrow().notice.clone()?;
        self.update(|s| s.notice = None);
        Some(notice)
    }

    pub fn edit_review(&self, star: u8, content: &str) {
        let content = content.to_string();
        self.update(|s| s.draft = ReviewDraft { star, content });
    }

    /// 提交评论，成功后清空草稿并重新拉取评论列表
    pub async fn submit_review(&self) -> Result<()> {
        let Some(place_no) = self.inner.place_no.get() else {
            return Ok(());
        };
        let draft = self.inner.state.borrow().draft.clone();
        draft.validate()?;

        let request = CreateReviewRequest {
            place_no,
            star: draft.star,
            content: draft.content.trim().to_string(),
        };
        if let Err(e) = self.inner.api.create_review(&request).await {
            warn!(place_no, error = %e, "review submission failed");
            let message = e.user_message();
            self.update(|s| s.notice = Some(message));
            return Err(e);
        }
        info!(place_no, "review created");
        self.update(|s| {
            s.draft = ReviewDraft::default();
            s.notice = Some("Your review has been posted.".to_string());
        });
        self.refresh_reviews().await;
        Ok(())
    }

    pub async fn delete_review<F: Confirm + ?Sized>(&self, review: &Review, confirm: &F) -> DeleteOutcome {
        let Some(place_no) = self.inner.place_no.get() else {
            return DeleteOutcome::Failed;
        };
        if !self.can_delete_review(review) {
            return DeleteOutcome::NotAllowed;
        }
        if !confirm.confirm("Delete this review?").await {
            return DeleteOutcome::Cancelled;
        }
        match self.inner.api.delete_review(place_no, &review.author_id).await {
            Ok(()) => {
                self.update(|s| s.notice = Some("The review has been deleted.".to_string()));
                self.refresh_reviews().await;
                DeleteOutcome::Deleted
            }
            Err(e) => self.delete_failed(place_no, e),
        }
    }

    /// 删除地点；成功后由视图返回浏览页
    pub async fn delete_place<F: Confirm + ?Sized>(&self, confirm: &F) -> DeleteOutcome {
        let Some(place_no) = self.inner.place_no.get() else {
            return DeleteOutcome::Failed;
        };
        if !self.can_delete_place() {
            return DeleteOutcome::NotAllowed;
        }
        if !confirm.confirm("Delete this place?").await {
            return DeleteOutcome::Cancelled;
        }
        match self.inner.api.delete_place(place_no).await {
            Ok(()) => {
                info!(place_no, "place deleted");
                DeleteOutcome::Deleted
            }
            Err(e) => self.delete_failed(place_no, e),
        }
    }

    fn delete_failed(&self, place_no: u64, e: StrollError) -> DeleteOutcome {
        warn!(place_no, error = %e, "delete failed");
        let message = e.user_message();
        self.update(|s| s.notice = Some(message));
        DeleteOutcome::Failed
    }
}
