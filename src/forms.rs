//! 表单校验
//!
//! 所有校验都在发起请求之前完成，错误按字段名（与接口字段一致）汇总到 `FieldErrors`。

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FieldErrors, Result};
use crate::request::FormPart;
use stroll_shared::{LoginRequest, PLACE_CATEGORIES, RegisterRequest};

static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{4,20}$").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub const MIN_LOGIN_PASSWORD_LEN: usize = 4;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// =========================================================
// 登录
// =========================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub user_id: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.user_id.trim().is_empty() {
            errors.insert("userId", "Please enter your ID.");
        }
        if self.password.is_empty() {
            errors.insert("password", "Please enter your password.");
        } else if char_len(&self.password) < MIN_LOGIN_PASSWORD_LEN {
            errors.insert("password", "Password must be at least 4 characters.");
        }
        errors.into_result()
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            user_id: self.user_id.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

// =========================================================
// 注册
// =========================================================

/// ID 重复检查的状态；ID 输入变化后回到 `Unchecked`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdCheck {
    #[default]
    Unchecked,
    Available,
    Taken,
    /// 检查请求失败
    Failed,
}

/// ID 格式错误时返回提示
pub fn user_id_format_error(user_id: &str) -> Option<&'static str> {
    if user_id.is_empty() {
        Some("Please enter an ID.")
    } else if !USER_ID_RE.is_match(user_id) {
        Some("ID must be 4-20 letters, digits or underscores.")
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub user_id: String,
    pub password: String,
    pub confirm_password: String,
    pub nickname: String,
    pub email: String,
}

impl RegisterForm {
    pub fn validate(&self, id_check: &IdCheck) -> Result<()> {
        let mut errors = FieldErrors::new();

        if let Some(msg) = user_id_format_error(&self.user_id) {
            errors.insert("userId", msg);
        } else {
            match id_check {
                IdCheck::Available => {}
                IdCheck::Taken => errors.insert("userId", "This ID is already taken."),
                IdCheck::Unchecked | IdCheck::Failed => {
                    errors.insert("userId", "Please check whether the ID is available.")
                }
            }
        }

        // regex crate 不支持先行断言，字母与数字分开检查
        if self.password.is_empty() {
            errors.insert("password", "Please enter a password.");
        } else if char_len(&self.password) < MIN_PASSWORD_LEN {
            errors.insert("password", "Password must be at least 8 characters.");
        } else if !self.password.chars().any(|c| c.is_ascii_alphabetic())
            || !self.password.chars().any(|c| c.is_ascii_digit())
        {
            errors.insert("password", "Password must contain letters and digits.");
        }

        if self.confirm_password.is_empty() {
            errors.insert("confirmPassword", "Please confirm your password.");
        } else if self.confirm_password != self.password {
            errors.insert("confirmPassword", "Passwords do not match.");
        }

        let nickname = self.nickname.trim();
        if nickname.is_empty() {
            errors.insert("nickname", "Please enter a nickname.");
        } else if !(2..=10).contains(&char_len(nickname)) {
            errors.insert("nickname", "Nickname must be 2-10 characters.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "Please enter an email.");
        } else if !EMAIL_RE.is_match(email) {
            errors.insert("email", "Please enter a valid email address.");
        }

        errors.into_result()
    }

    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            user_id: self.user_id.clone(),
            password: self.password.clone(),
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

// =========================================================
// 新建地点
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 检查待上传的图片：数量、类型与大小
pub fn check_images(images: &[ImageFile]) -> Result<()> {
    let mut errors = FieldErrors::new();
    if images.is_empty() {
        errors.insert("imgs", "Please upload at least one image.");
    } else if images.len() > MAX_IMAGES {
        errors.insert("imgs", "You can upload up to 5 images.");
    } else if let Some(bad) = images
        .iter()
        .find(|f| !ALLOWED_IMAGE_TYPES.contains(&f.content_type.as_str()))
    {
        errors.insert(
            "imgs",
            format!("{}: only JPEG, PNG, GIF and WEBP images are allowed.", bad.name),
        );
    } else if let Some(big) = images.iter().find(|f| f.bytes.len() > MAX_IMAGE_BYTES) {
        errors.insert("imgs", format!("{}: images must be 5MB or smaller.", big.name));
    }
    errors.into_result()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlaceForm {
    pub place_name: String,
    pub address: String,
    pub detail_address: String,
    pub content: String,
    pub category: String,
    pub images: Vec<ImageFile>,
}

impl NewPlaceForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();

        let name = self.place_name.trim();
        if name.is_empty() {
            errors.insert("placeName", "Please enter the place name.");
        } else if char_len(name) > 100 {
            errors.insert("placeName", "Place name must be 100 characters or fewer.");
        }

        let address = self.address.trim();
        if address.is_empty() {
            errors.insert("address", "Please enter the address.");
        } else if char_len(address) > 200 {
            errors.insert("address", "Address must be 200 characters or fewer.");
        }

        if char_len(self.detail_address.trim()) > 100 {
            errors.insert(
                "detailAddress",
                "Detail address must be 100 characters or fewer.",
            );
        }

        let content = self.content.trim();
        if content.is_empty() {
            errors.insert("content", "Please describe the place.");
        } else if char_len(content) < 10 {
            errors.insert("content", "Description must be at least 10 characters.");
        } else if char_len(content) > 1000 {
            errors.insert("content", "Description must be 1000 characters or fewer.");
        }

        if !PLACE_CATEGORIES.iter().any(|c| c.key == self.category) {
            errors.insert("category", "Please choose a category.");
        }

        if let Err(e) = check_images(&self.images) {
            if let Some(msg) = e.field_errors().and_then(|f| f.get("imgs")) {
                errors.insert("imgs", msg);
            }
        }

        errors.into_result()
    }

    /// `POST /api/place` 的 multipart 表单
    pub fn into_parts(self) -> Vec<FormPart> {
        let text = |name: &str, value: &str| FormPart::Text {
            name: name.to_string(),
            value: value.trim().to_string(),
        };
        let mut parts = vec![
            text("placeName", &self.place_name),
            text("address", &self.address),
            text("detailAddress", &self.detail_address),
            text("content", &self.content),
            text("category", &self.category),
        ];
        parts.extend(self.images.into_iter().map(|img| FormPart::File {
            name: "imgs".to_string(),
            file_name: img.name,
            content_type: img.content_type,
            bytes: img.bytes,
        }));
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(result: Result<()>) -> FieldErrors {
        result.unwrap_err().field_errors().cloned().unwrap()
    }

    #[test]
    fn short_login_password_is_a_field_error() {
        let form = LoginForm {
            user_id: "abc".into(),
            password: "x".into(),
        };
        let errors = field_errors(form.validate());
        assert!(errors.get("password").is_some());
        assert!(errors.get("userId").is_none());

        let ok = LoginForm {
            user_id: " abc ".into(),
            password: "abcd".into(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.to_request().user_id, "abc");
    }

    fn valid_registration() -> RegisterForm {
        RegisterForm {
            user_id: "walker_01".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
            nickname: "Walker".into(),
            email: "walker@example.com".into(),
        }
    }

    #[test]
    fn registration_needs_an_available_id() {
        let form = valid_registration();
        assert!(form.validate(&IdCheck::Available).is_ok());

        for check in [IdCheck::Taken, IdCheck::Unchecked, IdCheck::Failed] {
            let errors = field_errors(form.validate(&check));
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["userId"]);
        }
    }

    #[test]
    fn registration_field_rules() {
        let form = RegisterForm {
            user_id: "ab".into(),
            password: "onlyletters".into(),
            confirm_password: "different".into(),
            nickname: "W".into(),
            email: "not-an-email".into(),
        };
        let errors = field_errors(form.validate(&IdCheck::Available));
        assert!(errors.get("userId").unwrap().contains("4-20"));
        assert!(errors.get("password").unwrap().contains("letters and digits"));
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match."));
        assert!(errors.get("nickname").is_some());
        assert!(errors.get("email").is_some());

        let mut short = valid_registration();
        short.password = "a1".into();
        short.confirm_password = "a1".into();
        let errors = field_errors(short.validate(&IdCheck::Available));
        assert!(errors.get("password").unwrap().contains("8"));
    }

    #[test]
    fn user_id_format() {
        assert!(user_id_format_error("walker_01").is_none());
        assert!(user_id_format_error("").is_some());
        assert!(user_id_format_error("abc").is_some());
        assert!(user_id_format_error("has space").is_some());
        assert!(user_id_format_error(&"a".repeat(21)).is_some());
    }

    fn image(name: &str, content_type: &str, size: usize) -> ImageFile {
        ImageFile {
            name: name.into(),
            content_type: content_type.into(),
            bytes: vec![0; size],
        }
    }

    fn valid_place() -> NewPlaceForm {
        NewPlaceForm {
            place_name: "Han River Dog Park".into(),
            address: "Seoul Mapo-gu".into(),
            detail_address: String::new(),
            content: "Large off-leash area by the river.".into(),
            category: "playground".into(),
            images: vec![image("a.jpg", "image/jpeg", 10)],
        }
    }

    #[test]
    fn new_place_rules() {
        assert!(valid_place().validate().is_ok());

        let form = NewPlaceForm {
            place_name: "x".repeat(101),
            address: String::new(),
            detail_address: "d".repeat(101),
            content: "short".into(),
            category: "pension".into(),
            images: vec![],
        };
        let errors = field_errors(form.validate());
        for field in ["placeName", "address", "detailAddress", "content", "category", "imgs"] {
            assert!(errors.get(field).is_some(), "missing error for {}", field);
        }
    }

    #[test]
    fn image_checks() {
        assert!(check_images(&[image("a.png", "image/png", MAX_IMAGE_BYTES)]).is_ok());

        let too_many: Vec<_> = (0..6).map(|i| image(&format!("{}.gif", i), "image/gif", 1)).collect();
        assert!(check_images(&too_many).is_err());

        let errors = field_errors(check_images(&[image("doc.pdf", "application/pdf", 1)]));
        assert!(errors.get("imgs").unwrap().starts_with("doc.pdf"));

        let errors = field_errors(check_images(&[image("huge.webp", "image/webp", MAX_IMAGE_BYTES + 1)]));
        assert!(errors.get("imgs").unwrap().contains("5MB"));
    }

    #[test]
    fn multipart_layout() {
        let parts = valid_place().into_parts();
        let names: Vec<_> = parts
            .iter()
            .map(|p| match p {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => name.as_str(),
            })
            .collect();
        assert_eq!(
            names,
            vec!["placeName", "address", "detailAddress", "content", "category", "imgs"]
        );
    }
}
