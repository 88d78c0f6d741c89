use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;
mod serde_helper;

pub use date::{Timestamp, format_date};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const PLACEHOLDER_IMAGE: &str = "/images/180x240_placeholder.jpg";

/// 浏览页每页最多显示的页码按钮数
pub const PAGE_WINDOW_SIZE: u32 = 5;

/// 距离滑块的取值范围（单位：100 米）
pub const MIN_DISTANCE_UNIT: u32 = 1;
pub const MAX_DISTANCE_UNIT: u32 = 50;
pub const METERS_PER_DISTANCE_UNIT: u32 = 100;

/// 星级筛选与评分的取值范围
pub const MAX_STAR: u8 = 5;

// =========================================================
// 分类 (Categories)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub key: &'static str,
    pub label: &'static str,
}

/// 浏览页的分类筛选，空 key 表示全部
pub const BROWSE_CATEGORIES: &[Category] = &[
    Category { key: "", label: "All" },
    Category { key: "pension", label: "Pension" },
    Category { key: "cafe", label: "Cafe" },
    Category { key: "grooming", label: "Grooming" },
    Category { key: "hospital", label: "Animal hospital" },
    Category { key: "playground", label: "Playground" },
    Category { key: "kindergarden", label: "Kindergarten" },
];

/// 新建地点时可选的分类
pub const PLACE_CATEGORIES: &[Category] = &[
    Category { key: "restaurant", label: "Restaurant" },
    Category { key: "cafe", label: "Cafe" },
    Category { key: "hospital", label: "Hospital" },
    Category { key: "playground", label: "Playground" },
    Category { key: "kindergarten", label: "Kindergarten" },
    Category { key: "inn", label: "Inn" },
];

pub fn category_label(key: &str) -> Option<&'static str> {
    BROWSE_CATEGORIES
        .iter()
        .chain(PLACE_CATEGORIES)
        .find(|c| c.key == key)
        .map(|c| c.label)
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 地理坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// 地址解析失败时显示的坐标文本
    pub fn display_fallback(&self) -> String {
        format!("lat {:.4}, lng {:.4}", self.lat, self.lng)
    }
}

/// 地点选择器返回的结果，仅在调用方之间瞬时传递，不做持久化
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSelection {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl LocationSelection {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    Distance,
    Star,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Distance => "distance",
            OrderBy::Star => "star",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "distance" => Some(OrderBy::Distance),
            "star" => Some(OrderBy::Star),
            _ => None,
        }
    }
}

/// 用户资料，登录成功后与 token 一同保存在本地存储中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId", alias = "id", deserialize_with = "serde_helper::id_string")]
    pub id: String,
    #[serde(rename = "nickname", alias = "displayName", default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// 搜索结果中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    #[serde(rename = "placeId", alias = "no", alias = "placeNo")]
    pub place_id: u64,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(rename = "starRating", alias = "star", default)]
    pub star_rating: f64,
    #[serde(rename = "distanceMeters", alias = "distance", default)]
    pub distance_meters: Option<f64>,
    #[serde(rename = "guAddress", default, deserialize_with = "serde_helper::null_as_empty")]
    pub district_address: String,
    #[serde(rename = "afterGuAddress", default, deserialize_with = "serde_helper::null_as_empty")]
    pub street_address: String,
    #[serde(rename = "detailAddress", default, deserialize_with = "serde_helper::null_as_empty")]
    pub detail_address: String,
}

impl PlaceSummary {
    pub fn full_address(&self) -> String {
        [
            self.district_address.as_str(),
            self.street_address.as_str(),
            self.detail_address.as_str(),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn thumbnail(&self) -> String {
        format!("/images/{}_1.jpg", self.place_id)
    }
}

/// `GET /api/places` 的响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePage {
    pub places: Vec<PlaceSummary>,
    #[serde(rename = "lastPage")]
    pub last_page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    #[serde(rename = "placeNo", alias = "placeId")]
    pub place_id: u64,
    pub name: String,
    #[serde(rename = "star", alias = "starRating", default)]
    pub star_rating: f64,
    #[serde(rename = "distance", alias = "distanceMeters", default)]
    pub distance_meters: Option<f64>,
    #[serde(rename = "content", alias = "description", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(
        rename = "userId",
        alias = "ownerId",
        default,
        deserialize_with = "serde_helper::id_string"
    )]
    pub owner_id: String,
    #[serde(rename = "imgs", alias = "images", default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub wished: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl PlaceDetail {
    /// 详情页首先展示的图片
    pub fn cover_image(&self) -> String {
        self.images
            .first()
            .cloned()
            .unwrap_or_else(|| format!("/images/{}_1.jpg", self.place_id))
    }
}

/// `GET /api/place/{placeNo}` 的响应：详情 + 可选的内嵌评论与当前用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetailResponse {
    #[serde(flatten)]
    pub place: PlaceDetail,
    #[serde(default)]
    pub replies: Option<Vec<Review>>,
    #[serde(
        rename = "currentUserId",
        default,
        deserialize_with = "serde_helper::opt_id_string"
    )]
    pub current_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(
        rename = "userId",
        alias = "authorId",
        deserialize_with = "serde_helper::id_string"
    )]
    pub author_id: String,
    #[serde(rename = "userNickname", alias = "authorName", default)]
    pub author_name: String,
    pub content: String,
    #[serde(rename = "star", alias = "starRating", deserialize_with = "serde_helper::star_u8")]
    pub star_rating: u8,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Review {
    pub fn is_written_by(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.author_id == user_id
    }
}

/// 评论列表接口可能直接返回数组，也可能包一层 `{ reviews: [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReviewsPayload {
    List(Vec<Review>),
    Wrapped { reviews: Vec<Review> },
}

impl ReviewsPayload {
    pub fn into_reviews(self) -> Vec<Review> {
        match self {
            ReviewsPayload::List(list) => list,
            ReviewsPayload::Wrapped { reviews } => reviews,
        }
    }
}

// =========================================================
// 请求/响应体 (Wire DTOs)
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdAvailability {
    pub available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(rename = "placeNo")]
    pub place_no: u64,
    pub star: u8,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaceResponse {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "placeNo", default)]
    pub place_no: Option<u64>,
}

/// 错误响应中常见的 `{ message }` 结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_summary_accepts_legacy_field_names() {
        let json = r#"{
            "no": 7, "title": "Dog Cafe", "guAddress": "Gangnam-gu",
            "afterGuAddress": "Teheran-ro 1", "detailAddress": null,
            "star": 4.5, "distance": 320
        }"#;
        let place: PlaceSummary = serde_json::from_str(json).unwrap();
        assert_eq!(place.place_id, 7);
        assert_eq!(place.name, "Dog Cafe");
        assert_eq!(place.distance_meters, Some(320.0));
        assert_eq!(place.full_address(), "Gangnam-gu Teheran-ro 1");
        assert_eq!(place.thumbnail(), "/images/7_1.jpg");
    }

    #[test]
    fn place_summary_without_distance() {
        let json = r#"{"placeId": 3, "name": "Park", "starRating": 3.0}"#;
        let place: PlaceSummary = serde_json::from_str(json).unwrap();
        assert_eq!(place.distance_meters, None);
        assert_eq!(place.full_address(), "");
    }

    #[test]
    fn detail_response_flattens_and_normalizes_ids() {
        let json = r#"{
            "placeNo": 12, "name": "Vet", "content": null, "address": "Seoul",
            "userId": "owner1", "star": 4, "wished": true,
            "imgs": ["/a.jpg", "/b.jpg"],
            "replies": [{"userId": 5, "userNickname": "kim", "content": "good", "star": 5, "createdAt": "2024-01-15T14:30:00Z"}],
            "currentUserId": 5
        }"#;
        let resp: PlaceDetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.place.place_id, 12);
        assert_eq!(resp.place.owner_id, "owner1");
        assert!(resp.place.description.is_none());
        assert_eq!(resp.place.cover_image(), "/a.jpg");
        assert_eq!(resp.current_user_id.as_deref(), Some("5"));
        let replies = resp.replies.unwrap();
        assert_eq!(replies[0].author_id, "5");
        assert!(replies[0].is_written_by("5"));
        assert!(!replies[0].is_written_by(""));
    }

    #[test]
    fn reviews_payload_both_shapes() {
        let list: ReviewsPayload = serde_json::from_str(
            r#"[{"userId": 1, "content": "x", "star": 3, "createdAt": "2024-01-01"}]"#,
        )
        .unwrap();
        assert_eq!(list.into_reviews().len(), 1);

        let wrapped: ReviewsPayload = serde_json::from_str(r#"{"reviews": []}"#).unwrap();
        assert!(wrapped.into_reviews().is_empty());
    }

    #[test]
    fn review_star_accepts_float_and_text() {
        let reviews = serde_json::from_str::<ReviewsPayload>(
            r#"[
                {"userId": 1, "content": "a", "star": 4.0, "createdAt": "2024-01-01"},
                {"userId": 2, "content": "b", "star": "3", "createdAt": "2024-01-01"},
                {"userId": 3, "content": "c", "starRating": 4.6, "createdAt": "2024-01-01"}
            ]"#,
        )
        .unwrap()
        .into_reviews();
        let stars: Vec<u8> = reviews.iter().map(|r| r.star_rating).collect();
        assert_eq!(stars, vec![4, 3, 5]);

        // 内嵌评论的星级是浮点数时，详情本身仍能加载
        let json = r#"{
            "placeNo": 1, "name": "Park", "address": "Seoul", "userId": "owner1",
            "replies": [{"userId": 5, "content": "ok", "star": 2.0, "createdAt": "2024-01-15"}]
        }"#;
        let resp: PlaceDetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.replies.unwrap()[0].star_rating, 2);

        let bad = r#"[{"userId": 1, "content": "a", "star": "many", "createdAt": "2024-01-01"}]"#;
        assert!(serde_json::from_str::<ReviewsPayload>(bad).is_err());
    }

    #[test]
    fn user_profile_wire_names() {
        let user: UserProfile =
            serde_json::from_str(r#"{"userId": "abcd", "nickname": "Walker"}"#).unwrap();
        assert_eq!(user.display_name, "Walker");
        assert_eq!(user.email, None);

        let back = serde_json::to_string(&user).unwrap();
        assert_eq!(back, r#"{"userId":"abcd","nickname":"Walker"}"#);
    }

    #[test]
    fn order_by_round_trip() {
        for order in [OrderBy::Distance, OrderBy::Star] {
            assert_eq!(OrderBy::parse(order.as_str()), Some(order));
        }
        assert_eq!(OrderBy::parse("rating"), None);
    }

    #[test]
    fn coordinate_fallback_text() {
        let c = Coordinates::new(37.56651, 126.978);
        assert_eq!(c.display_fallback(), "lat 37.5665, lng 126.9780");
    }

    #[test]
    fn labels_cover_both_tables() {
        assert_eq!(category_label(""), Some("All"));
        assert_eq!(category_label("inn"), Some("Inn"));
        assert_eq!(category_label("zoo"), None);
    }
}
