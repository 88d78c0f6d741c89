//! 浏览页查询参数
//!
//! URL 查询串是搜索状态的唯一来源；`SearchQuery` 是从中派生出的缓存。
//! 解析对缺失或非法字段回退到默认值，超出范围的数值被截断到合法区间。

use url::form_urlencoded;

use stroll_shared::{
    Coordinates, MAX_DISTANCE_UNIT, MAX_STAR, METERS_PER_DISTANCE_UNIT, MIN_DISTANCE_UNIT,
    OrderBy,
};

// URL 与请求中使用的参数名
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_MAX_DISTANCE: &str = "maxDistance";
pub const PARAM_MIN_STAR: &str = "minStar";
pub const PARAM_ORDER_BY: &str = "orderBy";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_KEYWORDS: &str = "keywords";
pub const PARAM_LNG: &str = "x";
pub const PARAM_LAT: &str = "y";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// 空字符串表示全部分类
    pub category: String,
    /// 1..=50，实际距离上限为该值 * 100 米
    pub max_distance_unit: u32,
    /// 0..=5
    pub min_star: u8,
    pub order_by: OrderBy,
    /// >= 1
    pub page: u32,
    pub keywords: String,
    pub coordinates: Option<Coordinates>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            category: String::new(),
            max_distance_unit: MAX_DISTANCE_UNIT,
            min_star: 0,
            order_by: OrderBy::Distance,
            page: 1,
            keywords: String::new(),
            coordinates: None,
        }
    }
}

impl SearchQuery {
    /// 从 URL 查询串（可带前导 `?`）派生查询
    pub fn from_query_string(qs: &str) -> Self {
        let qs = qs.strip_prefix('?').unwrap_or(qs);
        let pairs = form_urlencoded::parse(qs.as_bytes()).into_owned();
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = SearchQuery::default();
        let mut lng: Option<f64> = None;
        let mut lat: Option<f64> = None;

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                PARAM_CATEGORY => query.category = value.to_string(),
                PARAM_MAX_DISTANCE => {
                    if let Some(n) = parse_int(value) {
                        query.max_distance_unit =
                            n.clamp(MIN_DISTANCE_UNIT as i64, MAX_DISTANCE_UNIT as i64) as u32;
                    }
                }
                PARAM_MIN_STAR => {
                    if let Some(n) = parse_int(value) {
                        query.min_star = n.clamp(0, MAX_STAR as i64) as u8;
                    }
                }
                PARAM_ORDER_BY => {
                    if let Some(order) = OrderBy::parse(value) {
                        query.order_by = order;
                    }
                }
                PARAM_PAGE => {
                    if let Some(n) = parse_int(value) {
                        query.page = n.clamp(1, u32::MAX as i64) as u32;
                    }
                }
                PARAM_KEYWORDS => query.keywords = value.to_string(),
                PARAM_LNG => lng = value.parse::<f64>().ok().filter(|v| v.is_finite()),
                PARAM_LAT => lat = value.parse::<f64>().ok().filter(|v| v.is_finite()),
                _ => {}
            }
        }

        if let (Some(lat), Some(lng)) = (lat, lng) {
            query.coordinates = Some(Coordinates::new(lat, lng));
        }
        query
    }

    /// 规范化的 URL 查询串（不带 `?`），可分享/收藏
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        ser.append_pair(PARAM_CATEGORY, &self.category)
            .append_pair(PARAM_MAX_DISTANCE, &self.max_distance_unit.to_string())
            .append_pair(PARAM_MIN_STAR, &self.min_star.to_string())
            .append_pair(PARAM_ORDER_BY, self.order_by.as_str())
            .append_pair(PARAM_PAGE, &self.page.to_string());
        if !self.keywords.is_empty() {
            ser.append_pair(PARAM_KEYWORDS, &self.keywords);
        }
        if let Some(c) = self.coordinates {
            ser.append_pair(PARAM_LNG, &c.lng.to_string())
                .append_pair(PARAM_LAT, &c.lat.to_string());
        }
        ser.finish()
    }

    /// 实际发送给服务端的距离上限（米）
    pub fn max_distance_meters(&self) -> u32 {
        self.max_distance_unit * METERS_PER_DISTANCE_UNIT
    }

    /// `GET /api/places` 的查询参数
    pub fn request_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (PARAM_CATEGORY, self.category.clone()),
            (PARAM_MAX_DISTANCE, self.max_distance_meters().to_string()),
            (PARAM_MIN_STAR, self.min_star.to_string()),
            (PARAM_ORDER_BY, self.order_by.as_str().to_string()),
            (PARAM_PAGE, self.page.to_string()),
        ];
        if let Some(c) = self.coordinates {
            params.push((PARAM_LNG, c.lng.to_string()));
            params.push((PARAM_LAT, c.lat.to_string()));
        }
        if !self.keywords.is_empty() {
            params.push((PARAM_KEYWORDS, self.keywords.clone()));
        }
        params
    }

    pub fn request_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.request_params())
            .finish()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }
}

fn parse_int(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_uses_defaults() {
        let q = SearchQuery::from_query_string("");
        assert_eq!(q, SearchQuery::default());
        assert_eq!(q.category, "");
        assert_eq!(q.max_distance_unit, 50);
        assert_eq!(q.min_star, 0);
        assert_eq!(q.page, 1);
        assert_eq!(q.keywords, "");
        assert_eq!(q.order_by, OrderBy::Distance);
    }

    #[test]
    fn parses_every_field() {
        let q = SearchQuery::from_query_string(
            "?category=cafe&maxDistance=10&minStar=3&orderBy=star&page=4&keywords=dog%20park&x=126.978&y=37.5665",
        );
        assert_eq!(q.category, "cafe");
        assert_eq!(q.max_distance_unit, 10);
        assert_eq!(q.min_star, 3);
        assert_eq!(q.order_by, OrderBy::Star);
        assert_eq!(q.page, 4);
        assert_eq!(q.keywords, "dog park");
        assert_eq!(q.coordinates, Some(Coordinates::new(37.5665, 126.978)));
    }

    #[test]
    fn clamps_and_ignores_garbage() {
        let q = SearchQuery::from_query_string(
            "maxDistance=500&minStar=-2&page=0&orderBy=random&x=abc&y=1",
        );
        assert_eq!(q.max_distance_unit, 50);
        assert_eq!(q.min_star, 0);
        assert_eq!(q.page, 1);
        assert_eq!(q.order_by, OrderBy::Distance);
        assert_eq!(q.coordinates, None);

        let q = SearchQuery::from_query_string("maxDistance=0&minStar=9&page=abc&x=NaN&y=NaN");
        assert_eq!(q.max_distance_unit, 1);
        assert_eq!(q.min_star, 5);
        assert_eq!(q.page, 1);
        assert_eq!(q.coordinates, None);
    }

    #[test]
    fn round_trips_through_url() {
        let samples = [
            SearchQuery::default(),
            SearchQuery {
                category: "kindergarden".into(),
                max_distance_unit: 1,
                min_star: 5,
                order_by: OrderBy::Star,
                page: 12,
                keywords: "a&b=c ?".into(),
                coordinates: Some(Coordinates::new(-33.8688, 151.2093)),
            },
            SearchQuery {
                keywords: "카페".into(),
                coordinates: Some(Coordinates::new(37.566535, 126.9779692)),
                ..SearchQuery::default()
            },
        ];
        for q in samples {
            let back = SearchQuery::from_query_string(&q.to_query_string());
            assert_eq!(back, q);
        }
    }

    #[test]
    fn request_params_scale_distance_and_skip_absent_location() {
        let q = SearchQuery {
            category: "cafe".into(),
            max_distance_unit: 10,
            min_star: 3,
            ..SearchQuery::default()
        };
        let qs = q.request_query_string();
        assert!(qs.starts_with("category=cafe&maxDistance=1000&minStar=3"));
        assert!(!qs.contains("x="));
        assert!(!qs.contains("y="));
        assert!(!qs.contains("keywords"));
    }

    #[test]
    fn request_params_include_location_and_keywords() {
        let q = SearchQuery {
            keywords: "vet".into(),
            coordinates: Some(Coordinates::new(37.5, 127.0)),
            ..SearchQuery::default()
        };
        let params = q.request_params();
        assert!(params.contains(&("x", "127".to_string())));
        assert!(params.contains(&("y", "37.5".to_string())));
        assert!(params.contains(&("keywords", "vet".to_string())));
        assert!(params.contains(&("maxDistance", "5000".to_string())));
    }
}
