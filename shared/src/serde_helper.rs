//! 反序列化辅助函数
//!
//! 后端对用户 ID 的表示并不统一：登录接口返回字符串，评论接口返回数字。
//! 这里统一转换为 `String`。星级同样可能是整数或浮点数。

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(n) => n.to_string(),
        }
    }
}

/// 接受字符串或数字形式的 ID
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

/// 同 [`id_string`]，但允许字段缺失或为 null
pub fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

/// 将 null 视为空字符串
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// 接受整数或浮点数形式的星级（`4` 与 `4.0` 都可以），四舍五入后截断到 u8 范围
pub fn star_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let star = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Int(n) => n as f64,
        StringOrNumber::Float(n) => n,
        StringOrNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid star rating: {s}")))?,
    };
    if !star.is_finite() {
        return Err(serde::de::Error::custom("star rating is not finite"));
    }
    Ok(star.round().clamp(0.0, u8::MAX as f64) as u8)
}
