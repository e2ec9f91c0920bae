//! Lenient deserializers for host-provided payloads
//!
//! Settings blobs are assembled from form fields by the host, so numbers may
//! arrive as strings, booleans as `"true"`, and unset fields as `""` or null.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `""` and null become `None`, any other string is kept.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `true`, `"true"`, `"on"`, and non-zero numbers.
pub fn bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "on" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    })
}

/// Interpret a JSON value as a finite number (strings are parsed).
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Optional non-negative integer; unparseable input becomes `None`.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_of)
        .filter(|f| *f >= 0.0)
        .map(|f| f.min(u32::MAX as f64) as u32))
}

/// Non-negative integer, 0 when missing or unparseable.
pub fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    opt_u32(deserializer).map(|v| v.unwrap_or(0))
}

/// Signed integer (pixel offsets), 0 when missing or unparseable.
pub fn i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_of)
        .map(|f| f.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .unwrap_or(0))
}

/// Percentage clamped to 0-100; missing input yields the sound default of 90.
pub fn volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_of)
        .map(|f| f.clamp(0.0, 100.0) as u8)
        .unwrap_or(crate::settings::DEFAULT_VOLUME))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Loose {
        #[serde(default, deserialize_with = "super::opt_u32")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "super::bool")]
        flag: bool,
        #[serde(default, deserialize_with = "super::opt_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "super::i32")]
        offset: i32,
    }

    #[test]
    fn form_strings_are_coerced() {
        let p: Loose = serde_json::from_str(
            r#"{"count": "250", "flag": "true", "name": "", "offset": "-40"}"#,
        )
        .unwrap();
        assert_eq!(p.count, Some(250));
        assert!(p.flag);
        assert_eq!(p.name, None);
        assert_eq!(p.offset, -40);
    }

    #[test]
    fn garbage_numbers_become_none() {
        let p: Loose = serde_json::from_str(r#"{"count": "lots", "offset": null}"#).unwrap();
        assert_eq!(p.count, None);
        assert_eq!(p.offset, 0);
        assert!(!p.flag);
    }
}
