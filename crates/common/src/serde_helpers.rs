use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Missing and empty values become `0.0`. A non-numeric string is an error.
pub fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("number out of range: {n}"))),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(0.0)
            } else {
                trimmed.parse::<f64>().map_err(de::Error::custom)
            }
        }
        Some(other) => Err(de::Error::custom(format!("expected number, got {other}"))),
    }
}

pub fn string_opt_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected string, got {other}"))),
    }
}

pub fn string_lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_opt_lenient(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "f64_lenient")]
        price: f64,
        #[serde(default, deserialize_with = "string_opt_lenient")]
        code: Option<String>,
    }

    #[test]
    fn test_numbers_and_strings_are_accepted() {
        let a: Sample = serde_json::from_str(r#"{"price": 95000.5, "code": 0}"#).unwrap();
        assert_eq!(a.price, 95000.5);
        assert_eq!(a.code.as_deref(), Some("0"));

        let b: Sample = serde_json::from_str(r#"{"price": " 42.25 ", "code": "00000"}"#).unwrap();
        assert_eq!(b.price, 42.25);
        assert_eq!(b.code.as_deref(), Some("00000"));
    }

    #[test]
    fn test_missing_and_empty_default_to_zero() {
        let a: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(a.price, 0.0);
        assert!(a.code.is_none());

        let b: Sample = serde_json::from_str(r#"{"price": "", "code": null}"#).unwrap();
        assert_eq!(b.price, 0.0);
        assert!(b.code.is_none());
    }

    #[test]
    fn test_garbage_price_is_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"price": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"price": [1]}"#).is_err());
    }
}
