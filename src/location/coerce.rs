//! Numeric coercion for loosely typed producer JSON
//!
//! Drivers send coordinates as JSON numbers (float or integer) or as numeric
//! strings. Anything else, including empty strings, booleans, nulls and
//! non-finite values, fails coercion.

use serde_json::Value;

/// Coerce a JSON value to `f64`
///
/// Accepted shapes:
/// - JSON number (integer or floating point)
/// - string holding a decimal or scientific float (`"5.6"`, `"-1e3"`)
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.is_empty() => s.parse::<f64>().ok(),
        _ => None,
    };

    // serde_json cannot emit NaN or infinities, so they can't be relayed
    parsed.filter(|v| v.is_finite())
}

/// Coerce an optional field, treating an absent key like a failed coercion
pub fn coerce_field(value: Option<&Value>) -> Option<f64> {
    value.and_then(coerce_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float() {
        assert_eq!(coerce_f64(&json!(5.6)), Some(5.6));
        assert_eq!(coerce_f64(&json!(-0.1)), Some(-0.1));
    }

    #[test]
    fn test_integer() {
        assert_eq!(coerce_f64(&json!(7)), Some(7.0));
        assert_eq!(coerce_f64(&json!(-3)), Some(-3.0));
        assert_eq!(coerce_f64(&json!(u64::MAX)), Some(u64::MAX as f64));
    }

    #[test]
    fn test_numeric_string() {
        assert_eq!(coerce_f64(&json!("5.6")), Some(5.6));
        assert_eq!(coerce_f64(&json!("-12")), Some(-12.0));
        assert_eq!(coerce_f64(&json!("1e3")), Some(1000.0));
    }

    #[test]
    fn test_rejected_shapes() {
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!("north")), None);
        assert_eq!(coerce_f64(&json!(" 5.6")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&Value::Null), None);
        assert_eq!(coerce_f64(&json!([1.0])), None);
        assert_eq!(coerce_f64(&json!({"v": 1.0})), None);
    }

    #[test]
    fn test_non_finite_strings_rejected() {
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn test_absent_field() {
        assert_eq!(coerce_field(None), None);
        assert_eq!(coerce_field(Some(&json!(1))), Some(1.0));
    }
}
