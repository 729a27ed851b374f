//! Leaf coercions
//!
//! Each function returns `None` when the candidate type does not apply, so
//! the caller can move on to the next candidate.

use serde_json::{Number, Value};

/// `null` accepts null and the empty string
pub(crate) fn to_null(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::String(s) if s.is_empty() => Some(Value::Null),
        _ => None,
    }
}

/// `string` stringifies anything except null
pub(crate) fn to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Value::String(s.clone())),
        other => Some(Value::String(other.to_string())),
    }
}

/// `integer` strips thousands separators from strings and truncates floats
pub(crate) fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_i64().map(Value::from).or_else(|| {
            n.as_u64().map(Value::from).or_else(|| {
                let f = n.as_f64().filter(|f| f.is_finite())?.trunc();
                if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Some(Value::from(f as i64))
                } else {
                    None
                }
            })
        }),
        Value::Bool(b) => Some(Value::from(i64::from(*b))),
        Value::String(s) => {
            let cleaned = s.replace(',', "");
            let cleaned = cleaned.trim();
            cleaned
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| cleaned.parse::<u64>().map(Value::from))
                .ok()
        }
        _ => None,
    }
}

/// `number` strips thousands separators from strings; non-finite results fail
pub(crate) fn to_number(value: &Value) -> Option<Value> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.replace(',', "").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Number::from_f64(f).map(Value::Number)
}

/// `boolean` uses truthiness, except that the string "false" (any case) is false
pub(crate) fn to_boolean(value: &Value) -> Option<Value> {
    let b = match value {
        Value::String(s) if s.to_lowercase() == "false" => false,
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    };
    Some(Value::Bool(b))
}

/// `string` with `format: singer.decimal` renders numbers as decimal strings
pub(crate) fn to_decimal(value: &Value) -> Option<Value> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    render_decimal(&text).map(Value::String)
}

/// Canonical decimal rendering: plain notation unless the exponent is positive
/// or the value is smaller than 1E-6, scientific otherwise.
fn render_decimal(text: &str) -> Option<String> {
    let (sign, body) = match text.as_bytes().first()? {
        b'-' => ("-", &text[1..]),
        b'+' => ("", &text[1..]),
        _ => ("", text),
    };

    match body.to_ascii_lowercase().as_str() {
        "nan" | "snan" => return Some("NaN".to_string()),
        "inf" | "infinity" => return Some(format!("{sign}Infinity")),
        _ => {}
    }

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], body[pos + 1..].parse::<i64>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut digits: String = format!("{int_part}{frac_part}")
        .trim_start_matches('0')
        .to_string();
    if digits.is_empty() {
        digits.push('0');
    }
    let exp = exponent - frac_part.len() as i64;
    let len = digits.len() as i64;
    let left_digits = exp + len;

    let dot_place = if exp <= 0 && left_digits > -6 {
        left_digits
    } else {
        1
    };

    let (int_out, frac_out) = if dot_place <= 0 {
        (
            "0".to_string(),
            format!(".{}{}", "0".repeat((-dot_place) as usize), digits),
        )
    } else if dot_place >= len {
        (
            format!("{}{}", digits, "0".repeat((dot_place - len) as usize)),
            String::new(),
        )
    } else {
        let split = dot_place as usize;
        (digits[..split].to_string(), format!(".{}", &digits[split..]))
    };

    let exp_out = if left_digits == dot_place {
        String::new()
    } else {
        format!("E{:+}", left_digits - dot_place)
    };

    Some(format!("{sign}{int_out}{frac_out}{exp_out}"))
}
