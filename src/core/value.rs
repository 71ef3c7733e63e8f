//! Values flowing through Deferreds and handlers.
//!
//! Only the slice of JavaScript values the exercises need is modeled:
//! primitives plus error-like objects. Rendering follows the Node console,
//! both at the top level (`Display`) and nested inside a Deferred
//! rendering ([`Value::inspect`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of running user code: `Ok` for a normal return, `Err` for a throw.
///
/// Handlers and executors use `?` to let a thrown value escape, which the
/// event loop turns into a rejection.
pub type Completion<T = Value> = std::result::Result<T, Value>;

/// Constructor name of an error-like object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
        }
    }
}

/// An error-like object. Returning one is a fulfillment; only throwing it
/// rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind.as_str())
        } else {
            write!(f, "{}: {}", self.kind.as_str(), self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Error(ErrorObject),
}

impl Value {
    /// `new Error(message)`.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(ErrorObject {
            kind: ErrorKind::Error,
            message: message.into(),
        })
    }

    /// `new TypeError(message)`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Value::Error(ErrorObject {
            kind: ErrorKind::TypeError,
            message: message.into(),
        })
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_error_like(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// `value.toString()`, throwing a TypeError on `undefined` and `null`
    /// like a property read on them does.
    pub fn to_js_string(&self) -> Completion<String> {
        match self {
            Value::Undefined | Value::Null => Err(Value::type_error(format!(
                "Cannot read properties of {} (reading 'toString')",
                self
            ))),
            other => Ok(other.to_string()),
        }
    }

    /// Numeric coercion (`+value`).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Error(_) => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    parse_js_number(trimmed)
                }
            }
        }
    }

    /// The `+` operator: string concatenation when either side is a string
    /// or an object, numeric addition otherwise.
    pub fn plus(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::String(_) | Value::Error(_), _) | (_, Value::String(_) | Value::Error(_)) => {
                Value::String(format!("{}{}", self, other))
            }
            _ => Value::Number(self.to_number() + other.to_number()),
        }
    }

    /// Rendering used when the value is nested inside another rendering,
    /// e.g. `Promise { 'a' }`.
    pub fn inspect(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// `Number.prototype.toString()` for finite, non-zero `n`: plain digits
/// for decimal exponents in `-6..21`, exponent form (`1e+21`, `1e-7`)
/// outside it.
fn js_number_string(n: f64) -> String {
    // `{:e}` yields the shortest round-tripping digits, e.g. `1.2345e3`.
    let sci = format!("{:e}", n.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exp + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if point - 1 < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (point - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (point - 1).abs())
        }
    };

    if n < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}Infinity", if n < 0.0 { "-" } else { "" })
    } else if n == 0.0 {
        // -0 prints as 0 in string conversion
        write!(f, "0")
    } else {
        write!(f, "{}", js_number_string(n))
    }
}

/// `StringToNumber` on an already trimmed, non-empty string: decimal
/// literals with optional sign and exponent, `Infinity`, and unsigned
/// `0x`/`0o`/`0b` integers. Anything else is NaN.
fn parse_js_number(s: &str) -> f64 {
    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let body = &s[2..];
        if body.is_empty() {
            return f64::NAN;
        }
        return body
            .chars()
            .try_fold(0.0_f64, |acc, c| {
                c.to_digit(radix)
                    .map(|d| acc * f64::from(radix) + f64::from(d))
            })
            .unwrap_or(f64::NAN);
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    if !is_decimal_literal(unsigned) {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// `digits [. digits] [e [+-] digits]` with at least one mantissa digit.
fn is_decimal_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if int.len() + frac.len() == 0 || !all_digits(int) || !all_digits(frac) {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}
