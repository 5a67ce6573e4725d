//! Field codecs: `(domain value) <-> (text)` plus text validation, per primitive.
use std::fmt;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Number, Value};

/// Text codec for a single-field editor. Stateless.
pub trait FieldFns: fmt::Debug {
    fn to_text(&self, value: &Value) -> String;
    /// Convert text to a value. Assumes `validate(text)` returned `None`.
    fn from_text(&self, text: &str) -> Value;
    /// `None` when the text is acceptable, otherwise a user-facing message.
    fn validate(&self, text: &str) -> Option<String>;
    /// Short name of the expected input, for placeholders and diagnostics.
    fn describe(&self) -> String;
}

pub type FieldFnsRef = Rc<dyn FieldFns>;

static INTEGER_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("integer regex"));
static CAPITAL_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").expect("capital regex"));

/// Look up the codec for an ADL primitive. `None` means there is no text editor for it.
pub fn primitive_field_fns(ptype: &str) -> Option<FieldFnsRef> {
    let fns: FieldFnsRef = match ptype {
        "Int8" => Rc::new(IntField::new(i8::MIN as i128, i8::MAX as i128)),
        "Int16" => Rc::new(IntField::new(i16::MIN as i128, i16::MAX as i128)),
        "Int32" => Rc::new(IntField::new(i32::MIN as i128, i32::MAX as i128)),
        "Int64" => Rc::new(IntField::new(i64::MIN as i128, i64::MAX as i128)),
        "Word8" => Rc::new(IntField::new(0, u8::MAX as i128)),
        "Word16" => Rc::new(IntField::new(0, u16::MAX as i128)),
        "Word32" => Rc::new(IntField::new(0, u32::MAX as i128)),
        "Word64" => Rc::new(IntField::new(0, u64::MAX as i128)),
        "Float" | "Double" => Rc::new(NumberField),
        "String" => Rc::new(StringField),
        "Bool" => Rc::new(BoolField),
        "Json" => Rc::new(JsonField),
        "ByteVector" => Rc::new(BytesField),
        _ => return None,
    };
    Some(fns)
}

/// Human readable label from a camelCase or snake_case name: `firstName` -> `First Name`.
pub fn field_label(name: &str) -> String {
    let spaced = CAPITAL_RX.replace_all(name, " $1").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---- primitives ----

#[derive(Debug, Clone)]
pub struct IntField {
    min: i128,
    max: i128,
}

impl IntField {
    pub fn new(min: i128, max: i128) -> Self {
        Self { min, max }
    }
}

impl FieldFns for IntField {
    fn to_text(&self, value: &Value) -> String {
        // `3.0` is an integer that arrived through a float encoding.
        match value.as_f64() {
            Some(f) if value.is_f64() && f.fract() == 0.0 && f.abs() < 2f64.powi(63) => (f as i64).to_string(),
            _ => plain_text(value),
        }
    }

    fn from_text(&self, text: &str) -> Value {
        let Ok(n) = text.parse::<i128>() else {
            return Value::Null;
        };
        if let Ok(i) = i64::try_from(n) {
            Value::from(i)
        } else if let Ok(u) = u64::try_from(n) {
            Value::from(u)
        } else {
            Value::Null
        }
    }

    fn validate(&self, text: &str) -> Option<String> {
        if !INTEGER_RX.is_match(text) {
            return Some("not a valid integer".to_string());
        }
        match text.parse::<i128>() {
            Err(_) => Some("not a valid integer".to_string()),
            Ok(n) if n < self.min => Some(format!("must be >= {}", self.min)),
            Ok(n) if n > self.max => Some(format!("must be <= {}", self.max)),
            Ok(_) => None,
        }
    }

    fn describe(&self) -> String {
        "integer".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NumberField;

impl FieldFns for NumberField {
    fn to_text(&self, value: &Value) -> String {
        plain_text(value)
    }

    fn from_text(&self, text: &str) -> Value {
        // Integral text stays an integer so that `5` does not come back as `5.0`.
        if !text.contains(['.', 'e', 'E']) {
            if let Ok(i) = text.parse::<i64>() {
                return Value::from(i);
            }
            if let Ok(u) = text.parse::<u64>() {
                return Value::from(u);
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    fn validate(&self, text: &str) -> Option<String> {
        match text.trim().parse::<f64>() {
            Ok(f) if f.is_finite() && text.trim() == text => None,
            _ => Some("not a valid number".to_string()),
        }
    }

    fn describe(&self) -> String {
        "number".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct StringField;

impl FieldFns for StringField {
    fn to_text(&self, value: &Value) -> String {
        plain_text(value)
    }

    fn from_text(&self, text: &str) -> Value {
        Value::String(text.to_string())
    }

    fn validate(&self, _text: &str) -> Option<String> {
        None
    }

    fn describe(&self) -> String {
        "string".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct BoolField;

impl FieldFns for BoolField {
    fn to_text(&self, value: &Value) -> String {
        plain_text(value)
    }

    fn from_text(&self, text: &str) -> Value {
        Value::Bool(text == "true")
    }

    fn validate(&self, text: &str) -> Option<String> {
        match text {
            "true" | "false" => None,
            _ => Some("must be true or false".to_string()),
        }
    }

    fn describe(&self) -> String {
        "boolean".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct JsonField;

impl FieldFns for JsonField {
    fn to_text(&self, value: &Value) -> String {
        value.to_string()
    }

    fn from_text(&self, text: &str) -> Value {
        serde_json::from_str(text).unwrap_or(Value::Null)
    }

    fn validate(&self, text: &str) -> Option<String> {
        serde_json::from_str::<Value>(text)
            .err()
            .map(|e| format!("invalid json: {e}"))
    }

    fn describe(&self) -> String {
        "json".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct BytesField;

impl FieldFns for BytesField {
    fn to_text(&self, value: &Value) -> String {
        plain_text(value)
    }

    fn from_text(&self, text: &str) -> Value {
        Value::String(text.to_string())
    }

    fn validate(&self, text: &str) -> Option<String> {
        STANDARD.decode(text).err().map(|_| "not valid base64".to_string())
    }

    fn describe(&self) -> String {
        "base64".to_string()
    }
}

// ---- optional wrappers ----

/// `Nullable<T>` in a single text field: empty text is `null`.
///
/// Only sound when the empty text is not itself a valid `T`.
#[derive(Debug, Clone)]
pub struct NullableField {
    inner: FieldFnsRef,
}

impl NullableField {
    pub fn new(inner: FieldFnsRef) -> Self {
        Self { inner }
    }
}

impl FieldFns for NullableField {
    fn to_text(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            v => self.inner.to_text(v),
        }
    }

    fn from_text(&self, text: &str) -> Value {
        if text.is_empty() {
            Value::Null
        } else {
            self.inner.from_text(text)
        }
    }

    fn validate(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            None
        } else {
            self.inner.validate(text)
        }
    }

    fn describe(&self) -> String {
        format!("optional {}", self.inner.describe())
    }
}

/// `sys.types.Maybe<T>` in a single text field: empty text is `nothing`.
#[derive(Debug, Clone)]
pub struct MaybeField {
    inner: FieldFnsRef,
}

impl MaybeField {
    pub fn new(inner: FieldFnsRef) -> Self {
        Self { inner }
    }
}

impl FieldFns for MaybeField {
    fn to_text(&self, value: &Value) -> String {
        match (value.get("kind").and_then(Value::as_str), value.get("value")) {
            (Some("just"), Some(v)) => self.inner.to_text(v),
            _ => String::new(),
        }
    }

    fn from_text(&self, text: &str) -> Value {
        if text.is_empty() {
            json!({"kind": "nothing"})
        } else {
            json!({"kind": "just", "value": self.inner.from_text(text)})
        }
    }

    fn validate(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            None
        } else {
            self.inner.validate(text)
        }
    }

    fn describe(&self) -> String {
        format!("optional {}", self.inner.describe())
    }
}
