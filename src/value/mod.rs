/*!
 The in-memory property list data model.

 Every wire format decodes into a [`Value`] tree and every encoder walks one.
 Scalars remember the width they were stored with so a decoded plist can be
 re-encoded without widening its numbers.
*/

pub mod dictionary;

pub use dictionary::Dictionary;

use crate::format::PlistFormat;

/// Containers deeper than this are rejected by the text codecs and by
/// [`Value::is_valid`]. The binary codec applies the tighter
/// `format::binary::MAX_OBJECT_DEPTH`.
pub(crate) const MAX_NESTING_DEPTH: usize = 512;

/// Storage width of an integer, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    One,
    Two,
    Four,
    Eight,
}

impl IntegerWidth {
    /// Number of bytes this width occupies on the wire
    pub fn byte_len(&self) -> usize {
        match self {
            IntegerWidth::One => 1,
            IntegerWidth::Two => 2,
            IntegerWidth::Four => 4,
            IntegerWidth::Eight => 8,
        }
    }

    /// Base-2 log of the byte length, as stored in a binary plist marker nibble
    pub(crate) fn exponent(&self) -> u8 {
        match self {
            IntegerWidth::One => 0,
            IntegerWidth::Two => 1,
            IntegerWidth::Four => 2,
            IntegerWidth::Eight => 3,
        }
    }

    pub(crate) fn from_exponent(exponent: u8) -> Option<Self> {
        match exponent {
            0 => Some(IntegerWidth::One),
            1 => Some(IntegerWidth::Two),
            2 => Some(IntegerWidth::Four),
            3 => Some(IntegerWidth::Eight),
            _ => None,
        }
    }
}

/// A signed integer plus the width it occupies on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integer {
    pub value: i64,
    pub width: IntegerWidth,
}

impl Integer {
    /// Create an integer with the narrowest width that can hold the value
    pub fn new(value: i64) -> Self {
        let width = if i8::try_from(value).is_ok() {
            IntegerWidth::One
        } else if i16::try_from(value).is_ok() {
            IntegerWidth::Two
        } else if i32::try_from(value).is_ok() {
            IntegerWidth::Four
        } else {
            IntegerWidth::Eight
        };
        Self { value, width }
    }
}

/// Storage width of a floating point number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealWidth {
    Four,
    Eight,
}

/// A floating point number plus the width it occupies on the wire
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Real {
    pub value: f64,
    pub width: RealWidth,
}

impl Real {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            width: RealWidth::Eight,
        }
    }
}

/// A property list value
///
/// Dates are seconds relative to 2001-01-01T00:00:00Z. Sets only exist in
/// binary plists; the other encoders reject them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(Integer),
    Real(Real),
    Date(f64),
    Data(Vec<u8>),
    String(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    Set(Vec<Value>),
}

impl Value {
    /// Human readable name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Date(_) => "date",
            Value::Data(_) => "data",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dictionary(_) => "dictionary",
            Value::Set(_) => "set",
        }
    }

    /// Whether this value can be written in the given format
    ///
    /// Binary accepts everything. XML accepts everything except sets.
    /// OpenStep only carries strings, data, arrays, and dictionaries.
    /// Nesting past the supported depth is invalid everywhere.
    pub fn is_valid(&self, format: PlistFormat) -> bool {
        self.is_valid_at(format, 0)
    }

    fn is_valid_at(&self, format: PlistFormat, depth: usize) -> bool {
        let limit = match format {
            PlistFormat::Binary => crate::format::binary::MAX_OBJECT_DEPTH,
            PlistFormat::Xml | PlistFormat::OpenStep => MAX_NESTING_DEPTH,
        };
        if depth > limit {
            return false;
        }
        match self {
            Value::Boolean(_) | Value::Integer(_) | Value::Real(_) | Value::Date(_) => {
                format != PlistFormat::OpenStep
            }
            Value::Data(_) | Value::String(_) => true,
            Value::Array(items) => items
                .iter()
                .all(|item| item.is_valid_at(format, depth + 1)),
            Value::Dictionary(dict) => dict
                .values()
                .all(|value| value.is_valid_at(format, depth + 1)),
            Value::Set(items) => {
                format == PlistFormat::Binary
                    && items.iter().all(|item| item.is_valid_at(format, depth + 1))
            }
        }
    }

    /// Rebuild the value as a fully independent tree
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_copy).collect()),
            Value::Set(items) => Value::Set(items.iter().map(Value::deep_copy).collect()),
            Value::Dictionary(dict) => Value::Dictionary(
                dict.iter()
                    .map(|(key, value)| (key.to_string(), value.deep_copy()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(integer) => Some(integer.value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(real) => Some(real.value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<f64> {
        match self {
            Value::Date(seconds) => Some(*seconds),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Value::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(Integer::new(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(Real::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Data(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dictionary(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        format::PlistFormat,
        value::{Dictionary, Integer, IntegerWidth, Value},
    };

    #[test]
    fn can_pick_narrowest_integer_width() {
        assert_eq!(Integer::new(0).width, IntegerWidth::One);
        assert_eq!(Integer::new(-128).width, IntegerWidth::One);
        assert_eq!(Integer::new(128).width, IntegerWidth::Two);
        assert_eq!(Integer::new(-32768).width, IntegerWidth::Two);
        assert_eq!(Integer::new(32768).width, IntegerWidth::Four);
        assert_eq!(Integer::new(2_147_483_648).width, IntegerWidth::Eight);
        assert_eq!(Integer::new(i64::MIN).width, IntegerWidth::Eight);
    }

    #[test]
    fn can_validate_openstep_types() {
        let mut dict = Dictionary::new();
        dict.insert("text", "hello");
        dict.insert("blob", vec![0u8, 1, 2]);
        let value = Value::Dictionary(dict);
        assert!(value.is_valid(PlistFormat::OpenStep));

        let mut dict = Dictionary::new();
        dict.insert("flag", true);
        let value = Value::Dictionary(dict);
        assert!(!value.is_valid(PlistFormat::OpenStep));
        assert!(value.is_valid(PlistFormat::Xml));
        assert!(value.is_valid(PlistFormat::Binary));
    }

    #[test]
    fn can_validate_sets_as_binary_only() {
        let value = Value::Set(vec![Value::from(1i64)]);
        assert!(value.is_valid(PlistFormat::Binary));
        assert!(!value.is_valid(PlistFormat::Xml));
        assert!(!value.is_valid(PlistFormat::OpenStep));
    }

    #[test]
    fn can_reject_overly_deep_nesting() {
        let mut value = Value::from(1i64);
        for _ in 0..600 {
            value = Value::Array(vec![value]);
        }
        assert!(!value.is_valid(PlistFormat::Binary));
        assert!(!value.is_valid(PlistFormat::Xml));
    }

    #[test]
    fn can_apply_tighter_binary_depth_limit() {
        let mut value = Value::from("leaf");
        for _ in 0..200 {
            value = Value::Array(vec![value]);
        }
        assert!(!value.is_valid(PlistFormat::Binary));
        assert!(value.is_valid(PlistFormat::Xml));
        assert!(value.is_valid(PlistFormat::OpenStep));
    }

    #[test]
    fn can_deep_copy_independently() {
        let mut dict = Dictionary::new();
        dict.insert("items", Value::Array(vec![Value::from("one")]));
        let original = Value::Dictionary(dict);

        let mut copy = original.deep_copy();
        assert_eq!(original, copy);

        if let Value::Dictionary(dict) = &mut copy {
            dict.insert("items", Value::Array(vec![]));
        }
        assert_ne!(original, copy);
    }
}
