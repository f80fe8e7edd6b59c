/*!
 Errors that can happen when parsing XML property list data.
*/

use std::fmt::{Display, Formatter, Result};

/// Errors that can happen when parsing XML property list data
#[derive(Debug)]
pub enum XmlPlistError {
    /// The underlying XML was not well formed
    Malformed(quick_xml::Error),
    /// A closing tag appeared with no matching opening tag
    UnexpectedEndTag,
    /// The document's root element is not `plist`
    NotAPlist,
    /// The `plist` element contains no value
    MissingRootElement,
    /// The `plist` element contains more than one value
    MultipleRootElements,
    /// A `key` element was not followed by a value element
    KeyWithoutValue,
    /// A value element appeared in a `dict` where a `key` was expected
    ValueWithoutKey,
    /// An element that is not part of the plist vocabulary
    UnknownElement(String),
    /// An `integer` element's text did not parse
    InvalidInteger(String),
    /// A `real` element's text did not parse
    InvalidReal(String),
    /// A `date` element's text did not parse
    InvalidDate(String),
    /// A `data` element's text was not valid base64
    InvalidData(String),
    /// Elements nest past the supported depth
    NestingTooDeep(usize),
}

impl Display for XmlPlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            XmlPlistError::Malformed(why) => write!(fmt, "Malformed XML: {why}"),
            XmlPlistError::UnexpectedEndTag => write!(fmt, "Closing tag with no opening tag!"),
            XmlPlistError::NotAPlist => write!(fmt, "Root element is not plist!"),
            XmlPlistError::MissingRootElement => write!(fmt, "plist element contains no value!"),
            XmlPlistError::MultipleRootElements => {
                write!(fmt, "plist element contains more than one value!")
            }
            XmlPlistError::KeyWithoutValue => {
                write!(fmt, "Dictionary key has no matching value!")
            }
            XmlPlistError::ValueWithoutKey => {
                write!(fmt, "Dictionary value has no preceding key!")
            }
            XmlPlistError::UnknownElement(name) => write!(fmt, "Unknown element: {name}"),
            XmlPlistError::InvalidInteger(text) => write!(fmt, "Invalid integer: {text}"),
            XmlPlistError::InvalidReal(text) => write!(fmt, "Invalid real: {text}"),
            XmlPlistError::InvalidDate(text) => write!(fmt, "Invalid date: {text}"),
            XmlPlistError::InvalidData(text) => write!(fmt, "Invalid base64 data: {text}"),
            XmlPlistError::NestingTooDeep(depth) => {
                write!(fmt, "Elements nest {depth} levels deep, past the supported limit!")
            }
        }
    }
}

impl std::error::Error for XmlPlistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmlPlistError::Malformed(why) => Some(why),
            _ => None,
        }
    }
}
