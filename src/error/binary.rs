/*!
 Errors that can happen when parsing binary property list data.
*/

use std::{
    fmt::{Display, Formatter, Result},
    str::Utf8Error,
};

/// Errors that can happen when parsing binary property list data
#[derive(Debug)]
pub enum BinaryPlistError {
    /// The data is too short to hold the magic number and trailer
    TooShort(usize),
    /// The data does not start with the `bplist00` magic number
    BadMagic,
    /// A read would have gone past the end of the data
    OutOfBounds(usize, usize),
    /// The trailer names an offset width other than 1, 2, 4, or 8
    InvalidOffsetWidth(u8),
    /// The trailer names a reference width other than 1, 2, 4, or 8
    InvalidReferenceWidth(u8),
    /// The trailer claims more objects than the data could hold
    InvalidObjectCount(u64),
    /// An object marker byte does not describe any known shape
    InvalidMarker(u8),
    /// An object reference points outside the offset table
    InvalidObjectReference(u64, u64),
    /// A Unicode string payload has an odd byte length
    InvalidUtf16Length(usize),
    /// String bytes were not valid text
    StringParseError(Utf8Error),
    /// A dictionary key decoded to something other than a string
    NonStringKey,
    /// Containers nest past the supported depth
    NestingTooDeep(usize),
}

impl Display for BinaryPlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            BinaryPlistError::TooShort(len) => {
                write!(fmt, "Data of {len} bytes is too short to be a binary property list!")
            }
            BinaryPlistError::BadMagic => write!(fmt, "Data does not start with bplist00!"),
            BinaryPlistError::OutOfBounds(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            BinaryPlistError::InvalidOffsetWidth(width) => {
                write!(fmt, "Invalid offset table entry width: {width}")
            }
            BinaryPlistError::InvalidReferenceWidth(width) => {
                write!(fmt, "Invalid object reference width: {width}")
            }
            BinaryPlistError::InvalidObjectCount(count) => {
                write!(fmt, "Trailer claims {count} objects, more than the data can hold!")
            }
            BinaryPlistError::InvalidMarker(marker) => {
                write!(fmt, "Invalid object marker: {marker:x}")
            }
            BinaryPlistError::InvalidObjectReference(reference, count) => {
                write!(
                    fmt,
                    "Object reference {reference} is outside of the {count} entry offset table!"
                )
            }
            BinaryPlistError::InvalidUtf16Length(len) => {
                write!(fmt, "Unicode string payload has odd length {len}!")
            }
            BinaryPlistError::StringParseError(why) => {
                write!(fmt, "Failed to parse string: {why}")
            }
            BinaryPlistError::NonStringKey => {
                write!(fmt, "Dictionary key is not a string!")
            }
            BinaryPlistError::NestingTooDeep(depth) => {
                write!(fmt, "Containers nest {depth} levels deep, past the supported limit!")
            }
        }
    }
}

impl std::error::Error for BinaryPlistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BinaryPlistError::StringParseError(why) => Some(why),
            _ => None,
        }
    }
}
