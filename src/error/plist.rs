/*!
 Errors that can happen when reading or writing property lists through the
 top-level format dispatcher.
*/

use std::{
    fmt::{Display, Formatter, Result},
    io,
};

use crate::{
    error::{binary::BinaryPlistError, openstep::OpenStepError, xml::XmlPlistError},
    format::PlistFormat,
};

/// Errors that can happen when reading or writing property lists
#[derive(Debug)]
pub enum PlistError {
    /// The data carried the binary magic number but did not parse
    Binary(BinaryPlistError),
    /// The data parsed as neither XML nor OpenStep text
    OpenStep(OpenStepError),
    /// An XML document failed to parse as a plist
    Xml(XmlPlistError),
    /// The data matched none of the known formats
    UnknownFormat,
    /// The source reader failed before any parsing happened
    CannotRead(io::Error),
    /// The sink failed while an encoder was writing
    WriteStream(io::Error),
    /// The value contains a type the selected format cannot represent
    UnsupportedType(&'static str, PlistFormat),
    /// A date is outside the representable calendar range
    DateOutOfRange(f64),
    /// The value nests past the supported depth
    NestingTooDeep(usize),
    /// The value serializes to more objects than a binary plist can address
    TooManyObjects(u64),
}

impl Display for PlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            PlistError::Binary(why) => write!(fmt, "Failed to parse binary plist: {why}"),
            PlistError::OpenStep(why) => write!(fmt, "Failed to parse OpenStep plist: {why}"),
            PlistError::Xml(why) => write!(fmt, "Failed to parse XML plist: {why}"),
            PlistError::UnknownFormat => {
                write!(fmt, "Data is not a property list in any known format!")
            }
            PlistError::CannotRead(why) => write!(fmt, "Unable to read data: {why}"),
            PlistError::WriteStream(why) => write!(fmt, "Unable to write data: {why}"),
            PlistError::UnsupportedType(name, format) => {
                write!(fmt, "{format} property lists cannot represent {name} values!")
            }
            PlistError::DateOutOfRange(seconds) => {
                write!(fmt, "Date {seconds} is outside the representable range!")
            }
            PlistError::NestingTooDeep(depth) => {
                write!(fmt, "Value nests {depth} levels deep, past the supported limit!")
            }
            PlistError::TooManyObjects(count) => {
                write!(fmt, "Value serializes to {count} objects, more than object references can address!")
            }
        }
    }
}

impl std::error::Error for PlistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlistError::Binary(why) => Some(why),
            PlistError::OpenStep(why) => Some(why),
            PlistError::Xml(why) => Some(why),
            PlistError::CannotRead(why) | PlistError::WriteStream(why) => Some(why),
            _ => None,
        }
    }
}

impl From<BinaryPlistError> for PlistError {
    fn from(err: BinaryPlistError) -> Self {
        PlistError::Binary(err)
    }
}

impl From<OpenStepError> for PlistError {
    fn from(err: OpenStepError) -> Self {
        PlistError::OpenStep(err)
    }
}

impl From<XmlPlistError> for PlistError {
    fn from(err: XmlPlistError) -> Self {
        PlistError::Xml(err)
    }
}
