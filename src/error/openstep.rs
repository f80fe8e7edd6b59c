/*!
 Errors that can happen when parsing OpenStep property list text.
*/

use std::{
    fmt::{Display, Formatter, Result},
    str::Utf8Error,
};

/// Errors that can happen when parsing OpenStep property list text
#[derive(Debug)]
pub enum OpenStepError {
    /// The text ended in the middle of a value
    UnexpectedEnd,
    /// A quoted string has no closing quote
    UnterminatedString,
    /// A block comment has no closing `*/`
    UnterminatedComment,
    /// A hex data block has no closing `>`
    UnterminatedData,
    /// A hex data block contains an odd number of digits
    OddHexDigits,
    /// A byte that is not a hex digit appeared inside a data block
    InvalidDataCharacter(u8),
    /// A `\u` escape did not resolve to a Unicode scalar value
    InvalidUnicodeEscape(u32),
    /// A dictionary entry is missing the `=` between key and value
    MissingEquals,
    /// A dictionary entry is missing its trailing `;`
    MissingSemicolon,
    /// An array element was not followed by `,` or `)`
    MissingArraySeparator(u8),
    /// A byte that cannot start a value appeared where a value was expected
    UnexpectedCharacter(u8),
    /// Bytes remain after the top-level value
    TrailingCharacters(usize),
    /// String bytes were not valid text
    StringParseError(Utf8Error),
    /// Containers nest past the supported depth
    NestingTooDeep(usize),
}

impl Display for OpenStepError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            OpenStepError::UnexpectedEnd => write!(fmt, "Unexpected end of input!"),
            OpenStepError::UnterminatedString => write!(fmt, "Quoted string has no closing quote!"),
            OpenStepError::UnterminatedComment => write!(fmt, "Block comment has no closing */!"),
            OpenStepError::UnterminatedData => write!(fmt, "Data block has no closing >!"),
            OpenStepError::OddHexDigits => {
                write!(fmt, "Data block contains an odd number of hex digits!")
            }
            OpenStepError::InvalidDataCharacter(byte) => {
                write!(fmt, "Invalid hex digit in data block: {byte:#04x}")
            }
            OpenStepError::InvalidUnicodeEscape(value) => {
                write!(fmt, "Escape {value:#x} is not a Unicode scalar value!")
            }
            OpenStepError::MissingEquals => {
                write!(fmt, "Dictionary entry is missing = between key and value!")
            }
            OpenStepError::MissingSemicolon => {
                write!(fmt, "Dictionary entry is missing its trailing semicolon!")
            }
            OpenStepError::MissingArraySeparator(byte) => {
                write!(fmt, "Expected , or ) after array element, found {byte:#04x}")
            }
            OpenStepError::UnexpectedCharacter(byte) => {
                write!(fmt, "Cannot parse a value starting with {byte:#04x}")
            }
            OpenStepError::TrailingCharacters(idx) => {
                write!(fmt, "Unparsed characters remain at offset {idx}!")
            }
            OpenStepError::StringParseError(why) => write!(fmt, "Failed to parse string: {why}"),
            OpenStepError::NestingTooDeep(depth) => {
                write!(fmt, "Containers nest {depth} levels deep, past the supported limit!")
            }
        }
    }
}

impl std::error::Error for OpenStepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OpenStepError::StringParseError(why) => Some(why),
            _ => None,
        }
    }
}
