#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod format;
pub mod util;
pub mod value;

pub use error::plist::PlistError;
pub use format::{from_bytes, from_reader, to_bytes, to_writer, PlistFormat};
pub use value::{Dictionary, Integer, IntegerWidth, Real, RealWidth, Value};
