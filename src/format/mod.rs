/*!
 Format detection and the top-level read/write entry points.

 Reads sniff the format: the binary magic number first, then a trial XML
 parse, then a trial OpenStep parse. Writes dispatch on an explicit
 [`PlistFormat`] selector.
*/

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Read, Write},
};

use crate::{
    error::plist::PlistError,
    util::stream::PlistWriteStream,
    value::Value,
};

pub mod binary;
pub mod openstep;
pub mod xml;

/// The wire formats a property list can be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlistFormat {
    /// The `bplist00` binary format
    Binary,
    /// The `<plist version="1.0">` XML format
    Xml,
    /// The legacy `{ key = value; }` text format
    OpenStep,
}

impl Display for PlistFormat {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            PlistFormat::Binary => write!(fmt, "binary"),
            PlistFormat::Xml => write!(fmt, "XML"),
            PlistFormat::OpenStep => write!(fmt, "OpenStep"),
        }
    }
}

/// Parse a property list from bytes, detecting the format
///
/// Data that starts with the binary magic number is only tried as a binary
/// plist; its parse errors are reported as-is rather than falling through to
/// the text parsers. Everything else is tried as XML, then as OpenStep.
pub fn from_bytes(data: &[u8]) -> Result<(Value, PlistFormat), PlistError> {
    if data.starts_with(binary::HEADER) {
        let value = binary::decode(data)?;
        return Ok((value, PlistFormat::Binary));
    }
    let text = std::str::from_utf8(data).map_err(|_| PlistError::UnknownFormat)?;
    if let Ok(value) = xml::decode(text) {
        return Ok((value, PlistFormat::Xml));
    }
    match openstep::decode(data) {
        Ok(value) => Ok((value, PlistFormat::OpenStep)),
        Err(_) => Err(PlistError::UnknownFormat),
    }
}

/// Read a property list from a reader, detecting the format
pub fn from_reader<R: Read>(mut reader: R) -> Result<(Value, PlistFormat), PlistError> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(PlistError::CannotRead)?;
    from_bytes(&data)
}

/// Write a property list to a sink in the given format
///
/// On success the number of bytes written is returned. On failure nothing
/// useful was written and the first error the encoder hit is returned.
pub fn to_writer<W: Write>(
    value: &Value,
    sink: W,
    format: PlistFormat,
) -> Result<u64, PlistError> {
    let mut stream = PlistWriteStream::new(sink);
    match format {
        PlistFormat::Binary => binary::encode(value, &mut stream),
        PlistFormat::Xml => xml::encode(value, &mut stream),
        PlistFormat::OpenStep => openstep::encode(value, &mut stream),
    }
    stream.finish()
}

/// Serialize a property list to a byte vector in the given format
pub fn to_bytes(value: &Value, format: PlistFormat) -> Result<Vec<u8>, PlistError> {
    let mut data = Vec::new();
    to_writer(value, &mut data, format)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use crate::{
        error::plist::PlistError,
        format::{from_bytes, to_bytes, PlistFormat},
        value::{Dictionary, Value},
    };

    #[test]
    fn can_detect_binary() {
        let bytes = to_bytes(&Value::from(7i64), PlistFormat::Binary).unwrap();
        let (value, format) = from_bytes(&bytes).unwrap();
        assert_eq!(format, PlistFormat::Binary);
        assert_eq!(value, Value::from(7i64));
    }

    #[test]
    fn can_detect_xml() {
        let mut dict = Dictionary::new();
        dict.insert("name", "value");
        let bytes = to_bytes(&Value::Dictionary(dict.clone()), PlistFormat::Xml).unwrap();
        let (value, format) = from_bytes(&bytes).unwrap();
        assert_eq!(format, PlistFormat::Xml);
        assert_eq!(value, Value::Dictionary(dict));
    }

    #[test]
    fn can_detect_openstep() {
        let (value, format) = from_bytes(b"{ name = value; }").unwrap();
        assert_eq!(format, PlistFormat::OpenStep);
        let mut expected = Dictionary::new();
        expected.insert("name", "value");
        assert_eq!(value, Value::Dictionary(expected));
    }

    #[test]
    fn can_reject_unknown_data() {
        assert!(matches!(
            from_bytes(b"\x00\x01\x02 not a plist ;;;"),
            Err(PlistError::UnknownFormat)
        ));
    }

    #[test]
    fn can_report_binary_corruption_without_fallback() {
        // Valid magic, garbage body: must fail as binary, not fall through
        let mut bytes = b"bplist00".to_vec();
        bytes.extend_from_slice(&[0xFF; 8]);
        assert!(matches!(from_bytes(&bytes), Err(PlistError::Binary(_))));
    }

    #[test]
    fn can_report_zero_bytes_on_write_failure() {
        // Booleans have no OpenStep representation
        let result = to_bytes(&Value::Boolean(true), PlistFormat::OpenStep);
        assert!(matches!(
            result,
            Err(PlistError::UnsupportedType("boolean", PlistFormat::OpenStep))
        ));
    }
}
