/*!
 The `bplist00` binary format.

 A binary plist is the 8-byte magic number, a flat pool of serialized
 objects, an offset table locating each object by id, and a 32-byte trailer
 naming the table geometry and the root object. Containers hold object ids
 rather than inline children, and children serialize before their parent.
*/

use std::io::Write;

use crate::{
    error::binary::BinaryPlistError, util::stream::PlistWriteStream, value::Value,
};

pub mod parser;
pub mod writer;

mod tests;

/// The magic number every binary plist starts with
pub(crate) const HEADER: &[u8] = b"bplist00";

/// Container depth limit for the binary codec
///
/// The parser's stack frames are large, so this stays far below the depth at
/// which recursion could exhaust a thread stack. A self-referential offset
/// table recurses until this trips.
pub(crate) const MAX_OBJECT_DEPTH: usize = 128;

/// Byte length of the trailer at the end of every binary plist
pub(crate) const TRAILER_SIZE: usize = 32;

/// Parse a binary plist into a value
pub fn decode(data: &[u8]) -> Result<Value, BinaryPlistError> {
    parser::BinaryPlistReader::new(data).parse()
}

/// Write a value as a binary plist. Errors latch into the stream.
pub fn encode<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>) {
    writer::write(value, stream);
}
