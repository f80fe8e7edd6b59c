/*!
 Logic for serializing a [`Value`] tree as binary plist data.

 Objects serialize in post order: a container's children are written, and
 assigned ids, before the container itself. Object id 0 is reserved for the
 root before anything is written, so the root's table slot is patched in
 once its offset is known.
*/

use std::io::Write;

use crate::{
    error::plist::PlistError,
    format::binary::{HEADER, MAX_OBJECT_DEPTH},
    util::stream::PlistWriteStream,
    value::{Integer, IntegerWidth, Real, RealWidth, Value},
};

/// Write `value` as a complete binary plist
pub fn write<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>) {
    let object_count = count_objects(value);
    // Two reference bytes address at most 65535 objects; anything larger
    // would wrap onto the wrong objects
    if object_count > 0xFFFF {
        stream.set_error(PlistError::TooManyObjects(object_count));
        return;
    }
    stream.write(HEADER);
    let ref_size: u8 = if object_count > 0xFF { 2 } else { 1 };

    // Slot 0 belongs to the root; children claim ids as they are written
    let mut offsets: Vec<u64> = vec![0];
    let root_offset = write_object(value, stream, &mut offsets, ref_size, 0);
    if stream.has_error() {
        return;
    }
    offsets[0] = root_offset;

    let offset_size: u8 = if stream.written() > 0xFFFF {
        4
    } else if stream.written() > 0xFF {
        2
    } else {
        1
    };
    let table_offset = stream.written();
    for &offset in &offsets {
        write_offset(stream, offset_size, offset);
    }

    stream.write(&[0; 6]);
    stream.write_byte(offset_size);
    stream.write_byte(ref_size);
    stream.write(&object_count.to_be_bytes());
    stream.write(&0u64.to_be_bytes());
    stream.write(&table_offset.to_be_bytes());
}

/// Total objects the value will serialize as, dictionary keys included
fn count_objects(value: &Value) -> u64 {
    match value {
        Value::Array(items) | Value::Set(items) => {
            1 + items.iter().map(count_objects).sum::<u64>()
        }
        Value::Dictionary(dict) => {
            1 + dict.len() as u64 + dict.values().map(count_objects).sum::<u64>()
        }
        _ => 1,
    }
}

/// Serialize one object, returning the offset of its marker byte
///
/// Children are appended to the offset table as they finish; a child's
/// object id is its table index at that moment.
fn write_object<W: Write>(
    value: &Value,
    stream: &mut PlistWriteStream<W>,
    offsets: &mut Vec<u64>,
    ref_size: u8,
    depth: usize,
) -> u64 {
    if stream.has_error() {
        return 0;
    }
    if depth > MAX_OBJECT_DEPTH {
        stream.set_error(PlistError::NestingTooDeep(depth));
        return 0;
    }
    match value {
        Value::Boolean(flag) => {
            let offset = stream.written();
            stream.write_byte(if *flag { 0x09 } else { 0x08 });
            offset
        }
        Value::Integer(Integer { value, width }) => {
            let offset = stream.written();
            stream.write_byte(0x10 | width.exponent());
            match width {
                IntegerWidth::One => stream.write(&(*value as i8).to_be_bytes()),
                IntegerWidth::Two => stream.write(&(*value as i16).to_be_bytes()),
                IntegerWidth::Four => stream.write(&(*value as i32).to_be_bytes()),
                IntegerWidth::Eight => stream.write(&value.to_be_bytes()),
            }
            offset
        }
        Value::Real(Real { value, width }) => {
            let offset = stream.written();
            match width {
                RealWidth::Four => {
                    stream.write_byte(0x22);
                    stream.write(&(*value as f32).to_be_bytes());
                }
                RealWidth::Eight => {
                    stream.write_byte(0x23);
                    stream.write(&value.to_be_bytes());
                }
            }
            offset
        }
        Value::Date(seconds) => {
            let offset = stream.written();
            stream.write_byte(0x33);
            stream.write(&seconds.to_be_bytes());
            offset
        }
        Value::Data(bytes) => {
            let offset = stream.written();
            write_marker_with_length(stream, 0x40, bytes.len());
            stream.write(bytes);
            offset
        }
        Value::String(text) => write_string_object(text, stream),
        Value::Array(items) | Value::Set(items) => {
            let marker = if matches!(value, Value::Array(_)) {
                0xA0
            } else {
                0xC0
            };
            let mut references = Vec::with_capacity(items.len());
            for item in items {
                let child = write_object(item, stream, offsets, ref_size, depth + 1);
                offsets.push(child);
                references.push((offsets.len() - 1) as u64);
            }
            let offset = stream.written();
            write_marker_with_length(stream, marker, items.len());
            for reference in references {
                write_reference(stream, ref_size, reference);
            }
            offset
        }
        Value::Dictionary(dict) => {
            let mut references = Vec::with_capacity(dict.len() * 2);
            for (key, _) in dict.iter() {
                let child = write_string_object(key, stream);
                offsets.push(child);
                references.push((offsets.len() - 1) as u64);
            }
            for entry in dict.values() {
                let child = write_object(entry, stream, offsets, ref_size, depth + 1);
                offsets.push(child);
                references.push((offsets.len() - 1) as u64);
            }
            let offset = stream.written();
            write_marker_with_length(stream, 0xD0, dict.len());
            for reference in references {
                write_reference(stream, ref_size, reference);
            }
            offset
        }
    }
}

/// Serialize a string object: ASCII as-is, anything else as UTF-16BE with
/// its byte length in the marker
fn write_string_object<W: Write>(text: &str, stream: &mut PlistWriteStream<W>) -> u64 {
    let offset = stream.written();
    if text.is_ascii() {
        write_marker_with_length(stream, 0x50, text.len());
        stream.write(text.as_bytes());
    } else {
        let units: Vec<u16> = text.encode_utf16().collect();
        write_marker_with_length(stream, 0x60, units.len() * 2);
        for unit in units {
            stream.write(&unit.to_be_bytes());
        }
    }
    offset
}

/// Write a marker byte and its length, spilling lengths of 15 and up into
/// a big-endian integer prefixed by `0x10 | log2(width)`
fn write_marker_with_length<W: Write>(
    stream: &mut PlistWriteStream<W>,
    marker: u8,
    length: usize,
) {
    if length < 0xF {
        stream.write_byte(marker | length as u8);
        return;
    }
    stream.write_byte(marker | 0xF);
    if length <= 0xFF {
        stream.write_byte(0x10);
        stream.write_byte(length as u8);
    } else if length <= 0xFFFF {
        stream.write_byte(0x11);
        stream.write(&(length as u16).to_be_bytes());
    } else if length <= 0xFFFF_FFFF {
        stream.write_byte(0x12);
        stream.write(&(length as u32).to_be_bytes());
    } else {
        stream.write_byte(0x13);
        stream.write(&(length as u64).to_be_bytes());
    }
}

fn write_reference<W: Write>(stream: &mut PlistWriteStream<W>, ref_size: u8, reference: u64) {
    if ref_size == 1 {
        stream.write_byte(reference as u8);
    } else {
        stream.write(&(reference as u16).to_be_bytes());
    }
}

fn write_offset<W: Write>(stream: &mut PlistWriteStream<W>, offset_size: u8, offset: u64) {
    match offset_size {
        1 => stream.write_byte(offset as u8),
        2 => stream.write(&(offset as u16).to_be_bytes()),
        _ => stream.write(&(offset as u32).to_be_bytes()),
    }
}
