/*!
 Logic for parsing binary plist data into a [`Value`] tree.

 Every offset, length, and object reference comes from the wire, so every
 read is bounds checked and container recursion is depth capped. Hostile
 data fails with a [`BinaryPlistError`] instead of panicking or looping.
*/

use crate::{
    error::binary::BinaryPlistError,
    format::binary::{HEADER, MAX_OBJECT_DEPTH, TRAILER_SIZE},
    value::{Dictionary, Integer, IntegerWidth, Real, RealWidth, Value},
};

/// The geometry block at the end of every binary plist
struct Trailer {
    offset_size: u8,
    ref_size: u8,
    num_objects: u64,
    root_object: u64,
    table_offset: u64,
}

/// Parses a binary plist into a [`Value`] tree
pub struct BinaryPlistReader<'a> {
    /// The data we are parsing
    stream: &'a [u8],
    /// Offset of each object, indexed by object id
    offsets: Vec<u64>,
    /// Width of an object reference inside a container, in bytes
    ref_size: u8,
}

impl<'a> BinaryPlistReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            offsets: Vec::new(),
            ref_size: 1,
        }
    }

    /// Parse the data, returning the root object's value
    pub fn parse(&mut self) -> Result<Value, BinaryPlistError> {
        if self.stream.len() < HEADER.len() + TRAILER_SIZE {
            return Err(BinaryPlistError::TooShort(self.stream.len()));
        }
        if !self.stream.starts_with(HEADER) {
            return Err(BinaryPlistError::BadMagic);
        }
        let trailer = self.read_trailer()?;
        self.read_offset_table(&trailer)?;
        self.ref_size = trailer.ref_size;
        let root = self.resolve_offset(trailer.root_object)?;
        self.read_object(root, 0)
    }

    fn read_trailer(&self) -> Result<Trailer, BinaryPlistError> {
        let start = self.stream.len() - TRAILER_SIZE;
        let trailer = Trailer {
            offset_size: self.stream[start + 6],
            ref_size: self.stream[start + 7],
            num_objects: self.read_be_uint(start + 8, 8)?,
            root_object: self.read_be_uint(start + 16, 8)?,
            table_offset: self.read_be_uint(start + 24, 8)?,
        };
        if !matches!(trailer.offset_size, 1 | 2 | 4 | 8) {
            return Err(BinaryPlistError::InvalidOffsetWidth(trailer.offset_size));
        }
        if !matches!(trailer.ref_size, 1 | 2 | 4 | 8) {
            return Err(BinaryPlistError::InvalidReferenceWidth(trailer.ref_size));
        }
        // Every object needs at least a marker byte, so the count cannot
        // exceed the data length
        if trailer.num_objects == 0 || trailer.num_objects > self.stream.len() as u64 {
            return Err(BinaryPlistError::InvalidObjectCount(trailer.num_objects));
        }
        Ok(trailer)
    }

    fn read_offset_table(&mut self, trailer: &Trailer) -> Result<(), BinaryPlistError> {
        let table_start = usize::try_from(trailer.table_offset)
            .map_err(|_| BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        let entry_size = usize::from(trailer.offset_size);
        let table_len = (trailer.num_objects as usize)
            .checked_mul(entry_size)
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        let table_end = table_start
            .checked_add(table_len)
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        if table_end > self.stream.len() - TRAILER_SIZE {
            return Err(BinaryPlistError::OutOfBounds(table_end, self.stream.len()));
        }
        self.offsets = (0..trailer.num_objects as usize)
            .map(|idx| self.read_be_uint(table_start + idx * entry_size, entry_size))
            .collect::<Result<Vec<u64>, BinaryPlistError>>()?;
        Ok(())
    }

    /// Turn an object reference into the offset of that object's marker
    fn resolve_offset(&self, reference: u64) -> Result<usize, BinaryPlistError> {
        let offset = usize::try_from(reference)
            .ok()
            .and_then(|idx| self.offsets.get(idx))
            .ok_or(BinaryPlistError::InvalidObjectReference(
                reference,
                self.offsets.len() as u64,
            ))?;
        usize::try_from(*offset)
            .map_err(|_| BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))
    }

    fn read_object(&self, offset: usize, depth: usize) -> Result<Value, BinaryPlistError> {
        if depth > MAX_OBJECT_DEPTH {
            return Err(BinaryPlistError::NestingTooDeep(depth));
        }
        let marker = *self
            .stream
            .get(offset)
            .ok_or(BinaryPlistError::OutOfBounds(offset, self.stream.len()))?;
        let length_nibble = marker & 0x0F;
        match marker >> 4 {
            0x0 => match marker {
                0x08 => Ok(Value::Boolean(false)),
                0x09 => Ok(Value::Boolean(true)),
                _ => Err(BinaryPlistError::InvalidMarker(marker)),
            },
            0x1 => self.read_integer(offset + 1, length_nibble, marker),
            0x2 => self.read_real(offset + 1, length_nibble, marker),
            0x3 => match length_nibble {
                3 => Ok(Value::Date(self.read_f64(offset + 1)?)),
                _ => Err(BinaryPlistError::InvalidMarker(marker)),
            },
            0x4 => {
                let (length, start) = self.read_length(offset + 1, length_nibble)?;
                Ok(Value::Data(self.read_exact_bytes(start, length)?.to_vec()))
            }
            0x5 => {
                let (length, start) = self.read_length(offset + 1, length_nibble)?;
                std::str::from_utf8(self.read_exact_bytes(start, length)?)
                    .map(|text| Value::String(text.to_string()))
                    .map_err(BinaryPlistError::StringParseError)
            }
            0x6 => {
                let (length, start) = self.read_length(offset + 1, length_nibble)?;
                self.read_utf16_string(start, length)
            }
            // Keyed archiver UIDs surface as plain data; their payload
            // length is the nibble plus one, never extended
            0x8 => {
                let length = usize::from(length_nibble) + 1;
                Ok(Value::Data(
                    self.read_exact_bytes(offset + 1, length)?.to_vec(),
                ))
            }
            0xA => {
                let (count, start) = self.read_length(offset + 1, length_nibble)?;
                Ok(Value::Array(self.read_children(start, count, depth)?))
            }
            0xC => {
                let (count, start) = self.read_length(offset + 1, length_nibble)?;
                Ok(Value::Set(self.read_children(start, count, depth)?))
            }
            0xD => {
                let (count, start) = self.read_length(offset + 1, length_nibble)?;
                self.read_dictionary(start, count, depth)
            }
            _ => Err(BinaryPlistError::InvalidMarker(marker)),
        }
    }

    fn read_integer(
        &self,
        idx: usize,
        length_nibble: u8,
        marker: u8,
    ) -> Result<Value, BinaryPlistError> {
        let width = IntegerWidth::from_exponent(length_nibble)
            .ok_or(BinaryPlistError::InvalidMarker(marker))?;
        let raw = self.read_be_uint(idx, width.byte_len())?;
        let value = match width {
            IntegerWidth::One => i64::from(raw as u8 as i8),
            IntegerWidth::Two => i64::from(raw as u16 as i16),
            IntegerWidth::Four => i64::from(raw as u32 as i32),
            IntegerWidth::Eight => raw as i64,
        };
        Ok(Value::Integer(Integer { value, width }))
    }

    fn read_real(
        &self,
        idx: usize,
        length_nibble: u8,
        marker: u8,
    ) -> Result<Value, BinaryPlistError> {
        match length_nibble {
            2 => {
                let raw = self.read_be_uint(idx, 4)? as u32;
                Ok(Value::Real(Real {
                    value: f64::from(f32::from_bits(raw)),
                    width: RealWidth::Four,
                }))
            }
            3 => Ok(Value::Real(Real {
                value: self.read_f64(idx)?,
                width: RealWidth::Eight,
            })),
            _ => Err(BinaryPlistError::InvalidMarker(marker)),
        }
    }

    fn read_f64(&self, idx: usize) -> Result<f64, BinaryPlistError> {
        Ok(f64::from_bits(self.read_be_uint(idx, 8)?))
    }

    fn read_utf16_string(&self, idx: usize, length: usize) -> Result<Value, BinaryPlistError> {
        if length % 2 != 0 {
            return Err(BinaryPlistError::InvalidUtf16Length(length));
        }
        let bytes = self.read_exact_bytes(idx, length)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units)
            .map(Value::String)
            .map_err(|_| BinaryPlistError::InvalidUtf16Length(length))
    }

    fn read_children(
        &self,
        idx: usize,
        count: usize,
        depth: usize,
    ) -> Result<Vec<Value>, BinaryPlistError> {
        (0..count)
            .map(|child| {
                let reference = self.read_reference(idx, child)?;
                let offset = self.resolve_offset(reference)?;
                self.read_object(offset, depth + 1)
            })
            .collect()
    }

    fn read_dictionary(
        &self,
        idx: usize,
        count: usize,
        depth: usize,
    ) -> Result<Value, BinaryPlistError> {
        let mut dict = Dictionary::with_capacity(count);
        for entry in 0..count {
            let key_offset = self.resolve_offset(self.read_reference(idx, entry)?)?;
            let key = match self.read_object(key_offset, depth + 1)? {
                Value::String(text) => text,
                _ => return Err(BinaryPlistError::NonStringKey),
            };
            let value_offset = self.resolve_offset(self.read_reference(idx, count + entry)?)?;
            dict.insert(key, self.read_object(value_offset, depth + 1)?);
        }
        Ok(Value::Dictionary(dict))
    }

    /// Read the `position`th object reference of a container whose reference
    /// block starts at `idx`
    fn read_reference(&self, idx: usize, position: usize) -> Result<u64, BinaryPlistError> {
        let entry_size = usize::from(self.ref_size);
        let start = position
            .checked_mul(entry_size)
            .and_then(|skip| idx.checked_add(skip))
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        self.read_be_uint(start, entry_size)
    }

    /// Decode an object's length, returning it and the payload start
    ///
    /// Lengths below 15 live in the marker nibble. A nibble of `0xF` means
    /// the length follows as a big-endian integer whose byte width is two to
    /// the power of the next byte's low bits.
    fn read_length(
        &self,
        idx: usize,
        length_nibble: u8,
    ) -> Result<(usize, usize), BinaryPlistError> {
        if length_nibble < 0xF {
            return Ok((usize::from(length_nibble), idx));
        }
        let descriptor = *self
            .stream
            .get(idx)
            .ok_or(BinaryPlistError::OutOfBounds(idx, self.stream.len()))?;
        let width = 1usize << (descriptor & 0x3);
        let length = self.read_be_uint(idx + 1, width)?;
        let length = usize::try_from(length)
            .map_err(|_| BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        Ok((length, idx + 1 + width))
    }

    /// Read `count` bytes starting at `start`, failing if they extend past
    /// the end of the data
    fn read_exact_bytes(&self, start: usize, count: usize) -> Result<&'a [u8], BinaryPlistError> {
        let end = start
            .checked_add(count)
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        self.stream
            .get(start..end)
            .ok_or(BinaryPlistError::OutOfBounds(end, self.stream.len()))
    }

    /// Read a big-endian unsigned integer of `width` bytes at `idx`
    fn read_be_uint(&self, idx: usize, width: usize) -> Result<u64, BinaryPlistError> {
        let bytes = self.read_exact_bytes(idx, width)?;
        Ok(bytes
            .iter()
            .fold(0u64, |total, byte| (total << 8) | u64::from(*byte)))
    }
}
