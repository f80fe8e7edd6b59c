/*!
 The legacy OpenStep text format.

 The grammar has four productions: `{ key = value; }` dictionaries,
 `( a, b )` arrays, `<414243>` hex data, and strings, which are quoted only
 when they contain characters outside the safe set. Dictionaries serialize
 with their keys sorted ascending. `//` and `/* */` comments are valid
 anywhere whitespace is.

 Only strings, data, arrays, and dictionaries exist in this format; the
 encoder rejects everything else.
*/

use std::io::Write;

use crate::{
    error::{openstep::OpenStepError, plist::PlistError},
    format::PlistFormat,
    util::stream::PlistWriteStream,
    value::{Dictionary, Value, MAX_NESTING_DEPTH},
};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Bitmask over code points 0..128 of the characters that force a string to
/// be quoted. Only ASCII letters and digits are safe as bareword characters;
/// everything else, including all bytes at or above 128, is quotable.
const QUOTABLES: [u32; 4] = [0xFFFF_FFFF, 0xFC00_FFFF, 0xF800_0001, 0xF800_0001];

fn is_quotable(byte: u8) -> bool {
    byte >= 0x80 || (QUOTABLES[(byte >> 5) as usize] & (1 << (byte & 0x1F))) != 0
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parse OpenStep plist text into a value
pub fn decode(data: &[u8]) -> Result<Value, OpenStepError> {
    let mut reader = OpenStepReader::new(data);
    reader.skip_bom();
    let value = reader.parse_object(0)?;
    reader.skip_ignorable()?;
    if reader.idx < reader.stream.len() {
        return Err(OpenStepError::TrailingCharacters(reader.idx));
    }
    Ok(value)
}

/// A cursor over OpenStep plist text
struct OpenStepReader<'a> {
    /// The text we are reading
    stream: &'a [u8],
    /// The current position in the stream
    idx: usize,
}

impl<'a> OpenStepReader<'a> {
    fn new(stream: &'a [u8]) -> Self {
        Self { stream, idx: 0 }
    }

    fn skip_bom(&mut self) {
        if self.stream.starts_with(&UTF8_BOM) {
            self.idx = UTF8_BOM.len();
        }
    }

    fn at_end(&self) -> bool {
        self.idx >= self.stream.len()
    }

    fn current_byte(&self) -> Result<u8, OpenStepError> {
        self.stream
            .get(self.idx)
            .copied()
            .ok_or(OpenStepError::UnexpectedEnd)
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.stream.get(self.idx + ahead).copied()
    }

    /// Skip whitespace and comments; errors only on an unterminated comment
    fn skip_ignorable(&mut self) -> Result<(), OpenStepError> {
        loop {
            match self.peek_byte(0) {
                Some(byte) if byte.is_ascii_whitespace() || byte == 0x0B => self.idx += 1,
                Some(b'/') => match self.peek_byte(1) {
                    Some(b'/') => {
                        self.idx += 2;
                        while !self.at_end() && self.stream[self.idx] != b'\n' {
                            self.idx += 1;
                        }
                    }
                    Some(b'*') => {
                        self.idx += 2;
                        loop {
                            if self.idx + 1 >= self.stream.len() {
                                return Err(OpenStepError::UnterminatedComment);
                            }
                            if self.stream[self.idx] == b'*' && self.stream[self.idx + 1] == b'/' {
                                self.idx += 2;
                                break;
                            }
                            self.idx += 1;
                        }
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, OpenStepError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(OpenStepError::NestingTooDeep(depth));
        }
        self.skip_ignorable()?;
        match self.current_byte()? {
            b'{' => {
                self.idx += 1;
                self.parse_dictionary(depth)
            }
            b'(' => {
                self.idx += 1;
                self.parse_array(depth)
            }
            b'<' => {
                self.idx += 1;
                self.parse_data()
            }
            _ => Ok(Value::String(self.parse_string()?)),
        }
    }

    fn parse_dictionary(&mut self, depth: usize) -> Result<Value, OpenStepError> {
        let mut dict = Dictionary::new();
        loop {
            self.skip_ignorable()?;
            if self.current_byte()? == b'}' {
                self.idx += 1;
                return Ok(Value::Dictionary(dict));
            }
            let key = self.parse_string()?;
            self.skip_ignorable()?;
            if self.current_byte()? != b'=' {
                return Err(OpenStepError::MissingEquals);
            }
            self.idx += 1;
            let value = self.parse_object(depth + 1)?;
            self.skip_ignorable()?;
            if self.current_byte()? != b';' {
                return Err(OpenStepError::MissingSemicolon);
            }
            self.idx += 1;
            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, OpenStepError> {
        let mut items = Vec::new();
        self.skip_ignorable()?;
        if self.current_byte()? == b')' {
            self.idx += 1;
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.parse_object(depth + 1)?);
            self.skip_ignorable()?;
            match self.current_byte()? {
                b',' => self.idx += 1,
                b')' => {
                    self.idx += 1;
                    return Ok(Value::Array(items));
                }
                other => return Err(OpenStepError::MissingArraySeparator(other)),
            }
        }
    }

    fn parse_data(&mut self) -> Result<Value, OpenStepError> {
        let mut bytes = Vec::new();
        loop {
            self.skip_ignorable()?;
            if self.at_end() {
                return Err(OpenStepError::UnterminatedData);
            }
            let first = self.stream[self.idx];
            if first == b'>' {
                self.idx += 1;
                return Ok(Value::Data(bytes));
            }
            let high = hex_nibble(first).ok_or(OpenStepError::InvalidDataCharacter(first))?;
            self.idx += 1;
            if self.at_end() {
                return Err(OpenStepError::UnterminatedData);
            }
            let second = self.stream[self.idx];
            if second == b'>' {
                return Err(OpenStepError::OddHexDigits);
            }
            let low = hex_nibble(second).ok_or(OpenStepError::InvalidDataCharacter(second))?;
            self.idx += 1;
            bytes.push(high << 4 | low);
        }
    }

    fn parse_string(&mut self) -> Result<String, OpenStepError> {
        self.skip_ignorable()?;
        let first = self.current_byte()?;
        if first == b'"' {
            self.idx += 1;
            self.parse_quoted_string()
        } else if !is_quotable(first) {
            self.parse_bareword()
        } else {
            Err(OpenStepError::UnexpectedCharacter(first))
        }
    }

    fn parse_bareword(&mut self) -> Result<String, OpenStepError> {
        let start = self.idx;
        while !self.at_end() && !is_quotable(self.stream[self.idx]) {
            self.idx += 1;
        }
        std::str::from_utf8(&self.stream[start..self.idx])
            .map(str::to_string)
            .map_err(OpenStepError::StringParseError)
    }

    fn parse_quoted_string(&mut self) -> Result<String, OpenStepError> {
        let mut out = Vec::new();
        loop {
            if self.at_end() {
                return Err(OpenStepError::UnterminatedString);
            }
            let byte = self.stream[self.idx];
            self.idx += 1;
            match byte {
                b'"' => break,
                b'\\' => self.parse_escape(&mut out)?,
                other => out.push(other),
            }
        }
        String::from_utf8(out)
            .map_err(|why| OpenStepError::StringParseError(why.utf8_error()))
    }

    /// Decode one backslash escape and append it to `out`
    ///
    /// Named escapes cover the control characters the encoder emits plus the
    /// traditional `\n` `\r` `\t`; numeric escapes are up to three octal
    /// digits or `\u`/`\U` with exactly four hex digits. Any other escaped
    /// byte stands for itself.
    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<(), OpenStepError> {
        if self.at_end() {
            return Err(OpenStepError::UnterminatedString);
        }
        let byte = self.stream[self.idx];
        self.idx += 1;
        match byte {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'v' => out.push(0x0B),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'0'..=b'7' => {
                let mut value = u32::from(byte - b'0');
                for _ in 0..2 {
                    match self.peek_byte(0) {
                        Some(digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            self.idx += 1;
                        }
                        _ => break,
                    }
                }
                let scalar = char::from_u32(value)
                    .ok_or(OpenStepError::InvalidUnicodeEscape(value))?;
                let mut encoded = [0; 4];
                out.extend_from_slice(scalar.encode_utf8(&mut encoded).as_bytes());
            }
            b'u' | b'U' => {
                let mut value: u32 = 0;
                for _ in 0..4 {
                    let digit = hex_nibble(self.current_byte()?)
                        .ok_or(OpenStepError::InvalidUnicodeEscape(value))?;
                    value = value * 16 + u32::from(digit);
                    self.idx += 1;
                }
                let scalar = char::from_u32(value)
                    .ok_or(OpenStepError::InvalidUnicodeEscape(value))?;
                let mut encoded = [0; 4];
                out.extend_from_slice(scalar.encode_utf8(&mut encoded).as_bytes());
            }
            other => out.push(other),
        }
        Ok(())
    }
}

/// Write a value as OpenStep plist text
///
/// Output starts with a UTF-8 byte order mark. Errors latch into the stream.
pub fn encode<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>) {
    stream.write(&UTF8_BOM);
    write_object(value, stream, 0);
}

fn write_object<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>, level: usize) {
    if stream.has_error() {
        return;
    }
    if level > MAX_NESTING_DEPTH {
        stream.set_error(PlistError::NestingTooDeep(level));
        return;
    }
    match value {
        Value::String(text) => write_string(text, stream),
        Value::Data(bytes) => write_data(bytes, stream),
        Value::Array(items) => {
            stream.write(b"(\n");
            for (idx, item) in items.iter().enumerate() {
                stream.write_indent(level + 1);
                write_object(item, stream, level + 1);
                if idx + 1 < items.len() {
                    stream.write_byte(b',');
                }
                stream.write_byte(b'\n');
            }
            stream.write_indent(level);
            stream.write_byte(b')');
        }
        Value::Dictionary(dict) => {
            stream.write(b"{\n");
            for key in dict.sorted_keys() {
                stream.write_indent(level + 1);
                write_string(key, stream);
                stream.write(b" = ");
                if let Some(entry) = dict.get(key) {
                    write_object(entry, stream, level + 1);
                }
                stream.write(b";\n");
            }
            stream.write_indent(level);
            stream.write_byte(b'}');
        }
        other => stream.set_error(PlistError::UnsupportedType(
            other.type_name(),
            PlistFormat::OpenStep,
        )),
    }
}

fn write_string<W: Write>(text: &str, stream: &mut PlistWriteStream<W>) {
    if !text.is_empty() && !text.bytes().any(is_quotable) {
        stream.write(text.as_bytes());
        return;
    }
    stream.write_byte(b'"');
    for byte in text.bytes() {
        match byte {
            0x07 => stream.write(b"\\a"),
            0x08 => stream.write(b"\\b"),
            0x0B => stream.write(b"\\v"),
            0x0C => stream.write(b"\\f"),
            b'"' => stream.write(b"\\\""),
            b'\\' => stream.write(b"\\\\"),
            other => stream.write_byte(other),
        }
    }
    stream.write_byte(b'"');
}

fn write_data<W: Write>(bytes: &[u8], stream: &mut PlistWriteStream<W>) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    stream.write_byte(b'<');
    for byte in bytes {
        stream.write_byte(DIGITS[usize::from(byte >> 4)]);
        stream.write_byte(DIGITS[usize::from(byte & 0xF)]);
    }
    stream.write_byte(b'>');
}

#[cfg(test)]
mod tests {
    use crate::{
        error::openstep::OpenStepError,
        format::openstep::{decode, encode, is_quotable},
        util::stream::PlistWriteStream,
        value::{Dictionary, Value},
    };

    fn render(value: &Value) -> String {
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        encode(value, &mut stream);
        stream.finish().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn can_classify_quotable_characters() {
        for safe in [b'a', b'z', b'A', b'Z', b'0', b'9'] {
            assert!(!is_quotable(safe), "{} should be safe", safe as char);
        }
        for unsafe_byte in [
            b' ', b'\t', b'\n', b'"', b'(', b')', b'{', b'}', b'=', b';', b',', b'<', b'>',
            b'/', b'\\', b'_', b'.', 0x00, 0x7F, 0x80, 0xFF,
        ] {
            assert!(is_quotable(unsafe_byte), "{unsafe_byte:#x} should be quotable");
        }
    }

    #[test]
    fn can_write_sorted_dictionary() {
        let mut dict = Dictionary::new();
        dict.insert("zebra", "last");
        dict.insert("apple", "first");
        let text = render(&Value::Dictionary(dict));
        assert_eq!(text, "\u{FEFF}{\n\tapple = first;\n\tzebra = last;\n}");
    }

    #[test]
    fn can_write_array_layout() {
        let value = Value::Array(vec![Value::from("one"), Value::from("two")]);
        assert_eq!(render(&value), "\u{FEFF}(\n\tone,\n\ttwo\n)");
    }

    #[test]
    fn can_quote_when_needed() {
        assert_eq!(render(&Value::from("plain")), "\u{FEFF}plain");
        assert_eq!(render(&Value::from("")), "\u{FEFF}\"\"");
        assert_eq!(render(&Value::from("two words")), "\u{FEFF}\"two words\"");
        assert_eq!(render(&Value::from("say \"hi\"")), "\u{FEFF}\"say \\\"hi\\\"\"");
        assert_eq!(render(&Value::from("a\u{0B}b")), "\u{FEFF}\"a\\vb\"");
    }

    #[test]
    fn can_write_hex_data() {
        let value = Value::Data(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(render(&value), "\u{FEFF}<DEADBEEF>");
    }

    #[test]
    fn can_parse_dictionary() {
        let value = decode(b"{ name = \"hello world\"; count = c12; }").unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.get("name"), Some(&Value::from("hello world")));
        assert_eq!(dict.get("count"), Some(&Value::from("c12")));
    }

    #[test]
    fn can_parse_nested_containers() {
        let value = decode(b"{ list = (a, b, { inner = <0102> ; }); }").unwrap();
        let list = value.as_dictionary().unwrap().get("list").unwrap();
        let items = list.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::from("a"));
        let inner = items[2].as_dictionary().unwrap();
        assert_eq!(inner.get("inner"), Some(&Value::Data(vec![1, 2])));
    }

    #[test]
    fn can_parse_empty_containers() {
        assert_eq!(decode(b"{}").unwrap(), Value::Dictionary(Dictionary::new()));
        assert_eq!(decode(b"()").unwrap(), Value::Array(vec![]));
        assert_eq!(decode(b"<>").unwrap(), Value::Data(vec![]));
    }

    #[test]
    fn can_skip_comments() {
        let text = b"// leading\n{ /* inline */ key = value; // trailing\n}";
        let value = decode(text).unwrap();
        assert_eq!(
            value.as_dictionary().unwrap().get("key"),
            Some(&Value::from("value"))
        );
    }

    #[test]
    fn can_parse_escapes() {
        let value = decode(b"\"a\\u0041\\101\\a\\n\"").unwrap();
        assert_eq!(value, Value::from("aAA\u{07}\n"));
        let value = decode(b"\"back\\\\slash\"").unwrap();
        assert_eq!(value, Value::from("back\\slash"));
    }

    #[test]
    fn can_parse_data_with_spaces() {
        let value = decode(b"< DE AD BE EF >").unwrap();
        assert_eq!(value, Value::Data(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[test]
    fn can_reject_malformed_input() {
        assert!(matches!(
            decode(b"{ key value; }"),
            Err(OpenStepError::MissingEquals)
        ));
        assert!(matches!(
            decode(b"{ key = value }"),
            Err(OpenStepError::MissingSemicolon)
        ));
        assert!(matches!(
            decode(b"(a b)"),
            Err(OpenStepError::MissingArraySeparator(b'b'))
        ));
        assert!(matches!(
            decode(b"<0102"),
            Err(OpenStepError::UnterminatedData)
        ));
        assert!(matches!(decode(b"<012>"), Err(OpenStepError::OddHexDigits)));
        assert!(matches!(
            decode(b"\"no closing quote"),
            Err(OpenStepError::UnterminatedString)
        ));
        assert!(matches!(
            decode(b"/* never closed"),
            Err(OpenStepError::UnterminatedComment)
        ));
        assert!(matches!(
            decode(b"{ a = b; } extra"),
            Err(OpenStepError::TrailingCharacters(_))
        ));
        assert!(matches!(decode(b""), Err(OpenStepError::UnexpectedEnd)));
    }

    #[test]
    fn can_reject_deep_nesting() {
        let mut text = Vec::new();
        text.extend(std::iter::repeat(b'(').take(600));
        text.push(b'a');
        text.extend(std::iter::repeat(b')').take(600));
        assert!(matches!(
            decode(&text),
            Err(OpenStepError::NestingTooDeep(_))
        ));
    }

    #[test]
    fn can_round_trip() {
        let mut inner = Dictionary::new();
        inner.insert("payload", Value::Data(vec![0x01, 0xFF]));
        let mut dict = Dictionary::new();
        dict.insert("zeta", "needs quoting here");
        dict.insert("alpha", Value::Array(vec![Value::from("x"), Value::from("y")]));
        dict.insert("nested", Value::Dictionary(inner));
        let original = Value::Dictionary(dict);

        let text = render(&original);
        let parsed = decode(text.as_bytes()).unwrap();
        assert_eq!(parsed, original);
    }
}
