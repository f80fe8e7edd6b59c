/*!
 The XML property list format.

 Encoding emits the fixed `<?xml?>`/DOCTYPE header, one element per value
 with tab indentation, dictionary entries in their native order, base64
 `<data>` payloads, and UTC `<date>` timestamps with seconds truncated.

 Decoding builds a small element tree from `quick_xml` events and then walks
 it: the root must be a `plist` element holding exactly one value, and every
 `dict` must alternate `key` elements with value elements.
*/

use std::io::Write;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use quick_xml::{events::Event, Reader};

use crate::{
    error::{plist::PlistError, xml::XmlPlistError},
    format::PlistFormat,
    util::{dates, stream::PlistWriteStream},
    value::{Dictionary, Integer, Real, RealWidth, Value, MAX_NESTING_DEPTH},
};

pub(crate) const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
    "<plist version=\"1.0\">\n"
);

/// Write a value as an XML plist document. Errors latch into the stream.
pub fn encode<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>) {
    stream.write(HEADER.as_bytes());
    write_object(value, stream, 0);
    stream.write(b"</plist>\n");
}

fn write_object<W: Write>(value: &Value, stream: &mut PlistWriteStream<W>, level: usize) {
    if stream.has_error() {
        return;
    }
    if level > MAX_NESTING_DEPTH {
        stream.set_error(PlistError::NestingTooDeep(level));
        return;
    }
    stream.write_indent(level);
    match value {
        Value::Boolean(true) => stream.write(b"<true/>"),
        Value::Boolean(false) => stream.write(b"<false/>"),
        Value::Integer(Integer { value, .. }) => {
            stream.write(format!("<integer>{value}</integer>").as_bytes());
        }
        Value::Real(Real { value, .. }) => {
            stream.write(format!("<real>{value}</real>").as_bytes());
        }
        Value::Date(seconds) => match dates::format_xml_date(*seconds) {
            Some(date) => stream.write(format!("<date>{date}</date>").as_bytes()),
            None => {
                stream.set_error(PlistError::DateOutOfRange(*seconds));
                return;
            }
        },
        Value::Data(bytes) => {
            stream.write(b"<data>");
            stream.write(BASE64.encode(bytes).as_bytes());
            stream.write(b"</data>");
        }
        Value::String(text) => {
            stream.write(b"<string>");
            write_escaped(text, stream);
            stream.write(b"</string>");
        }
        Value::Array(items) => {
            stream.write(b"<array>\n");
            for item in items {
                write_object(item, stream, level + 1);
            }
            stream.write_indent(level);
            stream.write(b"</array>");
        }
        Value::Dictionary(dict) => {
            stream.write(b"<dict>\n");
            for (key, entry) in dict.iter() {
                stream.write_indent(level + 1);
                stream.write(b"<key>");
                write_escaped(key, stream);
                stream.write(b"</key>\n");
                write_object(entry, stream, level + 1);
            }
            stream.write_indent(level);
            stream.write(b"</dict>");
        }
        Value::Set(_) => {
            stream.set_error(PlistError::UnsupportedType(
                value.type_name(),
                PlistFormat::Xml,
            ));
            return;
        }
    }
    stream.write_byte(b'\n');
}

fn write_escaped<W: Write>(text: &str, stream: &mut PlistWriteStream<W>) {
    for character in text.chars() {
        match character {
            '&' => stream.write(b"&amp;"),
            '<' => stream.write(b"&lt;"),
            '>' => stream.write(b"&gt;"),
            other => {
                let mut encoded = [0; 4];
                stream.write(other.encode_utf8(&mut encoded).as_bytes());
            }
        }
    }
}

/// A parsed element: name, child elements, and accumulated text
struct XmlNode {
    name: String,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }
}

/// Parse an XML plist document into a value
pub fn decode(text: &str) -> Result<Value, XmlPlistError> {
    let root = parse_document(text)?;
    if root.name != "plist" {
        return Err(XmlPlistError::NotAPlist);
    }
    let mut children = root.children.iter();
    let node = children.next().ok_or(XmlPlistError::MissingRootElement)?;
    if children.next().is_some() {
        return Err(XmlPlistError::MultipleRootElements);
    }
    value_from_node(node, 0)
}

fn parse_document(text: &str) -> Result<XmlNode, XmlPlistError> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    loop {
        match reader.read_event().map_err(XmlPlistError::Malformed)? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                open.push(XmlNode::new(name));
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                attach(XmlNode::new(name), &mut open, &mut root)?;
            }
            Event::End(_) => {
                // quick_xml has already checked that the tag names balance
                let node = open.pop().ok_or(XmlPlistError::UnexpectedEndTag)?;
                attach(node, &mut open, &mut root)?;
            }
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(XmlPlistError::Malformed)?;
                if let Some(top) = open.last_mut() {
                    top.text.push_str(&unescaped);
                }
            }
            Event::CData(data) => {
                if let Some(top) = open.last_mut() {
                    top.text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            // Declaration, DOCTYPE, comments, processing instructions
            _ => {}
        }
    }
    root.ok_or(XmlPlistError::MissingRootElement)
}

fn attach(
    node: XmlNode,
    open: &mut Vec<XmlNode>,
    root: &mut Option<XmlNode>,
) -> Result<(), XmlPlistError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_some() {
                return Err(XmlPlistError::MultipleRootElements);
            }
            *root = Some(node);
        }
    }
    Ok(())
}

fn value_from_node(node: &XmlNode, depth: usize) -> Result<Value, XmlPlistError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(XmlPlistError::NestingTooDeep(depth));
    }
    match node.name.as_str() {
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        "string" => Ok(Value::String(node.text.clone())),
        "integer" => {
            let text = node.text.trim();
            text.parse::<i64>()
                .map(|value| Value::Integer(Integer::new(value)))
                .map_err(|_| XmlPlistError::InvalidInteger(text.to_string()))
        }
        "real" => {
            let text = node.text.trim();
            text.parse::<f64>()
                .map(|value| {
                    Value::Real(Real {
                        value,
                        width: RealWidth::Eight,
                    })
                })
                .map_err(|_| XmlPlistError::InvalidReal(text.to_string()))
        }
        "date" => {
            let text = node.text.trim();
            dates::parse_xml_date(text)
                .map(Value::Date)
                .ok_or_else(|| XmlPlistError::InvalidDate(text.to_string()))
        }
        "data" => {
            let compact: String = node
                .text
                .chars()
                .filter(|character| !character.is_ascii_whitespace())
                .collect();
            BASE64
                .decode(&compact)
                .map(Value::Data)
                .map_err(|_| XmlPlistError::InvalidData(compact))
        }
        "array" => {
            let items = node
                .children
                .iter()
                .map(|child| value_from_node(child, depth + 1))
                .collect::<Result<Vec<Value>, XmlPlistError>>()?;
            Ok(Value::Array(items))
        }
        "dict" => {
            let mut dict = Dictionary::with_capacity(node.children.len() / 2);
            let mut children = node.children.iter();
            while let Some(key_node) = children.next() {
                if key_node.name != "key" {
                    return Err(XmlPlistError::ValueWithoutKey);
                }
                let value_node = children.next().ok_or(XmlPlistError::KeyWithoutValue)?;
                if value_node.name == "key" {
                    return Err(XmlPlistError::KeyWithoutValue);
                }
                dict.insert(
                    key_node.text.clone(),
                    value_from_node(value_node, depth + 1)?,
                );
            }
            Ok(Value::Dictionary(dict))
        }
        other => Err(XmlPlistError::UnknownElement(other.to_string())),
    }
}
