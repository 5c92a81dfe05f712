// 🧾 Flat XML Records
//
// Reference-data files share one shape:
//
//   <root generator="...">
//     <record><field>value</field>...</record>
//     ...
//   </root>
//
// Only two levels below the root are read. Deeper elements are ignored.

use crate::error::{AdminError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

/// One child element of the root, with its fields' text
#[derive(Debug, Clone, Default)]
pub struct XmlRecord {
    pub tag: String,
    fields: HashMap<String, String>,
}

impl XmlRecord {
    /// Trimmed field text, empty when the field is absent
    pub fn text(&self, field: &str) -> &str {
        self.fields.get(field).map(|s| s.trim()).unwrap_or("")
    }

    /// Field parsed as integer; absent or non-numeric → None
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.text(field).parse().ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    pub root: String,
    attributes: HashMap<String, String>,
    pub records: Vec<XmlRecord>,
}

impl XmlDocument {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Records with the given tag, in document order
    pub fn records_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlRecord> + 'a {
        self.records.iter().filter(move |r| r.tag == tag)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AdminError::io(path, e))?;
        Self::parse(&content).map_err(|message| AdminError::parse(path, message))
    }

    /// Parse a document; the error is a human-readable message
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut document = XmlDocument::default();
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut current: Option<XmlRecord> = None;
        let mut field: Option<String> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;

            match event {
                Event::Start(start) => {
                    depth += 1;
                    Self::open_element(&mut document, &start, depth, &mut seen_root, &mut current, &mut field)?;
                }
                Event::Empty(start) => {
                    // <tag/> behaves like an element with no text
                    Self::open_element(&mut document, &start, depth + 1, &mut seen_root, &mut current, &mut field)?;
                    Self::close_element(&mut document, depth + 1, &mut current, &mut field);
                }
                Event::End(_) => {
                    Self::close_element(&mut document, depth, &mut current, &mut field);
                    depth = depth.saturating_sub(1);
                }
                Event::Text(text) => {
                    if depth == 3 {
                        let value = text.unescape().map_err(|e| e.to_string())?;
                        Self::append_text(&mut current, &field, &value);
                    }
                }
                Event::CData(data) => {
                    if depth == 3 {
                        let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        Self::append_text(&mut current, &field, &value);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err("document has no root element".to_string());
        }
        if depth != 0 {
            return Err("unexpected end of document".to_string());
        }

        Ok(document)
    }

    fn open_element(
        document: &mut XmlDocument,
        start: &BytesStart<'_>,
        depth: usize,
        seen_root: &mut bool,
        current: &mut Option<XmlRecord>,
        field: &mut Option<String>,
    ) -> std::result::Result<(), String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        match depth {
            1 => {
                if *seen_root {
                    return Err(format!("second root element <{}>", name));
                }
                *seen_root = true;
                document.root = name;

                for attribute in start.attributes() {
                    let attribute = attribute.map_err(|e| e.to_string())?;
                    let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
                    let value = attribute.unescape_value().map_err(|e| e.to_string())?;
                    document.attributes.insert(key, value.into_owned());
                }
            }
            2 => {
                *current = Some(XmlRecord {
                    tag: name,
                    fields: HashMap::new(),
                });
            }
            3 => {
                // a repeated field keeps its first value
                let repeated = current
                    .as_ref()
                    .map_or(false, |record| record.fields.contains_key(&name));
                if repeated {
                    *field = None;
                    return Ok(());
                }
                if let Some(record) = current.as_mut() {
                    record.fields.insert(name.clone(), String::new());
                }
                *field = Some(name);
            }
            _ => {}
        }

        Ok(())
    }

    fn close_element(
        document: &mut XmlDocument,
        depth: usize,
        current: &mut Option<XmlRecord>,
        field: &mut Option<String>,
    ) {
        match depth {
            2 => {
                if let Some(record) = current.take() {
                    document.records.push(record);
                }
            }
            3 => *field = None,
            _ => {}
        }
    }

    fn append_text(current: &mut Option<XmlRecord>, field: &Option<String>, value: &str) {
        if let (Some(record), Some(name)) = (current.as_mut(), field.as_ref()) {
            record.fields.entry(name.clone()).or_default().push_str(value);
        }
    }
}
