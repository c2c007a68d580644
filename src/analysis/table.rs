//! Column extraction from exported XML tables.
//!
//! Exports are a root element whose children are records. A record's fields
//! are its attributes and its child elements' text:
//!
//! ```xml
//! <items>
//!   <item id="1"><name>Sword</name><bonus_attr1>max_hp 50</bonus_attr1></item>
//!   <item id="2" name="Shield"/>
//! </items>
//! ```
//!
//! Columns come out in first-seen order with one value per record; a record
//! without the field contributes an empty string.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Element depth of a record (the root is 1).
const RECORD_DEPTH: usize = 2;
/// Element depth of a field element.
const FIELD_DEPTH: usize = 3;

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    /// One value per record, in document order.
    pub values: Vec<String>,
}

/// A parsed table export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub record_count: usize,
    pub columns: Vec<TableColumn>,
}

impl TableData {
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[derive(Default)]
struct TableBuilder {
    columns: Vec<TableColumn>,
    index: HashMap<String, usize>,
    record_count: usize,
}

impl TableBuilder {
    fn push_record(&mut self, fields: Vec<(String, String)>) {
        let row = self.record_count;

        for (name, value) in fields {
            let idx = match self.index.get(&name) {
                Some(idx) => *idx,
                None => {
                    let idx = self.columns.len();
                    self.columns.push(TableColumn {
                        name: name.clone(),
                        values: vec![String::new(); row],
                    });
                    self.index.insert(name, idx);
                    idx
                }
            };

            // First occurrence wins when a record repeats a field.
            let column = &mut self.columns[idx];
            if column.values.len() == row {
                column.values.push(value);
            }
        }

        self.record_count += 1;
        for column in &mut self.columns {
            column.values.resize(self.record_count, String::new());
        }
    }

    fn finish(self) -> TableData {
        TableData {
            record_count: self.record_count,
            columns: self.columns,
        }
    }
}

/// Parse decoded XML text into columns.
pub fn parse_table(text: &str) -> Result<TableData, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut builder = TableBuilder::default();
    let mut depth = 0usize;
    let mut record: Vec<(String, String)> = Vec::new();
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match depth {
                    RECORD_DEPTH => record = attributes(&e),
                    FIELD_DEPTH => field = Some((element_name(&e), String::new())),
                    _ => {}
                }
            }
            Event::Empty(e) => match depth + 1 {
                RECORD_DEPTH => builder.push_record(attributes(&e)),
                FIELD_DEPTH => record.push((element_name(&e), String::new())),
                _ => {}
            },
            Event::Text(e) => {
                if let (FIELD_DEPTH, Some((_, value))) = (depth, field.as_mut()) {
                    value.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let (FIELD_DEPTH, Some((_, value))) = (depth, field.as_mut()) {
                    value.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                match depth {
                    FIELD_DEPTH => record.extend(field.take()),
                    RECORD_DEPTH => builder.push_record(std::mem::take(&mut record)),
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Well-formed attributes of an element; malformed ones are skipped.
fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => lossy(&attr.value),
            };
            (key, value)
        })
        .collect()
}

fn lossy(bytes: &Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
