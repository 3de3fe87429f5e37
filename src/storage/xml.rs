//! XML relation documents.
//!
//! ```xml
//! <employees>
//!   <employee>
//!     <field id="email">alice@example.com</field>
//!     <field id="manager"></field>
//!   </employee>
//! </employees>
//! ```
//!
//! Every child of the document element is one record. Within a record only
//! `field` elements whose `id` attribute names the configured identifier or
//! manager field are read; the first match wins and everything else is
//! ignored.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::LoadError;
use crate::domain::{Config, Relation};

const FIELD: &[u8] = b"field";
const RECORD_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Manager,
}

#[derive(Debug, Default)]
struct PendingRecord {
    id: Option<String>,
    manager: Option<String>,
}

impl PendingRecord {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Manager => &mut self.manager,
        };
        slot.get_or_insert(text);
    }

    fn finish(self, record: usize, config: &Config) -> Result<Relation, LoadError> {
        let id = self.id.ok_or_else(|| LoadError::MissingField {
            record,
            field: config.id_field.clone(),
        })?;
        super::relation(record, &id, self.manager.as_deref(), config)
    }
}

/// Parses an XML relation document.
pub(super) fn parse(content: &str, config: &Config) -> Result<Vec<Relation>, LoadError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut relations = Vec::new();
    let mut depth = 0usize;
    let mut record: Option<PendingRecord> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                depth += 1;
                match depth {
                    RECORD_DEPTH => record = Some(PendingRecord::default()),
                    FIELD_DEPTH => {
                        field = field_kind(&element, config)?;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => match depth + 1 {
                RECORD_DEPTH => {
                    let number = relations.len() + 1;
                    relations.push(PendingRecord::default().finish(number, config)?);
                }
                FIELD_DEPTH => {
                    if let (Some(kind), Some(pending)) =
                        (field_kind(&element, config)?, record.as_mut())
                    {
                        pending.set(kind, String::new());
                    }
                }
                _ => {}
            },
            Event::Text(content) if field.is_some() && depth == FIELD_DEPTH => {
                text.push_str(&content.unescape()?);
            }
            Event::CData(content) if field.is_some() && depth == FIELD_DEPTH => {
                text.push_str(&String::from_utf8_lossy(&content));
            }
            Event::End(_) => {
                match depth {
                    FIELD_DEPTH => {
                        if let (Some(kind), Some(pending)) = (field.take(), record.as_mut()) {
                            pending.set(kind, std::mem::take(&mut text));
                        }
                    }
                    RECORD_DEPTH => {
                        if let Some(pending) = record.take() {
                            let number = relations.len() + 1;
                            relations.push(pending.finish(number, config)?);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!("Parsed {} XML records", relations.len());
    Ok(relations)
}

/// Which configured field a `<field>` element holds, if any.
fn field_kind(element: &BytesStart<'_>, config: &Config) -> Result<Option<Field>, LoadError> {
    if element.name().as_ref() != FIELD {
        return Ok(None);
    }

    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() != b"id" {
            continue;
        }
        let value = attribute.unescape_value()?;
        if value == config.id_field {
            return Ok(Some(Field::Id));
        }
        if value == config.manager_field {
            return Ok(Some(Field::Manager));
        }
        return Ok(None);
    }

    Ok(None)
}
