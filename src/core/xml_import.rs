use crate::core::field_parsers::parse_date_strict;
use crate::domain::model::{ContactRecord, ParseReport, RowError};
use crate::utils::error::{CardError, Result};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

const CARD_ELEMENT: &str = "Card";

/// 正在讀取中的 `<Card>` 元素
struct OpenCard {
    ordinal: usize,
    depth: usize,
    fields: HashMap<String, String>,
    current: Option<String>,
    buffer: String,
}

impl OpenCard {
    fn new(ordinal: usize, depth: usize) -> Self {
        Self {
            ordinal,
            depth,
            fields: HashMap::new(),
            current: None,
            buffer: String::new(),
        }
    }

    fn begin_field(&mut self, name: String) {
        self.current = Some(name);
        self.buffer.clear();
    }

    fn end_field(&mut self) {
        if let Some(name) = self.current.take() {
            // 同名子元素只取第一個
            self.fields
                .entry(name)
                .or_insert_with(|| std::mem::take(&mut self.buffer));
            self.buffer.clear();
        }
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }

    fn into_record(self) -> Result<ContactRecord> {
        let image = self.field("Image");
        Ok(ContactRecord {
            name: self.field("Name").to_string(),
            gender: self.field("Gender").to_string(),
            date_of_birth: parse_date_strict(self.field("DateOfBirth"))?,
            email: self.field("Email").to_string(),
            phone: self.field("Phone").to_string(),
            image: (!image.is_empty()).then(|| image.to_string()),
            address: self.field("Address").to_string(),
        })
    }
}

/// 解析 XML 內容中所有的 `<Card>` 元素 (任意深度，依文件順序)
pub fn parse_xml(content: &str) -> ParseReport {
    let cards = match collect_cards(content) {
        Ok(cards) => cards,
        Err(e) => {
            tracing::warn!("❌ Invalid XML document: {}", e);
            return ParseReport::structural(format!("Invalid XML format: {}", e));
        }
    };

    if cards.is_empty() {
        return ParseReport::structural("No <Card> elements found in XML document");
    }

    let mut report = ParseReport::default();
    for card in cards {
        let position = card.ordinal;
        match card.into_record() {
            Ok(record) => report.records.push(record),
            Err(e) => {
                tracing::debug!("Card {} rejected: {}", position, e);
                report.row_errors.push(RowError {
                    label: "Card",
                    position,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        "Parsed XML: {} records, {} card errors",
        report.records.len(),
        report.row_errors.len()
    );
    report
}

fn xml_error(e: impl std::fmt::Display) -> CardError {
    CardError::XmlError {
        message: e.to_string(),
    }
}

fn element_name(name: &[u8]) -> Result<String> {
    std::str::from_utf8(name)
        .map(str::to_owned)
        .map_err(xml_error)
}

fn collect_cards(content: &str) -> Result<Vec<OpenCard>> {
    let mut reader = Reader::from_str(content);

    let mut open: Vec<OpenCard> = Vec::new();
    let mut finished: Vec<OpenCard> = Vec::new();
    let mut depth = 0usize;
    let mut next_ordinal = 1usize;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                let name = element_name(local.as_ref())?;

                if let Some(card) = open.last_mut() {
                    if card.current.is_none() && depth == card.depth + 1 {
                        card.begin_field(name.clone());
                    }
                }
                if name == CARD_ELEMENT {
                    open.push(OpenCard::new(next_ordinal, depth));
                    next_ordinal += 1;
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                let name = element_name(local.as_ref())?;

                if let Some(card) = open.last_mut() {
                    if card.current.is_none() && depth == card.depth {
                        card.fields.entry(name.clone()).or_default();
                    }
                }
                if name == CARD_ELEMENT {
                    finished.push(OpenCard::new(next_ordinal, depth + 1));
                    next_ordinal += 1;
                }
            }
            Event::Text(e) => {
                if let Some(card) = open.last_mut().filter(|c| c.current.is_some()) {
                    let decoded = reader.decoder().decode(e.as_ref()).map_err(xml_error)?;
                    let text = unescape(&decoded).map_err(xml_error)?;
                    card.buffer.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(card) = open.last_mut().filter(|c| c.current.is_some()) {
                    let text = std::str::from_utf8(e.as_ref()).map_err(xml_error)?;
                    card.buffer.push_str(text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(card) = open.last_mut().filter(|c| c.current.is_some()) {
                    let text = match e.resolve_char_ref().map_err(xml_error)? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let entity = e.decode().map_err(xml_error)?;
                            resolve_predefined_entity(&entity)
                                .map(str::to_string)
                                .ok_or_else(|| xml_error(format!("unknown entity &{};", entity)))?
                        }
                    };
                    card.buffer.push_str(&text);
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                let name = element_name(local.as_ref())?;

                if name == CARD_ELEMENT && open.last().is_some_and(|c| c.depth == depth) {
                    if let Some(card) = open.pop() {
                        finished.push(card);
                    }
                }
                if let Some(card) = open.last_mut() {
                    if card.current.is_some() && depth == card.depth + 1 {
                        card.end_field();
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 || !open.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }

    finished.sort_by_key(|card| card.ordinal);
    Ok(finished)
}
