use crate::core::csv_export::{CREATED_AT_FORMAT, DATE_OF_BIRTH_FORMAT};
use crate::domain::model::StoredCard;
use crate::utils::error::{CardError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// 將卡片輸出成 `<Cards><Card>...</Card></Cards>`，可再由 XML 匯入讀回
pub fn export_xml(cards: &[StoredCard]) -> Result<Vec<u8>> {
    write_document(cards).map_err(|e| CardError::XmlError {
        message: e.to_string(),
    })
}

fn write_document(cards: &[StoredCard]) -> std::result::Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("Cards")))?;

    for card in cards {
        writer.write_event(Event::Start(BytesStart::new("Card")))?;
        write_text_element(&mut writer, "Id", &card.id.to_string())?;
        write_text_element(&mut writer, "Name", &card.name)?;
        write_text_element(&mut writer, "Gender", &card.gender)?;
        write_text_element(
            &mut writer,
            "DateOfBirth",
            &card.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string(),
        )?;
        write_text_element(&mut writer, "Email", &card.email)?;
        write_text_element(&mut writer, "Phone", &card.phone)?;
        write_text_element(&mut writer, "Address", &card.address)?;
        match &card.image {
            Some(image) => write_text_element(&mut writer, "Image", image)?,
            None => writer.write_event(Event::Empty(BytesStart::new("Image")))?,
        }
        write_text_element(
            &mut writer,
            "CreatedAt",
            &card.created_at.format(CREATED_AT_FORMAT).to_string(),
        )?;
        writer.write_event(Event::End(BytesEnd::new("Card")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Cards")))?;

    let bytes = writer.into_inner();
    tracing::debug!("Exported {} cards to XML ({} bytes)", cards.len(), bytes.len());
    Ok(bytes)
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
