use chrono::{DateTime, Utc};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::feed::normalize::FeedItem;
use crate::feed::writer::WriteError;
use crate::util::strip_xml_invalid_chars;

/// MIME type declared on every enclosure. The referenced image is never
/// inspected, so non-JPEG covers are mislabeled.
pub const ENCLOSURE_TYPE: &str = "image/jpeg";

/// Channel-level metadata for the generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Formats a timestamp the way RSS 2.0 expects `lastBuildDate`
/// (RFC 822 style, always GMT), e.g. `Wed, 01 May 2024 12:30:00 GMT`.
pub fn rfc822_timestamp(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Serializes a complete RSS 2.0 document.
///
/// Layout:
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <rss version="2.0">
///   <channel>
///     <title/> <link/> <description/> <lastBuildDate/>
///     <item>
///       <title/> <link/> <description/> <pubDate/>
///       <enclosure url="…" type="image/jpeg"/>   (only when the item has an image)
///     </item>
///     …
///   </channel>
/// </rss>
/// ```
///
/// Items are written in the order given. Element text escapes only `&`, `<`
/// and `>`, so apostrophes and quotes appear literally (`O'Reilly`).
/// Attribute values are fully escaped by the writer. Characters XML 1.0
/// forbids outright are dropped so the output is always well-formed.
pub fn build_rss(
    channel: &Channel,
    items: &[FeedItem],
    build_time: DateTime<Utc>,
) -> Result<String, WriteError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    emit(&mut writer, Event::Start(rss))?;
    emit(&mut writer, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;
    text_element(&mut writer, "lastBuildDate", &rfc822_timestamp(build_time))?;

    for item in items {
        write_item(&mut writer, item)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
    emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|e| WriteError::Serialize(format!("Generated feed is not UTF-8: {e}")))
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, item: &FeedItem) -> Result<(), WriteError> {
    emit(writer, Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &item.title)?;
    text_element(writer, "link", &item.link)?;
    text_element(writer, "description", &item.description)?;
    text_element(writer, "pubDate", &item.pub_date)?;

    if let Some(ref image) = item.image {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", &*strip_xml_invalid_chars(image)));
        enclosure.push_attribute(("type", ENCLOSURE_TYPE));
        emit(writer, Event::Empty(enclosure))?;
    }

    emit(writer, Event::End(BytesEnd::new("item")))
}

fn text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), WriteError> {
    let clean = strip_xml_invalid_chars(text);
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(
        writer,
        Event::Text(BytesText::from_escaped(partial_escape(&*clean))),
    )?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), WriteError> {
    writer
        .write_event(event)
        .map_err(|e| WriteError::Serialize(e.to_string()))
}
