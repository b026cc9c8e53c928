//! Decoder for the platform's XML danmaku list.
//!
//! ```xml
//! <i>
//!   <chatid>123</chatid>
//!   <d p="12.345,1,25,16777215,1600000000,0,8f2a91c0,4839122944,10">text</d>
//! </i>
//! ```
//!
//! The `p` attribute is `time(s),mode,size,color,ctime,pool,hash,dmid[,weight]`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::error::{DanmakuError, Result};
use crate::item::{DanmakuAttr, DanmakuItem, DanmakuMode, DanmakuPool};

/// Parse a whole XML document into items, in document order.
///
/// Records with an unreadable `p` attribute are skipped.
pub fn parse_danmaku_xml(xml: &str) -> Result<Vec<DanmakuItem>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<DanmakuItem> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"d" => {
                current = parse_record(&e)?;
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"d" => {
                if let Some(item) = parse_record(&e)? {
                    items.push(item);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(item) = current.as_mut() {
                    let text = t.unescape().map_err(|e| DanmakuError::xml(e.to_string()))?;
                    item.content.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(item) = current.as_mut() {
                    item.content.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"d" => {
                if let Some(item) = current.take() {
                    items.push(item);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DanmakuError::xml(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(items)
}

fn parse_record(e: &BytesStart<'_>) -> Result<Option<DanmakuItem>> {
    let attr = e
        .try_get_attribute("p")
        .map_err(|err| DanmakuError::xml(err.to_string()))?;
    let Some(attr) = attr else {
        warn!("Danmaku record without p attribute");
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|err| DanmakuError::xml(err.to_string()))?;

    match parse_p_attribute(&value) {
        Some(item) => Ok(Some(item)),
        None => {
            warn!(p = %value, "Skipping malformed danmaku record");
            Ok(None)
        }
    }
}

/// Decode the comma separated `p` attribute. Content is filled in later.
pub fn parse_p_attribute(p: &str) -> Option<DanmakuItem> {
    let fields: Vec<&str> = p.split(',').map(str::trim).collect();
    if fields.len() < 8 {
        return None;
    }

    let secs: f64 = fields[0].parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let mode: i32 = fields[1].parse().ok()?;
    let font_size: u32 = fields[2].parse().ok()?;
    let color: u32 = fields[3].parse().ok()?;
    let create_time: i64 = fields[4].parse().ok()?;
    let pool: i32 = fields[5].parse().ok()?;
    let sender_hash = fields[6].to_string();
    let id: u64 = fields[7].parse().ok()?;
    let weight: i32 = fields
        .get(8)
        .and_then(|w| w.parse().ok())
        .unwrap_or_default();

    Some(DanmakuItem {
        id,
        progress: (secs * 1000.0).round() as u64,
        mode: DanmakuMode::from(mode),
        font_size,
        color: color & 0xFFFFFF,
        sender_hash,
        content: String::new(),
        create_time,
        weight,
        action: None,
        animation: None,
        pool: DanmakuPool::from(pool),
        attr: DanmakuAttr::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<i>
  <chatserver>chat.bilibili.com</chatserver>
  <chatid>25931178</chatid>
  <maxlimit>1000</maxlimit>
  <d p="12.345,1,25,16777215,1600000000,0,8f2a91c0,4839122944,10">前方高能</d>
  <d p="3.5,5,36,16711680,1600000001,2,D1234,4839122945">&lt;b&gt; &amp; more</d>
  <d p="oops,1,25,16777215,1600000002,0,x,1">broken</d>
  <d p="8,9,25,255,1600000003,0,abcd,4839122946,3"></d>
</i>"#;

    #[test]
    fn test_parse_sample() {
        let items = parse_danmaku_xml(SAMPLE).unwrap();
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(first.id, 4839122944);
        assert_eq!(first.progress, 12345);
        assert_eq!(first.mode, DanmakuMode::Scroll);
        assert_eq!(first.font_size, 25);
        assert_eq!(first.color, 0xFFFFFF);
        assert_eq!(first.sender_hash, "8f2a91c0");
        assert_eq!(first.content, "前方高能");
        assert_eq!(first.weight, 10);

        let second = &items[1];
        assert_eq!(second.mode, DanmakuMode::Special);
        assert_eq!(second.pool, DanmakuPool::Special);
        assert_eq!(second.content, "<b> & more");
        assert_eq!(second.weight, 0);
        assert!(second.is_guest_sender());

        let third = &items[2];
        assert_eq!(third.mode, DanmakuMode::Unknown(9));
        assert!(third.content.is_empty());
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_danmaku_xml("<i></i>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_document() {
        assert!(parse_danmaku_xml("<i><d p=\"1,1,25,0,0,0,a,1\">x</i>").is_err());
    }

    #[test]
    fn test_p_attribute_too_short() {
        assert!(parse_p_attribute("1,1,25").is_none());
        assert!(parse_p_attribute("-1,1,25,0,0,0,a,1").is_none());
    }
}
