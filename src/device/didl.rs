//! DIDL-Lite metadata: the XML dialect ContentDirectory wraps items in.
//!
//! Browse results arrive as one escaped DIDL-Lite document per page;
//! parsing flattens each `<item>`/`<container>` into an [`ItemRecord`].
//! Queueing goes the other way: a stored record becomes the minimal
//! metadata document AddURIToQueue expects.

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::music_library::ItemRecord;

/// Parses one DIDL-Lite document into item records, document order.
pub fn parse_didl(xml: &str) -> Result<Vec<ItemRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut current: Option<ItemRecord> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event().context("Failed to parse DIDL metadata")? {
            Event::Start(e) => {
                let name = element_name(e.local_name().as_ref());
                if name == "item" || name == "container" {
                    let mut record = ItemRecord::default();
                    for attribute in e.attributes() {
                        let attribute = attribute.context("Malformed DIDL attribute")?;
                        let value = attribute
                            .decode_and_unescape_value(&reader)
                            .context("Malformed DIDL attribute value")?
                            .into_owned();
                        match attribute.key.as_ref() {
                            b"id" => record.item_id = value,
                            b"parentID" => record.parent_id = value,
                            _ => {}
                        }
                    }
                    current = Some(record);
                } else if current.is_some() && field.is_none() {
                    field = Some(name);
                }
            }
            Event::Text(t) => {
                if let (Some(record), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let text = t
                        .unescape()
                        .context("Failed to unescape DIDL text")?
                        .into_owned();
                    apply_field(record, name, text);
                }
            }
            Event::End(e) => {
                let name = element_name(e.local_name().as_ref());
                if field.as_deref() == Some(name.as_str()) {
                    field = None;
                } else if name == "item" || name == "container" {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(records)
}

fn apply_field(record: &mut ItemRecord, name: &str, text: String) {
    match name {
        "title" => record.title = text,
        "creator" => record.creator = Some(text),
        // some servers report the performer under upnp:artist instead
        "artist" => {
            if record.creator.is_none() {
                record.creator = Some(text);
            }
        }
        "album" => record.album = Some(text),
        "class" => record.item_class = text,
        "albumArtURI" => record.album_art_uri = Some(text),
        "originalTrackNumber" => record.original_track_number = text.parse().ok(),
        "res" => record.uri = Some(text),
        _ => {}
    }
}

/// The metadata document a queue append carries alongside the item URI.
pub fn queue_metadata(record: &ItemRecord) -> String {
    format!(
        "<DIDL-Lite xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:upnp=\"urn:schemas-upnp-org:metadata-1-0/upnp/\">\
         <item id=\"{id}\" parentID=\"{parent}\" restricted=\"true\">\
         <dc:title>{title}</dc:title>\
         <upnp:class>{class}</upnp:class>\
         <desc id=\"cdudn\" \
         nameSpace=\"urn:schemas-rinconnetworks-com:metadata-1-0/\">\
         RINCON_AssociatedZPUDN</desc>\
         </item></DIDL-Lite>",
        id = escape(&record.item_id),
        parent = escape(&record.parent_id),
        title = escape(&record.title),
        class = escape(&record.item_class),
    )
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWSE_PAGE: &str = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
        <item id="A:TRACKS/1" parentID="A:TRACKS" restricted="true">
            <dc:title>Sinnerman &amp; Friends</dc:title>
            <dc:creator>Nina Simone</dc:creator>
            <upnp:album>Pastel Blues</upnp:album>
            <upnp:class>object.item.audioItem.musicTrack</upnp:class>
            <upnp:albumArtURI>/getaa?u=x-file-cifs://nas/a.flac</upnp:albumArtURI>
            <upnp:originalTrackNumber>7</upnp:originalTrackNumber>
            <res protocolInfo="x-file-cifs:*:audio/flac:*">x-file-cifs://nas/sinnerman.flac</res>
        </item>
        <container id="A:ALBUM/Pastel%20Blues" parentID="A:ALBUM" restricted="true">
            <dc:title>Pastel Blues</dc:title>
            <dc:creator>Nina Simone</dc:creator>
            <upnp:class>object.container.album.musicAlbum</upnp:class>
            <res>x-rincon-playlist:RINCON_1#A:ALBUM/Pastel%20Blues</res>
        </container>
    </DIDL-Lite>"#;

    #[test]
    fn test_parse_items_and_containers() {
        let records = parse_didl(BROWSE_PAGE).unwrap();
        assert_eq!(records.len(), 2);

        let track = &records[0];
        assert_eq!(track.item_id, "A:TRACKS/1");
        assert_eq!(track.parent_id, "A:TRACKS");
        assert_eq!(track.title, "Sinnerman & Friends");
        assert_eq!(track.creator.as_deref(), Some("Nina Simone"));
        assert_eq!(track.album.as_deref(), Some("Pastel Blues"));
        assert_eq!(track.item_class, "object.item.audioItem.musicTrack");
        assert_eq!(track.original_track_number, Some(7));
        assert_eq!(track.uri.as_deref(), Some("x-file-cifs://nas/sinnerman.flac"));

        let album = &records[1];
        assert_eq!(album.item_class, "object.container.album.musicAlbum");
        assert_eq!(
            album.uri.as_deref(),
            Some("x-rincon-playlist:RINCON_1#A:ALBUM/Pastel%20Blues")
        );
        assert_eq!(album.album, None);
    }

    #[test]
    fn test_parse_empty_document() {
        let records = parse_didl(
            r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"></DIDL-Lite>"#,
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_upnp_artist_fallback() {
        let xml = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"
            xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
            <item id="1" parentID="0">
                <dc:title>Song</dc:title>
                <upnp:artist>Band</upnp:artist>
            </item>
            <item id="2" parentID="0">
                <dc:title>Other</dc:title>
                <dc:creator>Creator</dc:creator>
                <upnp:artist>Ignored</upnp:artist>
            </item>
        </DIDL-Lite>"#;
        let records = parse_didl(xml).unwrap();
        assert_eq!(records[0].creator.as_deref(), Some("Band"));
        assert_eq!(records[1].creator.as_deref(), Some("Creator"));
    }

    #[test]
    fn test_queue_metadata_round_trip() {
        let record = ItemRecord {
            item_id: "A:TRACKS/42".to_string(),
            parent_id: "A:TRACKS".to_string(),
            item_class: "object.item.audioItem.musicTrack".to_string(),
            title: "Bed & Breakfast".to_string(),
            ..Default::default()
        };
        let metadata = queue_metadata(&record);
        assert!(metadata.contains("<dc:title>Bed &amp; Breakfast</dc:title>"));
        assert!(metadata.contains("RINCON_AssociatedZPUDN"));

        let reparsed = parse_didl(&metadata).unwrap();
        assert_eq!(reparsed.len(), 1);
        assert_eq!(reparsed[0].item_id, "A:TRACKS/42");
        assert_eq!(reparsed[0].title, "Bed & Breakfast");
        assert_eq!(reparsed[0].item_class, "object.item.audioItem.musicTrack");
    }
}
