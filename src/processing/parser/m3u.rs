use crate::error::BouquetError;
use crate::input_err;
use crate::model::{ChannelRecord, EpgIdSource, ProcessingConfig};
use crate::processing::category::NESTED_GROUP_MARKER;
use std::io::BufRead;

const EXTINF_PREFIX: &str = "#EXTINF";
/// Fixed marker preceding the guide id segment in provider stream urls.
const URL_CHANNEL_MARKER: &str = "/channel/";

/// Raw attributes of one `#EXTINF` metadata line. All fields are optional,
/// the fallback chain in `build_record` fills the gaps.
#[derive(Debug, Default)]
pub struct ExtInfAttributes {
    pub chno: Option<u32>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub group: Option<String>,
    pub id: Option<String>,
    pub title: String,
}

fn token_till(stack: &mut String, it: &mut std::str::Chars, stop_char: char, start_with_alpha: bool) -> Option<String> {
    let mut skip_non_alpha = start_with_alpha;

    for ch in it.by_ref() {
        if ch == stop_char {
            break;
        }
        if stack.is_empty() && ch.is_whitespace() {
            continue;
        }
        if skip_non_alpha {
            if ch.is_alphabetic() {
                skip_non_alpha = false;
            } else {
                continue;
            }
        }
        stack.push(ch);
    }

    if stack.is_empty() {
        None
    } else {
        let result = (*stack).clone();
        stack.clear();
        Some(result)
    }
}

fn quoted_value(stack: &mut String, it: &mut std::str::Chars) -> String {
    // skip until the opening quote, then collect until the closing one
    if it.any(|ch| ch == '"') {
        for c in it.by_ref() {
            if c == '"' {
                break;
            }
            stack.push(c);
        }
    }
    let result = (*stack).clone();
    stack.clear();
    result
}

#[inline]
fn skip_duration(it: &mut std::str::Chars) -> Option<char> {
    // the duration field after "#EXTINF:" is irrelevant here, e.g. "-1"
    loop {
        match it.next() {
            Some(c) => {
                if !(c == '-' || c == '+' || c == '.' || c.is_ascii_digit()) {
                    return Some(c);
                }
            }
            None => return None,
        }
    }
}

/// Tokenizes one metadata line into its recognized attributes. Returns `None`
/// when the line does not carry the extended-info marker.
pub fn parse_extinf(content: &str) -> Option<ExtInfAttributes> {
    let mut it = content.chars();
    let mut stack = String::with_capacity(64);
    if token_till(&mut stack, &mut it, ':', false).as_deref() != Some(EXTINF_PREFIX) {
        return None;
    }

    let mut attrs = ExtInfAttributes::default();
    let mut c = skip_duration(&mut it);
    loop {
        match c {
            None => break,
            Some(chr) => {
                if chr.is_whitespace() {
                    // skip
                } else if chr == ',' {
                    attrs.title = it.as_str().trim().to_string();
                    break;
                } else {
                    stack.push(chr);
                    if let Some(token) = token_till(&mut stack, &mut it, '=', true) {
                        let value = quoted_value(&mut stack, &mut it);
                        match token.to_lowercase().as_str() {
                            "tvg-chno" => attrs.chno = value.parse::<u32>().ok(),
                            "tvg-name" => attrs.name = Some(value),
                            "tvg-logo" => attrs.logo = Some(value),
                            "group-title" => attrs.group = Some(value),
                            "tvg-id" => attrs.id = Some(value),
                            _ => {}
                        }
                    }
                }
            }
        }
        c = it.next();
    }

    Some(attrs)
}

fn extract_url_guide_id(url: &str) -> Option<String> {
    let idx = url.find(URL_CHANNEL_MARKER)?;
    let segment: String = url[idx + URL_CHANNEL_MARKER.len()..]
        .chars()
        .take_while(|c| !matches!(c, '/' | '?' | '#'))
        .collect();
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Two-level grouping fallback: an entry without a group attribute inherits
/// from the previous entry's raw label. A label holding the nested marker
/// contributes both parts joined by a space.
fn derive_category(group_attr: Option<String>, previous_group: Option<&str>) -> String {
    if let Some(group) = group_attr {
        if !group.is_empty() {
            return group;
        }
    }
    match previous_group {
        Some(prev) => match prev.split_once(NESTED_GROUP_MARKER) {
            Some((primary, secondary)) => format!("{primary} {secondary}"),
            None => prev.to_string(),
        },
        None => String::new(),
    }
}

fn build_record(
    attrs: ExtInfAttributes,
    url: &str,
    ordinal: u32,
    previous_group: Option<&str>,
    cfg: &ProcessingConfig,
) -> ChannelRecord {
    let stream_url = url.trim_end_matches('\r').to_string();

    let display_name = match attrs.name {
        Some(name) if !name.is_empty() => name,
        _ => attrs.title.clone(),
    };

    let numeric_id = attrs.chno.unwrap_or(ordinal);

    let raw_guide_id = match cfg.epg_id_source {
        EpgIdSource::FromUrl => extract_url_guide_id(&stream_url),
        EpgIdSource::Explicit => None,
    }
    .or_else(|| attrs.id.filter(|id| !id.is_empty()))
    .unwrap_or_else(|| display_name.split_whitespace().collect::<String>());

    ChannelRecord {
        category_label: derive_category(attrs.group, previous_group),
        // the registry markup does not escape entities
        guide_id: raw_guide_id.replace('&', "and"),
        logo_url: attrs.logo.unwrap_or_default(),
        display_name,
        numeric_id,
        hex_service_id: String::new(),
        stream_url,
    }
}

/// Consumes the playlist sequentially, one metadata line plus its url line per
/// entry. Url lines without a preceding metadata line are skipped recoverably,
/// the run never aborts on a malformed entry.
pub fn consume_playlist<R: BufRead, F>(reader: R, cfg: &ProcessingConfig, mut visit: F) -> Result<(), BouquetError>
where
    F: FnMut(ChannelRecord) -> Result<(), BouquetError>,
{
    let mut header: Option<String> = None;
    // explicit carry-over of the last explicit group attribute, used by the
    // two-level grouping fallback
    let mut previous_group: Option<String> = None;
    let mut ordinal: u32 = 0;

    for line in reader.lines() {
        let line = line.map_err(|err| input_err!("Failed to read playlist - {err}"))?;
        if line.starts_with(EXTINF_PREFIX) {
            header = Some(line);
            continue;
        }
        if line.starts_with('#') || line.trim().is_empty() {
            // format header, comments and blank lines
            continue;
        }
        if let Some(metadata) = header.take() {
            if let Some(attrs) = parse_extinf(&metadata) {
                ordinal += 1;
                let group_attr = attrs.group.clone();
                let record = build_record(attrs, &line, ordinal, previous_group.as_deref(), cfg);
                if let Some(group) = group_attr {
                    if !group.is_empty() {
                        previous_group = Some(group);
                    }
                }
                visit(record)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::DEFAULT_SERVICE_TYPE;

    fn config(id_source: EpgIdSource) -> ProcessingConfig {
        ProcessingConfig {
            provider_name: "PlutoTV".to_string(),
            service_type: DEFAULT_SERVICE_TYPE,
            tid: None,
            epg_id_source: id_source,
            epg_url: None,
            epg_mirror_url: None,
            one_bouquet: false,
            reverse_bouquets: false,
            download_picons: false,
            overwrite_picons: false,
            no_reload: false,
        }
    }

    fn collect(playlist: &str, id_source: EpgIdSource) -> Vec<ChannelRecord> {
        let mut records = vec![];
        consume_playlist(playlist.as_bytes(), &config(id_source), |record| {
            records.push(record);
            Ok(())
        })
        .expect("playlist should parse");
        records
    }

    #[test]
    fn test_parse_extinf_attributes() {
        let line = r#"#EXTINF:-1 tvg-id="abc-seven" tvg-logo="https://abc.nz/.images/seven.png" tvg-chno="7" group-title="Sydney", Seven"#;
        let attrs = parse_extinf(line).expect("extinf line");
        assert_eq!(attrs.id.as_deref(), Some("abc-seven"));
        assert_eq!(attrs.logo.as_deref(), Some("https://abc.nz/.images/seven.png"));
        assert_eq!(attrs.chno, Some(7));
        assert_eq!(attrs.group.as_deref(), Some("Sydney"));
        assert_eq!(attrs.title, "Seven");
    }

    #[test]
    fn test_parse_extinf_rejects_other_lines() {
        assert!(parse_extinf("#EXTM3U").is_none());
        assert!(parse_extinf("http://example.com/stream").is_none());
    }

    #[test]
    fn test_worked_example_from_url_mode() {
        let playlist = "#EXTM3U\n\
            #EXTINF:-1 tvg-name=\"News 24\" tvg-logo=\"http://x/y.png\" group-title=\"News\",News 24\n\
            http://stream/channel/abc123/index.m3u8\n";
        let records = collect(playlist, EpgIdSource::FromUrl);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.display_name, "News 24");
        assert_eq!(record.guide_id, "abc123");
        assert_eq!(record.category_label, "News");
        assert_eq!(record.logo_url, "http://x/y.png");
        assert_eq!(record.stream_url, "http://stream/channel/abc123/index.m3u8");
    }

    #[test]
    fn test_ordinal_fallback_for_missing_chno() {
        let playlist = "#EXTM3U\n\
            #EXTINF:-1 group-title=\"A\",First\nhttp://host/1.m3u8\n\
            #EXTINF:-1 group-title=\"A\",Second\nhttp://host/2.m3u8\n\
            #EXTINF:-1 tvg-chno=\"42\" group-title=\"A\",Third\nhttp://host/3.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].numeric_id, 1);
        assert_eq!(records[1].numeric_id, 2);
        assert_eq!(records[2].numeric_id, 42);
    }

    #[test]
    fn test_display_name_falls_back_to_title() {
        let playlist = "#EXTINF:-1 group-title=\"A\",Fallback Name\r\nhttp://host/1.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].display_name, "Fallback Name");
    }

    #[test]
    fn test_guide_id_fallback_to_name_without_whitespace() {
        let playlist = "#EXTINF:-1 tvg-name=\"News 24\" group-title=\"News\",News 24\nhttp://host/1.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].guide_id, "News24");
    }

    #[test]
    fn test_guide_id_replaces_ampersand() {
        let playlist = "#EXTINF:-1 tvg-id=\"Tom & Jerry\" group-title=\"Kids\",Tom & Jerry\nhttp://host/1.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].guide_id, "Tom and Jerry");
    }

    #[test]
    fn test_from_url_mode_degrades_without_marker() {
        let playlist = "#EXTINF:-1 tvg-id=\"explicit-id\" group-title=\"A\",Name\nhttp://host/plain/index.m3u8\n";
        let records = collect(playlist, EpgIdSource::FromUrl);
        assert_eq!(records[0].guide_id, "explicit-id");
    }

    #[test]
    fn test_missing_group_inherits_previous_nested_label() {
        let playlist = "#EXTINF:-1 group-title=\"Sports | HD\",One\nhttp://host/1.m3u8\n\
            #EXTINF:-1 ,Two\nhttp://host/2.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].category_label, "Sports | HD");
        assert_eq!(records[1].category_label, "Sports HD");
    }

    #[test]
    fn test_missing_group_without_previous_is_catch_all() {
        let playlist = "#EXTINF:-1 tvg-name=\"Lonely\",Lonely\nhttp://host/1.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].category_label, "");
    }

    #[test]
    fn test_url_without_metadata_is_skipped() {
        let playlist = "#EXTM3U\nhttp://host/orphan.m3u8\n\
            #EXTINF:-1 group-title=\"A\",Kept\nhttp://host/kept.m3u8\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "Kept");
        assert_eq!(records[0].numeric_id, 1);
    }

    #[test]
    fn test_trailing_carriage_return_stripped_from_url() {
        let playlist = "#EXTINF:-1 group-title=\"A\",Name\nhttp://host/1.m3u8\r\n";
        let records = collect(playlist, EpgIdSource::Explicit);
        assert_eq!(records[0].stream_url, "http://host/1.m3u8");
    }
}
