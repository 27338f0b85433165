use crate::artifact_err;
use crate::error::BouquetError;
use crate::model::{ChannelRecord, ProcessingConfig};
use crate::utils::file_writer;
use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use url::Url;

const REGISTRY_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<channels>\n";
const REGISTRY_FOOTER: &str = "</channels>\n";

macro_rules! xml_write {
    ($expr:expr, $path:expr) => {
        $expr.map_err(|err| artifact_err!("Failed to write guide source {} - {err}", $path.display()))?
    };
}

/// Staging fragment for the provider channel registry. Entries are appended
/// during streaming, the finished file replaces the previous registry
/// atomically so consumers never observe a torn file.
pub struct RegistryStaging {
    target: PathBuf,
    staging: NamedTempFile,
    entries: usize,
}

impl RegistryStaging {
    pub fn create(epg_config_dir: &Path, channels_file: &str) -> Result<Self, BouquetError> {
        let staging = tempfile::Builder::new()
            .prefix(".channels-")
            .suffix(".tmp")
            .tempfile_in(epg_config_dir)
            .map_err(|err| {
                artifact_err!(
                    "Failed to create registry staging file in {} - {err}",
                    epg_config_dir.display()
                )
            })?;
        let mut registry = Self {
            target: epg_config_dir.join(channels_file),
            staging,
            entries: 0,
        };
        registry.write(REGISTRY_HEADER)?;
        Ok(registry)
    }

    fn write(&mut self, text: &str) -> Result<(), BouquetError> {
        self.staging
            .write_all(text.as_bytes())
            .map_err(|err| artifact_err!("Failed to write registry staging file - {err}"))
    }

    pub fn append_entry(
        &mut self,
        record: &ChannelRecord,
        service_type: u32,
        tag: &str,
    ) -> Result<(), BouquetError> {
        let entry = record.to_registry_entry(service_type, tag);
        self.write(&format!("{entry}\n"))?;
        self.entries += 1;
        Ok(())
    }

    /// Closes the envelope and atomically replaces the registry file.
    pub fn finalize(mut self) -> Result<usize, BouquetError> {
        self.write(REGISTRY_FOOTER)?;
        self.staging
            .flush()
            .map_err(|err| artifact_err!("Failed to flush registry staging file - {err}"))?;
        let target = self.target.clone();
        self.staging
            .persist(&target)
            .map_err(|err| artifact_err!("Failed to replace registry {} - {err}", target.display()))?;
        info!("Channel registry written to {} ({} entries)", target.display(), self.entries);
        Ok(self.entries)
    }
}

fn guide_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(ToString::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Writes the guide-source descriptor for the provider. The file is always
/// rewritten completely, there is no incremental state.
pub fn write_guide_source(epg_config_dir: &Path, cfg: &ProcessingConfig) -> Result<bool, BouquetError> {
    let Some(primary_url) = cfg.epg_url.as_ref() else {
        debug!("No guide url configured, skipping guide source descriptor");
        return Ok(false);
    };

    let path = epg_config_dir.join(cfg.sources_file());
    let category = format!("{} ({})", cfg.provider_name, guide_host(primary_url));
    let channels_file = cfg.channels_file();

    let file = std::fs::File::create(&path)
        .map_err(|err| artifact_err!("Failed to create guide source {} - {err}", path.display()))?;
    let mut writer = Writer::new_with_indent(file_writer(file), b'\t', 1);

    xml_write!(
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))),
        path
    );
    xml_write!(writer.write_event(Event::Start(BytesStart::new("sources"))), path);

    let mut sourcecat = BytesStart::new("sourcecat");
    sourcecat.push_attribute(("sourcecatname", category.as_str()));
    xml_write!(writer.write_event(Event::Start(sourcecat)), path);

    let mut source = BytesStart::new("source");
    source.push_attribute(("type", "gen_xmltv"));
    source.push_attribute(("nocheck", "1"));
    source.push_attribute(("channels", channels_file.as_str()));
    xml_write!(writer.write_event(Event::Start(source)), path);

    xml_write!(writer.write_event(Event::Start(BytesStart::new("description"))), path);
    xml_write!(writer.write_event(Event::Text(BytesText::new(&category))), path);
    xml_write!(writer.write_event(Event::End(BytesEnd::new("description"))), path);

    for url in std::iter::once(primary_url).chain(cfg.epg_mirror_url.as_ref()) {
        xml_write!(writer.write_event(Event::Start(BytesStart::new("url"))), path);
        xml_write!(writer.write_event(Event::Text(BytesText::new(url))), path);
        xml_write!(writer.write_event(Event::End(BytesEnd::new("url"))), path);
    }

    xml_write!(writer.write_event(Event::End(BytesEnd::new("source"))), path);
    xml_write!(writer.write_event(Event::End(BytesEnd::new("sourcecat"))), path);
    xml_write!(writer.write_event(Event::End(BytesEnd::new("sources"))), path);

    writer
        .into_inner()
        .flush()
        .map_err(|err| artifact_err!("Failed to flush guide source {} - {err}", path.display()))?;

    info!("Guide source descriptor written to {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{EpgIdSource, DEFAULT_SERVICE_TYPE};

    fn config(epg_url: Option<&str>) -> ProcessingConfig {
        ProcessingConfig {
            provider_name: "PlutoTV".to_string(),
            service_type: DEFAULT_SERVICE_TYPE,
            tid: None,
            epg_id_source: EpgIdSource::Explicit,
            epg_url: epg_url.map(ToString::to_string),
            epg_mirror_url: None,
            one_bouquet: false,
            reverse_bouquets: false,
            download_picons: false,
            overwrite_picons: false,
            no_reload: false,
        }
    }

    #[test]
    fn test_registry_is_wrapped_and_replaced_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = RegistryStaging::create(dir.path(), "PlutoTV.channels.xml").expect("staging");
        let record = ChannelRecord {
            display_name: "News 24".to_string(),
            numeric_id: 1,
            hex_service_id: "1".to_string(),
            guide_id: "abc123".to_string(),
            category_label: "News".to_string(),
            stream_url: "http://host/1.m3u8".to_string(),
            logo_url: String::new(),
        };
        registry.append_entry(&record, 4097, "a1b2").expect("entry");
        let entries = registry.finalize().expect("finalize");
        assert_eq!(entries, 1);

        let content = std::fs::read_to_string(dir.path().join("PlutoTV.channels.xml")).expect("registry");
        assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<channels>\n"));
        assert!(content.ends_with("</channels>\n"));
        assert!(content.contains("<channel id=\"abc123\">4097:0:1:1:a1b2:"));
        // no staging leftovers
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_guide_source_descriptor_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = config(Some("https://epg.example.org/guide.xml.gz"));
        cfg.epg_mirror_url = Some("https://mirror.example.org/guide.xml.gz".to_string());
        assert!(write_guide_source(dir.path(), &cfg).expect("descriptor"));

        let content = std::fs::read_to_string(dir.path().join("PlutoTV.sources.xml")).expect("descriptor");
        assert!(content.contains("sourcecatname=\"PlutoTV (epg.example.org)\""));
        assert!(content.contains("channels=\"PlutoTV.channels.xml\""));
        assert!(content.contains("<url>https://epg.example.org/guide.xml.gz</url>"));
        assert!(content.contains("<url>https://mirror.example.org/guide.xml.gz</url>"));
    }

    #[test]
    fn test_guide_source_skipped_without_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!write_guide_source(dir.path(), &config(None)).expect("skip"));
        assert!(!dir.path().join("PlutoTV.sources.xml").exists());
    }
}
