use crate::artifact_err;
use crate::error::BouquetError;
use crate::model::{ChannelRecord, ProcessingConfig};
use crate::processing::category::bouquet_filename;
use crate::repository::epg_repository::RegistryStaging;
use crate::utils::{file_reader, file_writer, open_file};
use log::{debug, info};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

const BOUQUET_INDEX: &str = "bouquets.tv";

#[derive(Debug, Default, Clone, Copy)]
pub struct BouquetStats {
    pub channels: usize,
    pub bouquets: usize,
    pub registry_entries: usize,
}

/// Removes every bouquet file owned by the provider prefix. Files of other
/// providers stay untouched.
fn purge_bouquet_files(bouquet_dir: &Path, file_prefix: &str) -> Result<(), BouquetError> {
    let catch_all = format!("{file_prefix}.tv");
    let categorized = format!("{file_prefix}_");
    let entries = std::fs::read_dir(bouquet_dir).map_err(|err| {
        artifact_err!("Failed to read bouquet directory {} - {err}", bouquet_dir.display())
    })?;
    let mut removed = 0usize;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == catch_all || (name.starts_with(&categorized) && name.ends_with(".tv")) {
            std::fs::remove_file(entry.path()).map_err(|err| {
                artifact_err!("Failed to remove stale bouquet {} - {err}", entry.path().display())
            })?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Removed {removed} stale bouquet files from {}", bouquet_dir.display());
    }
    Ok(())
}

/// Rewrites the bouquet index without the provider's references. The match is
/// anchored on the quoted file name so a prefix like `Pluto` does not purge
/// `PlutoTV` lines.
fn purge_index_references(bouquet_dir: &Path, file_prefix: &str) -> Result<(), BouquetError> {
    let index_path = bouquet_dir.join(BOUQUET_INDEX);
    if !index_path.exists() {
        return Ok(());
    }
    let catch_all = format!("FROM BOUQUET \"{file_prefix}.tv\"");
    let categorized = format!("FROM BOUQUET \"{file_prefix}_");
    let file = open_file(&index_path).map_err(|err| artifact_err!("{err}"))?;
    let mut staging = tempfile::Builder::new()
        .prefix(".bouquets-")
        .suffix(".tmp")
        .tempfile_in(bouquet_dir)
        .map_err(|err| {
            artifact_err!("Failed to create index staging file in {} - {err}", bouquet_dir.display())
        })?;
    let mut removed = 0usize;
    for line in file_reader(file).lines() {
        let line = line
            .map_err(|err| artifact_err!("Failed to read {} - {err}", index_path.display()))?;
        if line.contains(&catch_all) || line.contains(&categorized) {
            removed += 1;
            continue;
        }
        writeln!(staging, "{line}")
            .map_err(|err| artifact_err!("Failed to write index staging file - {err}"))?;
    }
    staging
        .flush()
        .map_err(|err| artifact_err!("Failed to flush index staging file - {err}"))?;
    staging
        .persist(&index_path)
        .map_err(|err| artifact_err!("Failed to replace {} - {err}", index_path.display()))?;
    if removed > 0 {
        debug!("Removed {removed} stale index references from {}", index_path.display());
    }
    Ok(())
}

/// Streaming writer for the provider's bouquet artifacts. Creating it purges
/// every previous artifact of the provider, so a run always regenerates from
/// scratch and repeated runs converge on the same files.
///
/// `finalize` consumes the writer, it is impossible to append after the index
/// and registry have been sealed.
pub struct BouquetWriter {
    bouquet_dir: PathBuf,
    provider_name: String,
    file_prefix: String,
    service_type: u32,
    tag: String,
    one_bouquet: bool,
    reverse_bouquets: bool,
    writers: HashMap<String, BufWriter<File>>,
    created_order: Vec<String>,
    current_marker: Option<String>,
    registry: RegistryStaging,
    channels: usize,
}

impl BouquetWriter {
    pub fn create(
        bouquet_dir: &Path,
        epg_config_dir: &Path,
        cfg: &ProcessingConfig,
        tag: &str,
    ) -> Result<Self, BouquetError> {
        let file_prefix = cfg.file_prefix();
        purge_bouquet_files(bouquet_dir, &file_prefix)?;
        purge_index_references(bouquet_dir, &file_prefix)?;
        let registry = RegistryStaging::create(epg_config_dir, &cfg.channels_file())?;
        Ok(Self {
            bouquet_dir: bouquet_dir.to_path_buf(),
            provider_name: cfg.provider_name.clone(),
            file_prefix,
            service_type: cfg.service_type,
            tag: tag.to_string(),
            one_bouquet: cfg.one_bouquet,
            reverse_bouquets: cfg.reverse_bouquets,
            writers: HashMap::new(),
            created_order: vec![],
            current_marker: None,
            registry,
            channels: 0,
        })
    }

    pub fn append_channel(&mut self, record: &ChannelRecord) -> Result<(), BouquetError> {
        let label = record.category_label.trim();
        let (filename, header) = if self.one_bouquet {
            (
                format!("{}.tv", self.file_prefix),
                format!("#NAME {}", self.provider_name),
            )
        } else {
            (
                bouquet_filename(&self.file_prefix, label),
                format!("#NAME {} {label}", self.provider_name).trim_end().to_string(),
            )
        };

        let writer = match self.writers.entry(filename.clone()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let path = self.bouquet_dir.join(&filename);
                let file = File::create(&path).map_err(|err| {
                    artifact_err!("Failed to create bouquet {} - {err}", path.display())
                })?;
                let mut writer = file_writer(file);
                writeln!(writer, "{header}").map_err(|err| {
                    artifact_err!("Failed to write bouquet {} - {err}", path.display())
                })?;
                self.created_order.push(filename.clone());
                vacant.insert(writer)
            }
        };

        if self.one_bouquet && !label.is_empty() && self.current_marker.as_deref() != Some(label) {
            // a non-selectable divider line standing in for the separate bouquet
            writeln!(writer, "#SERVICE 1:64:1:0:0:0:0:0:0:0::{label}")
                .and_then(|()| writeln!(writer, "#DESCRIPTION {label}"))
                .map_err(|err| artifact_err!("Failed to write bouquet {filename} - {err}"))?;
            self.current_marker = Some(label.to_string());
        }

        writeln!(writer, "{}", record.to_service_line(self.service_type, &self.tag))
            .and_then(|()| writeln!(writer, "{}", record.to_description_line()))
            .map_err(|err| artifact_err!("Failed to write bouquet {filename} - {err}"))?;
        self.channels += 1;

        if !record.guide_id.is_empty() {
            self.registry.append_entry(record, self.service_type, &self.tag)?;
        }
        Ok(())
    }

    /// Seals every artifact: flushes the bouquet files, appends the index
    /// references in creation order and replaces the channel registry.
    pub fn finalize(mut self) -> Result<BouquetStats, BouquetError> {
        for (filename, writer) in &mut self.writers {
            writer
                .flush()
                .map_err(|err| artifact_err!("Failed to flush bouquet {filename} - {err}"))?;
        }

        let index_path = self.bouquet_dir.join(BOUQUET_INDEX);
        let index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index_path)
            .map_err(|err| artifact_err!("Failed to open {} - {err}", index_path.display()))?;
        let mut index = file_writer(index);
        let mut order = self.created_order.clone();
        if self.reverse_bouquets {
            order.reverse();
        }
        for filename in &order {
            writeln!(
                index,
                "#SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"{filename}\" ORDER BY bouquet"
            )
            .map_err(|err| artifact_err!("Failed to write {} - {err}", index_path.display()))?;
        }
        index
            .flush()
            .map_err(|err| artifact_err!("Failed to flush {} - {err}", index_path.display()))?;

        let registry_entries = self.registry.finalize()?;
        let stats = BouquetStats {
            channels: self.channels,
            bouquets: self.created_order.len(),
            registry_entries,
        };
        info!(
            "Wrote {} channels into {} bouquets ({} registry entries)",
            stats.channels, stats.bouquets, stats.registry_entries
        );
        Ok(stats)
    }
}
