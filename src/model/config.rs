use crate::error::BouquetError;
use crate::utils::{file_reader, open_file};
use crate::input_err;
use std::path::Path;

/// Where the EPG channel id of an entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EpgIdSource {
    /// path segment following the `/channel/` marker in the stream url
    FromUrl,
    /// explicit `tvg-id` attribute, display name as last resort
    #[default]
    Explicit,
}

pub const DEFAULT_SERVICE_TYPE: u32 = 4097;

/// Optional yaml config file, every field can be overridden on the command line.
#[derive(Debug, Default, serde::Deserialize)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub service_type: Option<u32>,
    pub tid: Option<String>,
    pub epg_id_source: Option<EpgIdSource>,
    pub epg_url: Option<String>,
    pub epg_mirror_url: Option<String>,
    pub one_bouquet: Option<bool>,
    pub reverse_bouquets: Option<bool>,
    pub download_picons: Option<bool>,
    pub overwrite_picons: Option<bool>,
    pub picon_dir: Option<String>,
    pub no_reload: Option<bool>,
}

pub fn read_config_file(path: &Path) -> Result<FileConfig, BouquetError> {
    let file = open_file(path).map_err(|err| input_err!("{err}"))?;
    serde_yaml::from_reader(file_reader(file))
        .map_err(|err| input_err!("Failed to parse config file {} - {err}", path.display()))
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub provider_name: String,
    pub service_type: u32,
    pub tid: Option<String>,
    pub epg_id_source: EpgIdSource,
    pub epg_url: Option<String>,
    pub epg_mirror_url: Option<String>,
    pub one_bouquet: bool,
    pub reverse_bouquets: bool,
    pub download_picons: bool,
    pub overwrite_picons: bool,
    pub no_reload: bool,
}

impl ProcessingConfig {
    /// Common prefix of every bouquet file owned by this provider. The purge
    /// step identifies stale files through it.
    pub fn file_prefix(&self) -> String {
        format!("userbouquet.iptv_{}", self.provider_name)
    }

    pub fn channels_file(&self) -> String {
        format!("{}.channels.xml", self.provider_name)
    }

    pub fn sources_file(&self) -> String {
        format!("{}.sources.xml", self.provider_name)
    }

    pub fn validate(&self) -> Result<(), BouquetError> {
        if self.provider_name.trim().is_empty() {
            return Err(input_err!("Provider name must not be empty"));
        }
        if let Some(tid) = self.tid.as_ref() {
            if tid.is_empty() || !tid.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(input_err!("Invalid transponder id '{tid}', expected hex digits"));
            }
        }
        Ok(())
    }
}
