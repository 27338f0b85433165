use crate::error::BouquetError;
use crate::input_err;
use crate::model::ProcessingConfig;
use crate::processing::ident;
use crate::processing::parser::m3u::consume_playlist;
use crate::processing::picon::{self, OverwriteDecision, PiconTask};
use crate::repository::bouquet_repository::{BouquetStats, BouquetWriter};
use crate::repository::epg_repository::write_guide_source;
use crate::repository::storage::SystemPaths;
use crate::utils::{file_reader, open_file};
use std::path::Path;

/// Runs the whole provider cycle: parse the playlist, regenerate the bouquet
/// artifacts, fetch picons and emit the guide-source descriptor.
///
/// The playlist is opened before anything is purged, so an unreadable input
/// leaves the previous artifacts in place.
pub fn process_playlist(
    client: &reqwest::blocking::Client,
    cfg: &ProcessingConfig,
    paths: &SystemPaths,
    playlist_path: &Path,
    decider: &mut dyn OverwriteDecision,
) -> Result<BouquetStats, BouquetError> {
    let playlist = open_file(playlist_path).map_err(|err| input_err!("{err}"))?;

    let tag = ident::resolve_provider_tag(cfg);
    let mut writer = BouquetWriter::create(&paths.bouquet_dir, &paths.epg_config_dir, cfg, &tag)?;
    let mut picon_tasks: Vec<PiconTask> = vec![];

    consume_playlist(file_reader(playlist), cfg, |mut record| {
        record.hex_service_id = ident::hex_service_id(record.numeric_id);
        if cfg.download_picons && record.logo_url.starts_with("http") {
            picon_tasks.push(PiconTask {
                url: record.logo_url.clone(),
                filename: ident::picon_filename(cfg.service_type, &record.hex_service_id, &tag),
            });
        }
        writer.append_channel(&record)
    })?;

    if cfg.download_picons {
        picon::download_picons(client, &picon_tasks, &paths.picon_dir, decider);
    }

    let stats = writer.finalize()?;
    write_guide_source(&paths.epg_config_dir, cfg)?;
    Ok(stats)
}
