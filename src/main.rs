#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod model;
mod processing;
mod repository;
mod utils;

use crate::model::{read_config_file, EpgIdSource, FileConfig, ProcessingConfig, DEFAULT_SERVICE_TYPE};
use crate::processing::ident;
use crate::processing::picon::{AlwaysOverwrite, AlwaysSkip, OverwriteDecision, PromptDecision};
use crate::processing::pipeline::process_playlist;
use crate::repository::storage::resolve_system_paths;
use crate::utils::{create_client, init_logger, reload_service_list};
use clap::Parser;
use log::info;
use std::path::Path;

#[derive(Parser)]
#[command(name = "m3ubouquet")]
#[command(version)]
#[command(about = "Generates Enigma2 bouquets, EPG channel maps and picons from M3U playlists", long_about = None)]
struct Args {
    /// The M3U playlist file
    #[arg(short = 'i', long = "playlist")]
    playlist: String,

    /// The config file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Provider name, prefixes every generated artifact
    #[arg(short = 'n', long = "provider")]
    provider: Option<String>,

    /// Service type of the generated service references
    #[arg(long = "service-type")]
    service_type: Option<u32>,

    /// Transponder id (hex), derived from the provider name when omitted
    #[arg(long = "tid")]
    tid: Option<String>,

    /// Where the EPG channel id of an entry comes from
    #[arg(long = "epg-id-source", value_enum)]
    epg_id_source: Option<EpgIdSource>,

    /// XMLTV guide url written into the EPG source descriptor
    #[arg(long = "epg-url")]
    epg_url: Option<String>,

    /// Mirror url added to the EPG source descriptor
    #[arg(long = "epg-mirror-url")]
    epg_mirror_url: Option<String>,

    /// Write all channels into a single bouquet with category markers
    #[arg(short = 'o', long = "one-bouquet", default_value_t = false, default_missing_value = "true")]
    one_bouquet: bool,

    /// Reverse the bouquet order in the index
    #[arg(short = 'r', long = "reverse-bouquets", default_value_t = false, default_missing_value = "true")]
    reverse_bouquets: bool,

    /// Download channel logos as picons
    #[arg(short = 'd', long = "download-picons", default_value_t = false, default_missing_value = "true")]
    download_picons: bool,

    /// Overwrite existing picons without prompting
    #[arg(short = 'D', long = "overwrite-picons", default_value_t = false, default_missing_value = "true")]
    overwrite_picons: bool,

    /// Picon target directory, overrides the receiver search order
    #[arg(long = "picon-dir")]
    picon_dir: Option<String>,

    /// Skip the receiver service list reload
    #[arg(long = "no-reload", default_value_t = false, default_missing_value = "true")]
    no_reload: bool,

    /// log level
    #[arg(short = 'l', long = "log-level", default_missing_value = "info")]
    log_level: Option<String>,

    /// Errors only, no prompts
    #[arg(short = 'q', long = "quiet", default_value_t = false, default_missing_value = "true")]
    quiet: bool,
}

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_PROVIDER: &str = "IPTV";

fn merge_config(args: &Args, file: FileConfig) -> ProcessingConfig {
    ProcessingConfig {
        provider_name: args
            .provider
            .clone()
            .or(file.provider)
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        service_type: args
            .service_type
            .or(file.service_type)
            .unwrap_or(DEFAULT_SERVICE_TYPE),
        tid: args.tid.clone().or(file.tid),
        epg_id_source: args
            .epg_id_source
            .or(file.epg_id_source)
            .unwrap_or_default(),
        epg_url: args.epg_url.clone().or(file.epg_url),
        epg_mirror_url: args.epg_mirror_url.clone().or(file.epg_mirror_url),
        one_bouquet: args.one_bouquet || file.one_bouquet.unwrap_or(false),
        reverse_bouquets: args.reverse_bouquets || file.reverse_bouquets.unwrap_or(false),
        download_picons: args.download_picons || file.download_picons.unwrap_or(false),
        overwrite_picons: args.overwrite_picons || file.overwrite_picons.unwrap_or(false),
        no_reload: args.no_reload || file.no_reload.unwrap_or(false),
    }
}

fn main() {
    let args = Args::parse();

    init_logger(args.log_level.as_ref(), args.quiet);

    info!("Version: {VERSION}");
    info!("Current time: {}", chrono::offset::Local::now().format("%Y-%m-%d %H:%M:%S"));

    let file_config = args.config_file.as_ref().map_or_else(FileConfig::default, |path| {
        read_config_file(Path::new(path)).unwrap_or_else(|err| exit!("{err}"))
    });
    let picon_override = args.picon_dir.clone().or_else(|| file_config.picon_dir.clone());
    let cfg = merge_config(&args, file_config);
    cfg.validate().unwrap_or_else(|err| exit!("{err}"));

    let paths = resolve_system_paths(picon_override.as_deref());
    info!("Bouquet dir: {}", paths.bouquet_dir.display());
    info!("EPG config dir: {}", paths.epg_config_dir.display());
    if cfg.download_picons {
        info!("Picon dir: {}", paths.picon_dir.display());
    }

    let tag = ident::resolve_provider_tag(&cfg);
    info!("Processing provider: {} (TID: {tag})", cfg.provider_name);

    let client = create_client();
    let mut decider: Box<dyn OverwriteDecision> = if cfg.overwrite_picons {
        Box::new(AlwaysOverwrite)
    } else if args.quiet {
        Box::new(AlwaysSkip)
    } else {
        Box::new(PromptDecision)
    };

    let stats = process_playlist(&client, &cfg, &paths, Path::new(&args.playlist), decider.as_mut())
        .unwrap_or_else(|err| exit!("{err}"));
    info!(
        "Done: {} channels, {} bouquets, {} EPG mappings",
        stats.channels, stats.bouquets, stats.registry_entries
    );

    if cfg.no_reload {
        info!("Service list reload skipped.");
    } else {
        reload_service_list();
    }
}
