use log::debug;
use std::path::{Path, PathBuf};

const EPG_CONFIG_DIR: &str = "/etc/epgimport";
const BOUQUET_DIR: &str = "/etc/enigma2";

// standard receiver picon search order
const PICON_SEARCH_PATHS: &[&str] = &[
    "/media/cf/picon",
    "/media/mmc/picon",
    "/media/usb/picon",
    "/picon",
    "/media/hdd/picon",
    "/usr/share/enigma2/picon",
];

#[derive(Debug, Clone)]
pub struct SystemPaths {
    pub epg_config_dir: PathBuf,
    pub bouquet_dir: PathBuf,
    pub picon_dir: PathBuf,
}

fn is_writable_dir(path: &Path) -> bool {
    // receiver filesystems are sometimes read-only in unexpected places,
    // probing beats trusting the mode bits
    path.is_dir() && tempfile::tempfile_in(path).is_ok()
}

fn writable_or_fallback(path: &str, fallback: &Path) -> PathBuf {
    let candidate = PathBuf::from(path);
    if is_writable_dir(&candidate) {
        candidate
    } else {
        debug!("{path} is not writable, falling back to {}", fallback.display());
        fallback.to_path_buf()
    }
}

pub fn resolve_system_paths(picon_override: Option<&str>) -> SystemPaths {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let picon_dir = picon_override
        .map(PathBuf::from)
        .filter(|path| is_writable_dir(path))
        .or_else(|| {
            PICON_SEARCH_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|path| is_writable_dir(path))
        })
        .unwrap_or_else(|| cwd.join("picon"));

    SystemPaths {
        epg_config_dir: writable_or_fallback(EPG_CONFIG_DIR, &cwd),
        bouquet_dir: writable_or_fallback(BOUQUET_DIR, &cwd),
        picon_dir,
    }
}
