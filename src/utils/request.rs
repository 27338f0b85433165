use crate::error::BouquetError;
use crate::utils::file_writer;
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DOWNLOAD_TIMEOUT_SECS: u64 = 10;
const RELOAD_TIMEOUT_SECS: u64 = 5;

const RELOAD_URL: &str = "http://127.0.0.1/web/servicelistreload?mode=0";

pub fn create_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|err| {
            warn!("Failed to build http client, using defaults: {err}");
            reqwest::blocking::Client::new()
        })
}

pub fn download_to_file(
    client: &reqwest::blocking::Client,
    url: &str,
    path: &Path,
) -> Result<(), BouquetError> {
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|err| crate::network_err!("Failed to fetch {url} - {err}"))?;
    let bytes = response
        .bytes()
        .map_err(|err| crate::network_err!("Failed to read body of {url} - {err}"))?;
    let file = std::fs::File::create(path)
        .map_err(|err| crate::network_err!("Failed to create {} - {err}", path.display()))?;
    let mut writer = file_writer(file);
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|err| crate::network_err!("Failed to write {} - {err}", path.display()))
}

/// Triggers a service list reload through the receiver web interface.
/// Failure is logged only, a missing web interface should not fail the run.
pub fn reload_service_list() {
    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(RELOAD_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            warn!("Could not reload service list: {err}");
            return;
        }
    };
    match client.get(RELOAD_URL).send() {
        Ok(_) => info!("Receiver service list reloaded."),
        Err(_) => warn!("Could not reload service list (web interface not reachable)."),
    }
}
