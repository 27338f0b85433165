use crate::utils::download_to_file;
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One logo download collected during streaming, executed after the playlist
/// is exhausted.
#[derive(Debug, Clone)]
pub struct PiconTask {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    Skip,
    Overwrite,
    /// overwrite this and every remaining file without further prompts
    OverwriteAll,
}

/// Strategy deciding what happens when a picon target already exists.
/// Non-interactive runs substitute a deterministic implementation.
pub trait OverwriteDecision {
    fn decide(&mut self, path: &Path) -> OverwriteChoice;
}

pub struct AlwaysOverwrite;

impl OverwriteDecision for AlwaysOverwrite {
    fn decide(&mut self, _path: &Path) -> OverwriteChoice {
        OverwriteChoice::OverwriteAll
    }
}

pub struct AlwaysSkip;

impl OverwriteDecision for AlwaysSkip {
    fn decide(&mut self, _path: &Path) -> OverwriteChoice {
        OverwriteChoice::Skip
    }
}

/// Interactive per-file prompt on the terminal.
pub struct PromptDecision;

impl OverwriteDecision for PromptDecision {
    fn decide(&mut self, path: &Path) -> OverwriteChoice {
        loop {
            print!("Picon {} exists. [s]kip / [o]verwrite / [a]ll remaining: ", path.display());
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return OverwriteChoice::Skip;
            }
            match line.trim().to_lowercase().as_str() {
                "s" | "skip" | "" => return OverwriteChoice::Skip,
                "o" | "overwrite" => return OverwriteChoice::Overwrite,
                "a" | "all" => return OverwriteChoice::OverwriteAll,
                _ => {}
            }
        }
    }
}

/// Resolves overwrite conflicts and returns the (url, target) pairs that
/// remain to be fetched.
pub fn plan_downloads(
    tasks: &[PiconTask],
    picon_dir: &Path,
    decider: &mut dyn OverwriteDecision,
) -> Vec<(String, PathBuf)> {
    let mut overwrite_all = false;
    let mut planned = vec![];
    for task in tasks {
        if !task.url.starts_with("http") {
            continue;
        }
        let target = picon_dir.join(&task.filename);
        if target.exists() && !overwrite_all {
            match decider.decide(&target) {
                OverwriteChoice::Skip => continue,
                OverwriteChoice::Overwrite => {}
                OverwriteChoice::OverwriteAll => overwrite_all = true,
            }
        }
        planned.push((task.url.clone(), target));
    }
    planned
}

/// Fetches the planned picons sequentially. A failing download is logged and
/// skipped, remaining downloads continue.
pub fn download_picons(
    client: &reqwest::blocking::Client,
    tasks: &[PiconTask],
    picon_dir: &Path,
    decider: &mut dyn OverwriteDecision,
) -> usize {
    if tasks.is_empty() {
        return 0;
    }
    if let Err(err) = std::fs::create_dir_all(picon_dir) {
        error!("Failed to create picon directory {} - {err}", picon_dir.display());
        return 0;
    }
    let planned = plan_downloads(tasks, picon_dir, decider);
    let mut saved = 0usize;
    for (url, target) in planned {
        match download_to_file(client, &url, &target) {
            Ok(()) => saved += 1,
            Err(err) => error!("Picon download failed: {err}"),
        }
    }
    if saved > 0 {
        info!("Saved {saved} picons to {}", picon_dir.display());
    }
    saved
}

#[cfg(test)]
mod test {
    use super::*;

    struct Scripted {
        choices: Vec<OverwriteChoice>,
        asked: usize,
    }

    impl Scripted {
        fn new(choices: Vec<OverwriteChoice>) -> Self {
            Self { choices, asked: 0 }
        }
    }

    impl OverwriteDecision for Scripted {
        fn decide(&mut self, _path: &Path) -> OverwriteChoice {
            let choice = self.choices[self.asked];
            self.asked += 1;
            choice
        }
    }

    fn task(name: &str) -> PiconTask {
        PiconTask {
            url: format!("http://logos/{name}"),
            filename: name.to_string(),
        }
    }

    #[test]
    fn test_plan_skips_non_http_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tasks = vec![
            PiconTask { url: "file:///logo.png".to_string(), filename: "a.png".to_string() },
            task("b.png"),
        ];
        let planned = plan_downloads(&tasks, dir.path(), &mut AlwaysOverwrite);
        assert_eq!(planned.len(), 1);
        assert!(planned[0].1.ends_with("b.png"));
    }

    #[test]
    fn test_plan_prompts_only_for_existing_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.png"), b"old").expect("seed file");
        let tasks = vec![task("a.png"), task("b.png")];
        let mut decider = Scripted::new(vec![OverwriteChoice::Skip]);
        let planned = plan_downloads(&tasks, dir.path(), &mut decider);
        assert_eq!(decider.asked, 1);
        assert_eq!(planned.len(), 1);
        assert!(planned[0].1.ends_with("b.png"));
    }

    #[test]
    fn test_overwrite_all_stops_prompting() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.png"), b"old").expect("seed file");
        std::fs::write(dir.path().join("b.png"), b"old").expect("seed file");
        let tasks = vec![task("a.png"), task("b.png")];
        let mut decider = Scripted::new(vec![OverwriteChoice::OverwriteAll]);
        let planned = plan_downloads(&tasks, dir.path(), &mut decider);
        assert_eq!(decider.asked, 1);
        assert_eq!(planned.len(), 2);
    }

    #[test]
    fn test_always_skip_keeps_existing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.png"), b"old").expect("seed file");
        let tasks = vec![task("a.png")];
        let planned = plan_downloads(&tasks, dir.path(), &mut AlwaysSkip);
        assert!(planned.is_empty());
    }
}
