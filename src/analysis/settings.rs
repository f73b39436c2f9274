//! Publish settings (`publish-settings.json`) resolution and persistence.
//!
//! Books made before the generator's ePub-mode cutoff never chose a mode;
//! they implicitly produced flowable ePubs. Resolution makes that explicit so
//! downstream artifact builders keep the old behavior.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, LazyLock, Mutex};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::Result;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version\s+(\d+)\.(\d+)").unwrap());

/// Major/minor version of the program that produced a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GeneratorVersion {
    pub major: u32,
    pub minor: u32,
}

impl GeneratorVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `... Version X.Y...` from a generator string.
    ///
    /// A missing or unparseable generator reads as `0.0`.
    pub fn parse(generator: Option<&str>) -> Self {
        generator
            .and_then(|g| VERSION_RE.captures(g))
            .and_then(|caps| Some(Self::new(caps[1].parse().ok()?, caps[2].parse().ok()?)))
            .unwrap_or_default()
    }
}

impl fmt::Display for GeneratorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpubMode {
    Fixed,
    Flowable,
}

/// The settings JSON object. Keys other than `epub.mode` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PublishSettings {
    root: Map<String, Value>,
}

impl PublishSettings {
    /// `{"epub":{"mode":"flowable"}}`
    pub fn flowable() -> Self {
        let mut root = Map::new();
        root.insert("epub".into(), json!({ "mode": "flowable" }));
        Self { root }
    }

    /// Parse settings text; non-object JSON is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(Value::Object(root)) => Some(Self { root }),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "unparseable publish settings");
                None
            }
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// `epub.mode`: `"fixed"` is Fixed, any other string Flowable.
    pub fn epub_mode(&self) -> Option<EpubMode> {
        let mode = self.root.get("epub")?.get("mode")?.as_str()?;
        Some(if mode == "fixed" {
            EpubMode::Fixed
        } else {
            EpubMode::Flowable
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.root)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsResolution {
    /// `None` only when nothing existed and no synthesis was needed.
    pub settings: Option<PublishSettings>,
    /// The settings differ from what is on disk and must be saved.
    pub changed: bool,
    /// A pre-cutoff book claims fixed mode, which that generator could not produce.
    pub inconsistent: bool,
}

/// Make a pre-cutoff book's ePub mode explicit.
pub fn resolve(
    existing: Option<PublishSettings>,
    generator: GeneratorVersion,
    cutoff: GeneratorVersion,
) -> SettingsResolution {
    if generator >= cutoff {
        return SettingsResolution {
            settings: existing,
            changed: false,
            inconsistent: false,
        };
    }

    let Some(mut settings) = existing else {
        return SettingsResolution {
            settings: Some(PublishSettings::flowable()),
            changed: true,
            inconsistent: false,
        };
    };

    let mut changed = false;
    match settings.root.get_mut("epub") {
        Some(Value::Object(epub)) => {
            if !epub.contains_key("mode") {
                epub.insert("mode".into(), Value::from("flowable"));
                changed = true;
            }
        }
        _ => {
            settings
                .root
                .insert("epub".into(), json!({ "mode": "flowable" }));
            changed = true;
        }
    }

    let inconsistent = settings.epub_mode() == Some(EpubMode::Fixed);
    if inconsistent {
        warn!(%generator, "fixed ePub mode recorded by a generator older than the cutoff");
    }
    SettingsResolution {
        settings: Some(settings),
        changed,
        inconsistent,
    }
}

/// Read settings from a book folder. Absent, unreadable or unparseable files yield `None`.
pub fn load(folder: &Path, file_name: &str) -> Option<PublishSettings> {
    let path = folder.join(file_name);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable publish settings");
            return None;
        }
    };
    PublishSettings::parse(&text)
}

pub fn save(folder: &Path, file_name: &str, settings: &PublishSettings) -> Result<PathBuf> {
    let path = folder.join(file_name);
    fs::write(&path, settings.to_json()?)?;
    info!(path = %path.display(), "wrote publish settings");
    Ok(path)
}

static LOCKED_FOLDERS: LazyLock<(Mutex<HashSet<PathBuf>>, Condvar)> =
    LazyLock::new(|| (Mutex::new(HashSet::new()), Condvar::new()));

/// Exclusive access to one book folder within this process.
///
/// Released on drop.
#[derive(Debug)]
pub struct FolderLock {
    path: PathBuf,
}

impl FolderLock {
    /// Block until no other analysis holds `folder`.
    pub fn acquire(folder: &Path) -> Self {
        let path = lock_key(folder);
        let (set, freed) = &*LOCKED_FOLDERS;
        let mut held = set.lock().unwrap_or_else(|e| e.into_inner());
        while held.contains(&path) {
            held = freed.wait(held).unwrap_or_else(|e| e.into_inner());
        }
        held.insert(path.clone());
        Self { path }
    }

    /// Take the folder if it is free.
    pub fn try_acquire(folder: &Path) -> Option<Self> {
        let path = lock_key(folder);
        let mut held = LOCKED_FOLDERS.0.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(path.clone()) {
            return None;
        }
        Some(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FolderLock {
    fn drop(&mut self) {
        let (set, freed) = &*LOCKED_FOLDERS;
        let mut held = set.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.path);
        freed.notify_all();
    }
}

fn lock_key(folder: &Path) -> PathBuf {
    folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: GeneratorVersion = GeneratorVersion::new(5, 3);
    const NEW: GeneratorVersion = GeneratorVersion::new(5, 4);
    const CUTOFF: GeneratorVersion = GeneratorVersion::new(5, 4);

    #[test]
    fn test_generator_version_parse() {
        let v = GeneratorVersion::parse(Some("Bloom Version 5.3.0 (apparent build date: 1-Mar-2023)"));
        assert_eq!(v, GeneratorVersion::new(5, 3));
        assert_eq!(GeneratorVersion::parse(Some("Bloom")), GeneratorVersion::default());
        assert_eq!(GeneratorVersion::parse(None), GeneratorVersion::new(0, 0));
        assert!(GeneratorVersion::new(5, 10) > GeneratorVersion::new(5, 4));
        assert!(GeneratorVersion::new(4, 99) < GeneratorVersion::new(5, 0));
    }

    #[test]
    fn test_current_generator_left_alone() {
        let r = resolve(None, NEW, CUTOFF);
        assert_eq!(r.settings, None);
        assert!(!r.changed);
    }

    #[test]
    fn test_pre_cutoff_synthesizes() {
        let r = resolve(None, OLD, CUTOFF);
        assert!(r.changed);
        assert_eq!(r.settings.unwrap().to_json().unwrap(), r#"{"epub":{"mode":"flowable"}}"#);
    }

    #[test]
    fn test_pre_cutoff_adds_mode_and_keeps_other_keys() {
        let existing = PublishSettings::parse(r#"{"bloomPub":{"motion":true},"epub":{"howToPublishImageDescriptions":"none"}}"#);
        let r = resolve(existing, OLD, CUTOFF);
        assert!(r.changed);
        assert_eq!(
            r.settings.unwrap().to_json().unwrap(),
            r#"{"bloomPub":{"motion":true},"epub":{"howToPublishImageDescriptions":"none","mode":"flowable"}}"#
        );

        let existing = PublishSettings::parse(r#"{"audioVideo":{}}"#);
        let r = resolve(existing, OLD, CUTOFF);
        assert_eq!(r.settings.unwrap().epub_mode(), Some(EpubMode::Flowable));
    }

    #[test]
    fn test_non_object_epub_replaced() {
        let r = resolve(PublishSettings::parse(r#"{"epub":"weird"}"#), OLD, CUTOFF);
        assert!(r.changed);
        assert_eq!(r.settings.unwrap().epub_mode(), Some(EpubMode::Flowable));
    }

    #[test]
    fn test_pre_cutoff_fixed_is_inconsistent() {
        let r = resolve(PublishSettings::parse(r#"{"epub":{"mode":"fixed"}}"#), OLD, CUTOFF);
        assert!(r.inconsistent);
        assert!(!r.changed);
        assert_eq!(r.settings.unwrap().epub_mode(), Some(EpubMode::Fixed));
    }

    #[test]
    fn test_resolution_is_idempotent_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = "publish-settings.json";
        fs::write(dir.path().join(file), r#"{"epub":{}}"#).unwrap();

        let first = resolve(load(dir.path(), file), OLD, CUTOFF);
        assert!(first.changed);
        save(dir.path(), file, first.settings.as_ref().unwrap()).unwrap();

        let second = resolve(load(dir.path(), file), OLD, CUTOFF);
        assert!(!second.changed);
        assert_eq!(first.settings, second.settings);
    }

    #[test]
    fn test_load_ignores_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path(), "publish-settings.json").is_none());
        fs::write(dir.path().join("publish-settings.json"), "{oops").unwrap();
        assert!(load(dir.path(), "publish-settings.json").is_none());
        fs::write(dir.path().join("publish-settings.json"), "[1,2]").unwrap();
        assert!(load(dir.path(), "publish-settings.json").is_none());
    }

    #[test]
    fn test_folder_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let lock = FolderLock::acquire(dir.path());
        assert!(FolderLock::try_acquire(dir.path()).is_none());
        drop(lock);
        assert!(FolderLock::try_acquire(dir.path()).is_some());
    }

    #[test]
    fn test_folder_lock_blocks_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let lock = FolderLock::acquire(&path);
        let waiter = std::thread::spawn(move || {
            let _second = FolderLock::acquire(&path);
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!waiter.is_finished());
        drop(lock);
        waiter.join().unwrap();
    }
}
