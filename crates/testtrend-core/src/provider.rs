//! Build test record providers.
//!
//! The engine never owns history. It asks a [`HistoryProvider`] for the
//! previous build, whether that build is already materialized, and for the
//! record of a given [`ResultKind`] attached to it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrendError};
use crate::model::{BuildTestRecord, ResultKind};

pub trait HistoryProvider {
    /// Number of the build preceding `build`, if any.
    fn previous_build(&self, build: u32) -> Option<u32>;

    /// Whether reading `build` is free (already in memory).
    fn is_materialized(&self, build: u32) -> bool;

    /// Record of `kind` attached to `build`. `Ok(None)` when the build has no such result.
    fn load_record(&self, build: u32, kind: ResultKind) -> Result<Option<Arc<BuildTestRecord>>>;
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for &P {
    fn previous_build(&self, build: u32) -> Option<u32> {
        (**self).previous_build(build)
    }

    fn is_materialized(&self, build: u32) -> bool {
        (**self).is_materialized(build)
    }

    fn load_record(&self, build: u32, kind: ResultKind) -> Result<Option<Arc<BuildTestRecord>>> {
        (**self).load_record(build, kind)
    }
}

/// On-disk form of a whole history: every build's record plus the builds not yet loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub builds: Vec<BuildTestRecord>,
    /// Builds present in the history but not materialized in memory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unloaded: Vec<u32>,
}

#[derive(Debug, Clone)]
struct BuildSlot {
    results: Vec<Arc<BuildTestRecord>>,
    materialized: bool,
}

impl Default for BuildSlot {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            materialized: true,
        }
    }
}

/// In-memory history keyed by build number.
#[derive(Debug, Clone, Default)]
pub struct BuildHistory {
    builds: BTreeMap<u32, BuildSlot>,
}

impl BuildHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = BuildTestRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            history.insert(record);
        }
        history
    }

    pub fn from_document(doc: HistoryDocument) -> Self {
        let mut history = Self::from_records(doc.builds);
        for build in doc.unloaded {
            history.set_materialized(build, false);
        }
        history
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: HistoryDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Attach `record` to its own build, replacing any result of the same kind.
    pub fn insert(&mut self, record: BuildTestRecord) -> Arc<BuildTestRecord> {
        let build = record.build_number;
        let record = Arc::new(record);
        self.attach(build, Arc::clone(&record));
        record
    }

    /// Attach `record` to `build` as-is, without checking its number.
    pub fn attach(&mut self, build: u32, record: Arc<BuildTestRecord>) {
        let slot = self.builds.entry(build).or_default();
        slot.results.retain(|r| r.kind != record.kind);
        slot.results.push(record);
    }

    /// Register a build that produced no test result.
    pub fn add_build(&mut self, build: u32) {
        self.builds.entry(build).or_default();
    }

    pub fn set_materialized(&mut self, build: u32, materialized: bool) {
        self.builds.entry(build).or_default().materialized = materialized;
    }

    pub fn record(&self, build: u32, kind: ResultKind) -> Option<Arc<BuildTestRecord>> {
        self.builds
            .get(&build)?
            .results
            .iter()
            .find(|r| r.kind == kind)
            .cloned()
    }

    /// Newest build carrying a result of `kind`.
    pub fn latest(&self, kind: ResultKind) -> Option<Arc<BuildTestRecord>> {
        self.builds
            .values()
            .rev()
            .find_map(|slot| slot.results.iter().find(|r| r.kind == kind).cloned())
    }

    pub fn build_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.builds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

impl HistoryProvider for BuildHistory {
    fn previous_build(&self, build: u32) -> Option<u32> {
        self.builds.range(..build).next_back().map(|(n, _)| *n)
    }

    fn is_materialized(&self, build: u32) -> bool {
        self.builds.get(&build).is_some_and(|slot| slot.materialized)
    }

    fn load_record(&self, build: u32, kind: ResultKind) -> Result<Option<Arc<BuildTestRecord>>> {
        if !self.builds.contains_key(&build) {
            return Err(TrendError::missing(build, "build was deleted"));
        }
        Ok(self.record(build, kind))
    }
}

/// Lazily loaded history over a directory of `<build>.json` record files.
///
/// Build numbers come from file names. A build is materialized once its file
/// has been read; later reads are served from the cache.
#[derive(Debug)]
pub struct HistoryDir {
    root: PathBuf,
    builds: BTreeSet<u32>,
    cache: Mutex<HashMap<u32, Arc<BuildTestRecord>>>,
}

impl HistoryDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut builds = BTreeSet::new();
        for entry in std::fs::read_dir(&root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(n) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            {
                builds.insert(n);
            }
        }
        tracing::debug!(root = %root.display(), builds = builds.len(), "opened history directory");
        Ok(Self {
            root,
            builds,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn build_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.builds.iter().copied()
    }

    /// Newest build whose record has `kind`. Reads files until one matches.
    pub fn latest(&self, kind: ResultKind) -> Result<Option<Arc<BuildTestRecord>>> {
        for build in self.builds.iter().rev() {
            if let Some(record) = self.load_record(*build, kind)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn read(&self, build: u32) -> Result<Arc<BuildTestRecord>> {
        let path = self.root.join(format!("{build}.json"));
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| TrendError::missing(build, format!("{}: {e}", path.display())))?;
        let record: BuildTestRecord = serde_json::from_str(&raw)
            .map_err(|e| TrendError::missing(build, format!("{}: {e}", path.display())))?;
        Ok(Arc::new(record))
    }
}

impl HistoryProvider for HistoryDir {
    fn previous_build(&self, build: u32) -> Option<u32> {
        self.builds.range(..build).next_back().copied()
    }

    fn is_materialized(&self, build: u32) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&build)
    }

    fn load_record(&self, build: u32, kind: ResultKind) -> Result<Option<Arc<BuildTestRecord>>> {
        if !self.builds.contains(&build) {
            return Err(TrendError::missing(build, "no record file"));
        }
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&build)
            .cloned();
        let record = match cached {
            Some(record) => record,
            None => {
                let record = self.read(build)?;
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(build, Arc::clone(&record));
                record
            }
        };
        Ok((record.kind == kind).then_some(record))
    }
}
