//! Corpus Index
//!
//! The enumerated hierarchy of document identifiers available to a run.
//! Built by walking `<experiment>/data`, persisted next to it as a plain
//! text file (one identifier per line), and read-only once the run starts.
//!
//! The planner and processor see the index rendered as a directory tree;
//! every identifier the backend answers with is checked against it through
//! [`CorpusIndex::resolve`].

use sdk::errors::EngineError;
use sdk::types::DocumentRef;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Subdirectory of an experiment holding the documents
pub const DATA_DIR_NAME: &str = "data";

const INDEX_HEADER: &str = "# Regent corpus index";

/// Read-only enumeration of the documents in one experiment
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    entries: Vec<DocumentRef>,
    lookup: HashSet<DocumentRef>,
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    // Hidden files and directories, Office lock files
    entry.depth() > 0 && (name.starts_with('.') || name.starts_with("~$"))
}

impl CorpusIndex {
    /// Build an index from identifiers, keeping first occurrences in order
    pub fn from_entries<I, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentRef>,
    {
        let mut index = Self::default();
        for entry in entries {
            let entry = entry.into();
            if index.lookup.insert(entry.clone()) {
                index.entries.push(entry);
            }
        }
        index
    }

    /// Walk `data_dir` and enumerate every regular file in it.
    ///
    /// Entries are `/`-separated paths relative to `data_dir`, in
    /// depth-first order sorted by file name.
    pub fn scan(data_dir: &Path) -> Result<Self, EngineError> {
        if !data_dir.is_dir() {
            return Err(EngineError::CorpusIndex(format!(
                "Data directory does not exist: {}",
                data_dir.display()
            )));
        }

        let walker = WalkDir::new(data_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));

        let mut relative_paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable corpus entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(data_dir) else {
                continue;
            };
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            relative_paths.push(id);
        }

        let index = Self::from_entries(relative_paths);
        tracing::info!(
            "Indexed {} documents under {}",
            index.len(),
            data_dir.display()
        );
        Ok(index)
    }

    /// Persist the index as UTF-8 text, one identifier per line
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let mut contents = String::with_capacity(self.entries.len() * 32);
        contents.push_str(INDEX_HEADER);
        contents.push('\n');
        for entry in &self.entries {
            contents.push_str(entry.as_str());
            contents.push('\n');
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents).map_err(|e| {
            EngineError::CorpusIndex(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Load a persisted index. Blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::CorpusIndex(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(Self::from_entries(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        ))
    }

    /// Obtain the index for an experiment directory.
    ///
    /// With `regenerate` the `data/` directory is rescanned and the file
    /// rewritten; otherwise the persisted file must already exist.
    pub fn retrieve(
        base_dir: &Path,
        index_file_name: &str,
        regenerate: bool,
    ) -> Result<Self, EngineError> {
        let index_path = base_dir.join(index_file_name);
        if regenerate {
            let index = Self::scan(&base_dir.join(DATA_DIR_NAME))?;
            index.save(&index_path)?;
            tracing::debug!("Corpus index written to {}", index_path.display());
            Ok(index)
        } else {
            if !index_path.is_file() {
                return Err(EngineError::CorpusIndex(format!(
                    "No persisted index at {}",
                    index_path.display()
                )));
            }
            Self::load(&index_path)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, document: &DocumentRef) -> bool {
        self.lookup.contains(document)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRef> {
        self.entries.iter()
    }

    /// Map an identifier proposed by the backend onto an indexed document.
    ///
    /// Exact match first, then the normalised form, then a unique match for
    /// a bare file name (no directory part). Ambiguous or unknown names
    /// yield `None`.
    pub fn resolve(&self, candidate: &str) -> Option<DocumentRef> {
        let exact = DocumentRef::new(candidate);
        if self.contains(&exact) {
            return Some(exact);
        }

        let normalized = DocumentRef::new(normalize(candidate));
        if normalized.as_str().is_empty() {
            return None;
        }
        if self.contains(&normalized) {
            return Some(normalized);
        }

        // A path with a directory must match as a whole
        if normalized.as_str().contains('/') {
            return None;
        }
        let base = normalized.as_str();
        let mut matches = self.entries.iter().filter(|e| e.file_name() == base);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }

    /// Indented directory-tree rendering used as prompt context
    pub fn render_tree(&self) -> String {
        let mut out = String::from("data/\n");
        let mut previous_dirs: Vec<&str> = Vec::new();

        for entry in &self.entries {
            let segments: Vec<&str> = entry.as_str().split('/').collect();
            let (file, dirs) = match segments.split_last() {
                Some((file, dirs)) => (*file, dirs),
                None => continue,
            };

            let shared = previous_dirs
                .iter()
                .zip(dirs.iter())
                .take_while(|(a, b)| a == b)
                .count();
            for (depth, dir) in dirs.iter().enumerate().skip(shared) {
                out.push_str(&"    ".repeat(depth + 1));
                out.push_str(dir);
                out.push_str("/\n");
            }
            out.push_str(&"    ".repeat(dirs.len() + 1));
            out.push_str(file);
            out.push('\n');

            previous_dirs = dirs.to_vec();
        }
        out
    }
}

fn normalize(candidate: &str) -> String {
    let mut s = candidate
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .replace('\\', "/");
    loop {
        let stripped = s
            .strip_prefix("./")
            .or_else(|| s.strip_prefix('/'))
            .or_else(|| s.strip_prefix("data/"));
        match stripped {
            Some(rest) => s = rest.to_string(),
            None => break,
        }
    }
    s
}
