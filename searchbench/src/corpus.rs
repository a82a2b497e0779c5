//! Text corpora and the patterns probed against them.
//!
//! The benchmark only needs a `load(name) -> Text` capability. `FileCorpus`
//! resolves names against a directory; `InMemoryCorpus` serves tests and
//! callers that already hold their texts.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{EncodingMode, TextSpec};
use crate::errors::{SearchError, SearchResult};

/// An immutable, shareable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    id: String,
    bytes: Arc<[u8]>,
}

impl Text {
    pub fn new(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Whether a pattern is expected to occur in its text.
///
/// The label is supplied by the caller and never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Present,
    Absent,
}

impl PatternKind {
    pub const ALL: [PatternKind; 2] = [PatternKind::Present, PatternKind::Absent];

    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::Present => "Existing",
            PatternKind::Absent => "Fictional",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Present => f.write_str("present"),
            PatternKind::Absent => f.write_str("absent"),
        }
    }
}

/// One column of the result grid: a text probed with one pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub text_id: String,
    pub kind: PatternKind,
    pub pattern: String,
}

impl Scenario {
    /// Expands a text spec into its present and absent scenarios
    pub fn from_spec(spec: &TextSpec) -> [Scenario; 2] {
        [
            Scenario {
                text_id: spec.name.clone(),
                kind: PatternKind::Present,
                pattern: spec.present.clone(),
            },
            Scenario {
                text_id: spec.name.clone(),
                kind: PatternKind::Absent,
                pattern: spec.absent.clone(),
            },
        ]
    }
}

/// Source of named texts
pub trait TextSource {
    fn load(&self, name: &str) -> SearchResult<Text>;
}

/// Loads texts from files under a root directory
#[derive(Debug, Clone)]
pub struct FileCorpus {
    root: PathBuf,
    encoding_mode: EncodingMode,
}

impl FileCorpus {
    pub fn new(root: impl Into<PathBuf>, encoding_mode: EncodingMode) -> Self {
        Self {
            root: root.into(),
            encoding_mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn check_encoding(&self, bytes: &[u8], path: &Path) -> SearchResult<()> {
        match std::str::from_utf8(bytes) {
            Ok(_) => Ok(()),
            Err(e) => match self.encoding_mode {
                EncodingMode::FailFast => Err(SearchError::encoding_error(path, e)),
                EncodingMode::Lossy => {
                    warn!(
                        "{} is not valid UTF-8 (first error at byte {}); searching raw bytes",
                        path.display(),
                        e.valid_up_to()
                    );
                    Ok(())
                }
            },
        }
    }
}

impl TextSource for FileCorpus {
    fn load(&self, name: &str) -> SearchResult<Text> {
        let path = self.root.join(name);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SearchError::file_not_found(&path),
            std::io::ErrorKind::PermissionDenied => SearchError::permission_denied(&path),
            _ => SearchError::IoError(e),
        })?;

        if bytes.is_empty() {
            return Err(SearchError::invalid_text(format!(
                "{} is empty",
                path.display()
            )));
        }
        self.check_encoding(&bytes, &path)?;

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Text::new(name, bytes))
    }
}

/// Texts held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    texts: HashMap<String, Arc<[u8]>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.texts.insert(name.into(), bytes.into());
    }

    pub fn with_text(mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl TextSource for InMemoryCorpus {
    fn load(&self, name: &str) -> SearchResult<Text> {
        let bytes = self
            .texts
            .get(name)
            .ok_or_else(|| SearchError::file_not_found(name))?;
        if bytes.is_empty() {
            return Err(SearchError::invalid_text(format!("{} is empty", name)));
        }
        Ok(Text::new(name, Arc::clone(bytes)))
    }
}
