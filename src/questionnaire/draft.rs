use super::fields::FormKind;
use super::snapshot::{FieldSnapshot, SnapshotParse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Last-entered raw values of an unsubmitted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub form: FormKind,
    pub saved_at: DateTime<Utc>,
    pub values: BTreeMap<String, String>,
}

impl Draft {
    pub fn capture(form: FormKind, snapshot: &FieldSnapshot, saved_at: DateTime<Utc>) -> Self {
        Self {
            form,
            saved_at,
            values: snapshot.to_wire(),
        }
    }

    /// Rebuild the snapshot verbatim from the stored values.
    pub fn restore(&self) -> SnapshotParse {
        FieldSnapshot::from_wire(self.form, self.values.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("draft storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("draft storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for drafts, keyed by form.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: Draft) -> Result<(), DraftError>;
    fn load(&self, form: FormKind) -> Result<Option<Draft>, DraftError>;
    /// Returns whether a draft existed.
    fn clear(&self, form: FormKind) -> Result<bool, DraftError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    drafts: Mutex<BTreeMap<String, Draft>>,
}

impl InMemoryDraftStore {
    fn drafts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Draft>>, DraftError> {
        self.drafts
            .lock()
            .map_err(|_| DraftError::Unavailable("draft mutex poisoned".to_string()))
    }
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, draft: Draft) -> Result<(), DraftError> {
        self.drafts()?.insert(draft.form.draft_key(), draft);
        Ok(())
    }

    fn load(&self, form: FormKind) -> Result<Option<Draft>, DraftError> {
        Ok(self.drafts()?.get(&form.draft_key()).cloned())
    }

    fn clear(&self, form: FormKind) -> Result<bool, DraftError> {
        Ok(self.drafts()?.remove(&form.draft_key()).is_some())
    }
}

/// One JSON document per form under a directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    root: PathBuf,
}

impl FileDraftStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DraftError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, form: FormKind) -> PathBuf {
        self.root.join(format!("{}.json", form.draft_key()))
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, draft: Draft) -> Result<(), DraftError> {
        let payload = serde_json::to_vec_pretty(&draft)?;
        fs::write(self.path_for(draft.form), payload)?;
        Ok(())
    }

    fn load(&self, form: FormKind) -> Result<Option<Draft>, DraftError> {
        let path = self.path_for(form);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(draft) => Ok(Some(draft)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable draft");
                fs::remove_file(&path)?;
                Ok(None)
            }
        }
    }

    fn clear(&self, form: FormKind) -> Result<bool, DraftError> {
        match fs::remove_file(self.path_for(form)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Store selected at startup from configuration.
#[derive(Debug)]
pub enum DraftBackend {
    Memory(InMemoryDraftStore),
    File(FileDraftStore),
}

impl DraftBackend {
    pub fn from_dir(dir: Option<&Path>) -> Result<Self, DraftError> {
        match dir {
            Some(dir) => Ok(Self::File(FileDraftStore::new(dir)?)),
            None => Ok(Self::Memory(InMemoryDraftStore::default())),
        }
    }

    fn store(&self) -> &dyn DraftStore {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
        }
    }
}

impl DraftStore for DraftBackend {
    fn save(&self, draft: Draft) -> Result<(), DraftError> {
        self.store().save(draft)
    }

    fn load(&self, form: FormKind) -> Result<Option<Draft>, DraftError> {
        self.store().load(form)
    }

    fn clear(&self, form: FormKind) -> Result<bool, DraftError> {
        self.store().clear(form)
    }
}
