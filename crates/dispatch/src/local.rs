//! File-backed collaborators for replay and local runs
//!
//! Layout under the configured `records_dir`:
//!
//! ```text
//! records_dir/
//! ├── 2525/
//! │   ├── 17.json            ← record export, object or list of objects
//! │   └── 18.json
//! ├── affiliations.json      ← {"P9": "yes", "P10": "no"}
//! ├── registry.json          ← {"<mrn>": {"subject_id": ..., "demographics": {...}}}
//! └── registrations.jsonl    ← one line per registration performed
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use transmitter_core::{FlagState, ScopeKey};
use transmitter_workflow::{
    AffiliationDirectory, ClinicalRegistry, RecordSource, RegistrySubject, WorkflowError,
    WorkflowResult,
};

/// Reads `<root>/<project_id>/<record_id>.json`
#[derive(Debug, Clone)]
pub struct DirectoryRecordSource {
    root: PathBuf,
}

impl DirectoryRecordSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a record's export; ids must be single plain path segments
    pub fn record_path(&self, scope: &ScopeKey) -> WorkflowResult<PathBuf> {
        let project = path_segment("project_id", &scope.project_id)?;
        let record = path_segment("record_id", &scope.record_id)?;
        Ok(self.root.join(project).join(format!("{}.json", record)))
    }
}

/// Accept an id only if it names exactly one normal path component
fn path_segment<'a>(name: &str, id: &'a str) -> WorkflowResult<&'a str> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == id => Ok(id),
        _ => Err(WorkflowError::validation(format!(
            "{} is not a plain identifier: {:?}",
            name, id
        ))),
    }
}

#[async_trait]
impl RecordSource for DirectoryRecordSource {
    async fn fetch_record(&self, scope: &ScopeKey) -> WorkflowResult<Value> {
        let path = self.record_path(scope)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| WorkflowError::dependency("record-source", format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| WorkflowError::dependency("record-source", format!("{}: {}", path.display(), e)))
    }
}

/// Participant pairings from `<root>/affiliations.json`
#[derive(Debug, Clone)]
pub struct DirectoryAffiliations {
    path: PathBuf,
}

impl DirectoryAffiliations {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join("affiliations.json"),
        }
    }
}

#[async_trait]
impl AffiliationDirectory for DirectoryAffiliations {
    async fn lookup_pairing(&self, participant_id: &str) -> WorkflowResult<FlagState> {
        let pairings: HashMap<String, String> = match read_json(&self.path).await? {
            Some(pairings) => pairings,
            None => return Ok(FlagState::Unknown),
        };
        let answer = pairings.get(participant_id).map(String::as_str);
        Ok(FlagState::from_latest(answer))
    }
}

/// Subjects from `<root>/registry.json`; registrations appended to
/// `<root>/registrations.jsonl`
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    subjects_path: PathBuf,
    registrations_path: PathBuf,
}

#[derive(Serialize)]
struct Registration<'a> {
    study_tag: &'a str,
    subject_id: &'a str,
}

impl DirectoryRegistry {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            subjects_path: root.join("registry.json"),
            registrations_path: root.join("registrations.jsonl"),
        }
    }

    pub fn registrations_path(&self) -> &Path {
        &self.registrations_path
    }
}

#[async_trait]
impl ClinicalRegistry for DirectoryRegistry {
    async fn find_subject(
        &self,
        _study_tag: &str,
        mrn: &str,
    ) -> WorkflowResult<Option<RegistrySubject>> {
        let subjects: HashMap<String, RegistrySubject> = match read_json(&self.subjects_path).await? {
            Some(subjects) => subjects,
            None => return Ok(None),
        };
        Ok(subjects.get(mrn).cloned())
    }

    async fn register_subject(
        &self,
        study_tag: &str,
        subject: &RegistrySubject,
    ) -> WorkflowResult<()> {
        let line = serde_json::to_string(&Registration {
            study_tag,
            subject_id: &subject.subject_id,
        })
        .map_err(|e| WorkflowError::dependency("clinical-registry", e.to_string()))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.registrations_path)
            .await
            .map_err(|e| WorkflowError::dependency("clinical-registry", e.to_string()))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| WorkflowError::dependency("clinical-registry", e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| WorkflowError::dependency("clinical-registry", e.to_string()))?;

        tracing::info!(study = study_tag, subject = %subject.subject_id, "Subject registered");
        Ok(())
    }
}

/// Parse a JSON file; `None` when it does not exist
async fn read_json<T>(path: &Path) -> WorkflowResult<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(WorkflowError::dependency(
                path.display().to_string(),
                e.to_string(),
            ))
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| WorkflowError::dependency(path.display().to_string(), e.to_string()))
}
