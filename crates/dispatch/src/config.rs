//! Transmitter configuration
//!
//! Loaded once at startup from a JSON file and passed to constructors. Every
//! field has a default so a config file only lists what differs.
//!
//! ```json
//! {
//!   "ledger_path": "./data/ledger.jsonl",
//!   "records_dir": "./data/records",
//!   "routes": [
//!     {
//!       "path": "/prod2525",
//!       "tenant": "prod",
//!       "project_id": "2525",
//!       "study_tag": "aou",
//!       "allowed_ips": ["10.0.0.5"]
//!     }
//!   ],
//!   "min_match_confidence": 2
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use transmitter_rules::{RecordFields, MAX_CONFIDENCE};

use crate::error::{DispatchError, DispatchResult};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitterConfig {
    /// JSONL ledger file
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Root of the file-backed record, affiliation and registry data
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Snapshot field names read by the rules
    #[serde(default)]
    pub fields: RecordFields,

    /// Lowest demographic match score that allows registry enrollment
    #[serde(default = "default_min_match_confidence")]
    pub min_match_confidence: u8,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// One inbound route and the record project it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route path, e.g. `/prod2525`
    pub path: String,

    /// Tenant / server tag
    pub tenant: String,

    /// Project every notification on this route must name
    pub project_id: String,

    #[serde(default = "default_study_tag")]
    pub study_tag: String,

    /// Client addresses allowed to call this route (exact match)
    #[serde(default)]
    pub allowed_ips: Vec<String>,

    /// Steps run for each notification, in order
    #[serde(default = "default_steps")]
    pub steps: Vec<StepKind>,
}

/// Built-in workflow steps a route can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StepKind {
    Intake,
    ConfirmAffiliation,
    AssessEvents,
    RegistryEnroll,
}

/// Operator notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_from")]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,
}

// Default value functions for serde
fn default_ledger_path() -> PathBuf {
    PathBuf::from("./data/ledger.jsonl")
}

fn default_records_dir() -> PathBuf {
    PathBuf::from("./data/records")
}

fn default_min_match_confidence() -> u8 {
    2
}

fn default_study_tag() -> String {
    "aou".to_string()
}

fn default_steps() -> Vec<StepKind> {
    vec![
        StepKind::Intake,
        StepKind::ConfirmAffiliation,
        StepKind::AssessEvents,
    ]
}

fn default_notify_from() -> String {
    "transmitter@localhost".to_string()
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            records_dir: default_records_dir(),
            routes: Vec::new(),
            fields: RecordFields::default(),
            min_match_confidence: default_min_match_confidence(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from: default_notify_from(),
            to: Vec::new(),
        }
    }
}

impl RouteConfig {
    pub fn new(
        path: impl Into<String>,
        tenant: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            tenant: tenant.into(),
            project_id: project_id.into(),
            study_tag: default_study_tag(),
            allowed_ips: Vec::new(),
            steps: default_steps(),
        }
    }

    pub fn with_allowed_ip(mut self, ip: impl Into<String>) -> Self {
        self.allowed_ips.push(ip.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<StepKind>) -> Self {
        self.steps = steps;
        self
    }

    pub fn ip_is_allowed(&self, client_address: &str) -> bool {
        self.allowed_ips.iter().any(|ip| ip == client_address)
    }
}

impl TransmitterConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file(path: &Path) -> DispatchResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if !(1..=MAX_CONFIDENCE).contains(&self.min_match_confidence) {
            return Err(DispatchError::config(format!(
                "min_match_confidence must be between 1 and {}, got {}",
                MAX_CONFIDENCE, self.min_match_confidence
            )));
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(DispatchError::config(format!(
                    "route path must start with '/': {}",
                    route.path
                )));
            }
            if route.tenant.trim().is_empty() || route.project_id.trim().is_empty() {
                return Err(DispatchError::config(format!(
                    "route {} needs a tenant and a project_id",
                    route.path
                )));
            }
            if !seen.insert(route.path.as_str()) {
                return Err(DispatchError::config(format!(
                    "duplicate route path: {}",
                    route.path
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TransmitterConfig::default();
        assert_eq!(config.min_match_confidence, 2);
        assert!(config.routes.is_empty());
        assert_eq!(config.fields.participant_id, "pmi_id_test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_route_gets_defaults() {
        let json = r#"{
            "routes": [{"path": "/prod2525", "tenant": "prod", "project_id": "2525"}]
        }"#;
        let config: TransmitterConfig = serde_json::from_str(json).unwrap();

        let route = &config.routes[0];
        assert_eq!(route.study_tag, "aou");
        assert!(route.allowed_ips.is_empty());
        assert_eq!(
            route.steps,
            vec![StepKind::Intake, StepKind::ConfirmAffiliation, StepKind::AssessEvents]
        );
        assert_eq!(config.ledger_path, PathBuf::from("./data/ledger.jsonl"));
    }

    #[test]
    fn test_steps_are_kebab_case() {
        let json = r#"{"path": "/x", "tenant": "t", "project_id": "1",
                       "steps": ["intake", "assess-events", "registry-enroll"]}"#;
        let route: RouteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(route.steps[2], StepKind::RegistryEnroll);
        assert_eq!(StepKind::ConfirmAffiliation.to_string(), "confirm-affiliation");
    }

    #[test]
    fn test_ip_allow_list_is_exact() {
        let route = RouteConfig::new("/prod2525", "prod", "2525").with_allowed_ip("10.0.0.5");
        assert!(route.ip_is_allowed("10.0.0.5"));
        assert!(!route.ip_is_allowed("10.0.0.50"));
        assert!(!RouteConfig::new("/p", "prod", "1").ip_is_allowed("10.0.0.5"));
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        for confidence in [0, 4] {
            let config = TransmitterConfig {
                min_match_confidence: confidence,
                ..TransmitterConfig::default()
            };
            assert!(matches!(config.validate(), Err(DispatchError::Config(_))));
        }

        for confidence in 1..=MAX_CONFIDENCE {
            let config = TransmitterConfig {
                min_match_confidence: confidence,
                ..TransmitterConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_duplicate_routes() {
        let config = TransmitterConfig {
            routes: vec![
                RouteConfig::new("/prod2525", "prod", "2525"),
                RouteConfig::new("/prod2525", "prod", "2526"),
            ],
            ..TransmitterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transmitter.json");
        std::fs::write(
            &path,
            r#"{"min_match_confidence": 3, "notify": {"to": ["ops@example.org"]}}"#,
        )
        .unwrap();

        let config = TransmitterConfig::from_file(&path).unwrap();
        assert_eq!(config.min_match_confidence, 3);
        assert_eq!(config.notify.to, vec!["ops@example.org".to_string()]);
        assert_eq!(config.notify.from, "transmitter@localhost");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempdir().unwrap();
        let err = TransmitterConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DispatchError::Io(_)));
    }
}
