//! Application wiring - ledger, collaborators and dispatcher from one config

use std::path::Path;
use std::sync::Arc;

use transmitter_core::{InboundRequest, ScopeKey};
use transmitter_ledger::{JsonlLedger, LedgerFact, LedgerStore};

use crate::config::TransmitterConfig;
use crate::dispatcher::{Collaborators, Dispatcher};
use crate::error::DispatchResult;
use crate::local::{DirectoryAffiliations, DirectoryRecordSource, DirectoryRegistry};
use crate::notify::LogNotifier;

/// Everything a running transmitter needs
pub struct App {
    pub config: TransmitterConfig,
    pub ledger: Arc<JsonlLedger>,
    pub dispatcher: Dispatcher,
}

impl App {
    /// Open the ledger and build the dispatcher with file-backed collaborators
    pub fn new(config: TransmitterConfig) -> DispatchResult<Self> {
        config.validate()?;
        let ledger = Arc::new(JsonlLedger::open(&config.ledger_path)?);

        let root = &config.records_dir;
        let collaborators = Collaborators {
            records: Arc::new(DirectoryRecordSource::new(root)),
            directory: Arc::new(DirectoryAffiliations::new(root)),
            registry: Arc::new(DirectoryRegistry::new(root)),
        };
        let ledger_store: Arc<dyn LedgerStore> = ledger.clone();
        let dispatcher = Dispatcher::from_config(
            &config,
            ledger_store,
            &collaborators,
            Arc::new(LogNotifier::new(config.notify.clone())),
        );

        Ok(Self {
            config,
            ledger,
            dispatcher,
        })
    }

    pub fn from_file(path: &Path) -> DispatchResult<Self> {
        Self::new(TransmitterConfig::from_file(path)?)
    }

    /// Read recorded notifications, one JSON `InboundRequest` per line
    pub fn read_requests(path: &Path) -> DispatchResult<Vec<InboundRequest>> {
        let content = std::fs::read_to_string(path)?;
        let mut requests = Vec::new();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            requests.push(serde_json::from_str(line)?);
        }
        Ok(requests)
    }

    /// Ledger history of one record, oldest first
    pub fn facts(&self, scope: &ScopeKey) -> DispatchResult<Vec<LedgerFact>> {
        Ok(self.ledger.facts(scope)?)
    }
}
