//! Dispatcher - routes notifications to their record handler
//!
//! One dispatcher owns the service's single [`LockRegistry`]; every handler
//! it builds shares that registry, so notifications for the same record are
//! serialized even when they arrive on different routes.

use std::collections::HashMap;
use std::sync::Arc;

use transmitter_core::{InboundRequest, Response};
use transmitter_ledger::LedgerStore;
use transmitter_lock::LockRegistry;
use transmitter_rules::RuleEngine;
use transmitter_workflow::{
    AffiliationDirectory, AssessEventsStep, ClinicalRegistry, ConfirmAffiliationStep, IntakeStep,
    Pipeline, RecordSource, RegistryEnrollStep,
};

use crate::config::{RouteConfig, StepKind, TransmitterConfig};
use crate::handler::RecordHandler;
use crate::notify::Notifier;

/// External systems the built-in steps talk to
#[derive(Clone)]
pub struct Collaborators {
    pub records: Arc<dyn RecordSource>,
    pub directory: Arc<dyn AffiliationDirectory>,
    pub registry: Arc<dyn ClinicalRegistry>,
}

/// Route table of record handlers
pub struct Dispatcher {
    locks: Arc<LockRegistry>,
    handlers: HashMap<String, Arc<RecordHandler>>,
}

impl Dispatcher {
    /// Create a dispatcher with no routes
    pub fn new(locks: Arc<LockRegistry>) -> Self {
        Self {
            locks,
            handlers: HashMap::new(),
        }
    }

    /// Build a handler for every configured route
    pub fn from_config(
        config: &TransmitterConfig,
        ledger: Arc<dyn LedgerStore>,
        collaborators: &Collaborators,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut dispatcher = Self::new(Arc::new(LockRegistry::new()));

        for route in &config.routes {
            let pipeline = build_pipeline(route, config, &ledger, collaborators);
            tracing::info!(
                route = %route.path,
                steps = ?pipeline.step_names(),
                "Route registered"
            );
            let handler = RecordHandler::new(
                route.clone(),
                Arc::clone(&dispatcher.locks),
                pipeline,
                Arc::clone(&notifier),
            );
            dispatcher.register(handler);
        }

        dispatcher
    }

    /// Add (or replace) the handler for its route path
    pub fn register(&mut self, handler: RecordHandler) {
        self.handlers
            .insert(handler.route().path.clone(), Arc::new(handler));
    }

    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.locks
    }

    pub fn routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        routes.sort_unstable();
        routes
    }

    /// Handle one notification; unknown routes get `404`
    pub async fn dispatch(&self, request: &InboundRequest) -> Response {
        match self.handlers.get(&request.route) {
            Some(handler) => handler.handle(request).await,
            None => {
                tracing::info!(route = %request.route, "No handler for route");
                Response::NOT_FOUND
            }
        }
    }

    /// Handle a batch concurrently, one task per notification
    ///
    /// Responses come back in request order.
    pub async fn dispatch_all(&self, requests: Vec<InboundRequest>) -> Vec<Response> {
        let mut tasks = Vec::with_capacity(requests.len());

        for request in requests {
            match self.handlers.get(&request.route) {
                Some(handler) => {
                    let handler = Arc::clone(handler);
                    tasks.push(Some(tokio::spawn(async move {
                        handler.handle(&request).await
                    })));
                }
                None => {
                    tracing::info!(route = %request.route, "No handler for route");
                    tasks.push(None);
                }
            }
        }

        let mut responses = Vec::with_capacity(tasks.len());
        for task in tasks {
            let response = match task {
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Handler task failed");
                    Response::INTERNAL_ERROR
                }),
                None => Response::NOT_FOUND,
            };
            responses.push(response);
        }
        responses
    }
}

fn build_pipeline(
    route: &RouteConfig,
    config: &TransmitterConfig,
    ledger: &Arc<dyn LedgerStore>,
    collaborators: &Collaborators,
) -> Pipeline {
    let mut pipeline = Pipeline::new();

    for kind in &route.steps {
        pipeline = match kind {
            StepKind::Intake => {
                pipeline.with_step(IntakeStep::new(Arc::clone(&collaborators.records)))
            }
            StepKind::ConfirmAffiliation => pipeline.with_step(ConfirmAffiliationStep::new(
                Arc::clone(ledger),
                Arc::clone(&collaborators.directory),
                config.fields.clone(),
            )),
            StepKind::AssessEvents => pipeline.with_step(AssessEventsStep::new(
                Arc::clone(ledger),
                RuleEngine::new(config.fields.clone()),
            )),
            StepKind::RegistryEnroll => pipeline.with_step(RegistryEnrollStep::new(
                Arc::clone(ledger),
                Arc::clone(&collaborators.registry),
                config.fields.clone(),
                config.min_match_confidence,
            )),
        };
    }

    pipeline
}
