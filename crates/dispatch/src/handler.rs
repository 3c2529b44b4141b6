//! Record handler - gatekeeping, record section, pipeline, response
//!
//! ```text
//! InboundRequest
//!     │
//!     ├── client not allowed ─────────► 403
//!     ├── not POST ───────────────────► 405
//!     ├── empty trigger ──────────────► 200
//!     ├── bad trigger / wrong project ► 400
//!     │
//!     ▼
//! acquire RecordSection(tenant, project, record)
//!     │
//!     ▼
//! Pipeline::run ──► halt response | 200
//!     │
//!     └── error ──► release section, notify operators ──► 500
//! ```

use std::sync::Arc;

use tracing::Instrument;
use transmitter_core::{InboundRequest, Response, ScopeKey, TriggerPayload};
use transmitter_lock::LockRegistry;
use transmitter_workflow::{ErrorKind, Pipeline, WorkflowContext, WorkflowError};

use crate::config::RouteConfig;
use crate::notify::Notifier;

/// Handles notifications for one configured route
pub struct RecordHandler {
    route: RouteConfig,
    locks: Arc<LockRegistry>,
    pipeline: Pipeline,
    notifier: Arc<dyn Notifier>,
}

impl RecordHandler {
    pub fn new(
        route: RouteConfig,
        locks: Arc<LockRegistry>,
        pipeline: Pipeline,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            route,
            locks,
            pipeline,
            notifier,
        }
    }

    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    /// Process one notification to completion
    pub async fn handle(&self, request: &InboundRequest) -> Response {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            route = %self.route.path,
        );
        self.handle_inner(request).instrument(span).await
    }

    async fn handle_inner(&self, request: &InboundRequest) -> Response {
        if !self.route.ip_is_allowed(&request.client_address) {
            tracing::info!(client = %request.client_address, "Client address not allowed");
            return Response::FORBIDDEN;
        }

        if request.method != "POST" {
            tracing::info!(method = %request.method, "Not a POST; nothing to do");
            return Response::METHOD_NOT_ALLOWED;
        }

        let trigger = match TriggerPayload::parse(&request.payload) {
            Ok(Some(trigger)) => trigger,
            Ok(None) => {
                tracing::info!("Trigger payload empty; nothing to do");
                return Response::OK;
            }
            Err(e) => return self.reject(&WorkflowError::from(e)),
        };

        if trigger.project_id != self.route.project_id {
            return self.reject(&WorkflowError::validation(format!(
                "project_id {} does not match route project {}",
                trigger.project_id, self.route.project_id
            )));
        }

        let scope = match ScopeKey::new(
            self.route.tenant.as_str(),
            trigger.project_id.as_str(),
            trigger.record_id.as_str(),
        ) {
            Ok(scope) => scope,
            Err(e) => return self.reject(&WorkflowError::from(e)),
        };

        tracing::debug!(scope = %scope, "Initial checks OK");
        let ctx = WorkflowContext::new(scope.clone(), self.route.study_tag.as_str(), trigger);

        let result = {
            let section = self.locks.acquire(&scope).await;
            self.pipeline.run(&section, ctx).await
        };

        match result {
            Ok(outcome) => {
                tracing::info!(
                    scope = %scope,
                    status = outcome.response.status,
                    halted_by = outcome.halted_by.as_deref().unwrap_or("-"),
                    "Run finished"
                );
                outcome.response
            }
            Err(e) if e.kind() == ErrorKind::Validation => self.reject(&e),
            Err(e) => {
                tracing::error!(scope = %scope, kind = %e.kind(), error = %e, "Run failed");
                self.notify_failure(&scope, &e).await;
                Response::INTERNAL_ERROR
            }
        }
    }

    fn reject(&self, error: &WorkflowError) -> Response {
        tracing::warn!(error = %error, "Rejecting notification");
        Response::BAD_REQUEST
    }

    async fn notify_failure(&self, scope: &ScopeKey, error: &WorkflowError) {
        let subject = "Transmitter exception";
        let body = format!("Run for {} failed ({}): {}", scope, error.kind(), error);
        if let Err(e) = self.notifier.notify(subject, &body).await {
            tracing::error!(error = %e, "Could not notify operators");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DispatchError, DispatchResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use transmitter_lock::RecordSection;
    use transmitter_workflow::{StepOutcome, WorkflowResult, WorkflowStep};

    #[derive(Default)]
    struct CollectingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for CollectingNotifier {
        async fn notify(&self, _subject: &str, body: &str) -> DispatchResult<()> {
            self.sent.lock().unwrap().push(body.to_string());
            Err(DispatchError::Notify("smtp down".to_string()))
        }
    }

    struct Outcome(Result<StepOutcome, &'static str>);

    #[async_trait]
    impl WorkflowStep for Outcome {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(
            &self,
            _section: &RecordSection,
            _ctx: &mut WorkflowContext,
        ) -> WorkflowResult<StepOutcome> {
            match self.0 {
                Ok(outcome) => Ok(outcome),
                Err(message) => Err(WorkflowError::dependency("fixed", message)),
            }
        }
    }

    fn handler(step: Outcome) -> (RecordHandler, Arc<CollectingNotifier>, Arc<LockRegistry>) {
        let notifier = Arc::new(CollectingNotifier::default());
        let locks = Arc::new(LockRegistry::new());
        let route = RouteConfig::new("/prod2525", "prod", "2525").with_allowed_ip("10.0.0.5");
        let handler = RecordHandler::new(
            route,
            Arc::clone(&locks),
            Pipeline::new().with_step(step),
            notifier.clone(),
        );
        (handler, notifier, locks)
    }

    fn trigger() -> serde_json::Value {
        json!({"project_id": "2525", "record": "17", "instrument": "enrollment"})
    }

    #[tokio::test]
    async fn test_gatekeeping() {
        let (handler, _, locks) = handler(Outcome(Ok(StepOutcome::Continue)));

        let denied = InboundRequest::post("/prod2525", "10.9.9.9", trigger());
        assert_eq!(handler.handle(&denied).await, Response::FORBIDDEN);

        let get = InboundRequest::new("/prod2525", "GET", "10.0.0.5", trigger());
        assert_eq!(handler.handle(&get).await, Response::METHOD_NOT_ALLOWED);

        let ping = InboundRequest::post("/prod2525", "10.0.0.5", json!({}));
        assert_eq!(handler.handle(&ping).await, Response::OK);

        let wrong_project = InboundRequest::post(
            "/prod2525",
            "10.0.0.5",
            json!({"project_id": "9999", "record": "17"}),
        );
        assert_eq!(handler.handle(&wrong_project).await, Response::BAD_REQUEST);

        let no_record = InboundRequest::post("/prod2525", "10.0.0.5", json!({"project_id": "2525"}));
        assert_eq!(handler.handle(&no_record).await, Response::BAD_REQUEST);

        // None of the rejected requests reached the lock registry
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (handler, notifier, locks) = handler(Outcome(Ok(StepOutcome::Continue)));
        let request = InboundRequest::post("/prod2525", "10.0.0.5", trigger());

        assert_eq!(handler.handle(&request).await, Response::OK);
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_halt_response_is_returned() {
        let (handler, _, _) = handler(Outcome(Ok(StepOutcome::Halt(Response::FORBIDDEN))));
        let request = InboundRequest::post("/prod2525", "10.0.0.5", trigger());

        assert_eq!(handler.handle(&request).await.status, 403);
    }

    #[tokio::test]
    async fn test_failed_run_notifies_and_releases() {
        let (handler, notifier, locks) = handler(Outcome(Err("registry unreachable")));
        let request = InboundRequest::post("/prod2525", "10.0.0.5", trigger());

        // Notifier failure does not change the response
        assert_eq!(handler.handle(&request).await, Response::INTERNAL_ERROR);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("prod2525.17"));
        assert!(sent[0].contains("registry unreachable"));

        let scope = ScopeKey::new("prod", "2525", "17").unwrap();
        assert!(locks.try_acquire(&scope).is_some());
    }
}
