//! Operator notifications for failed runs

use async_trait::async_trait;

use crate::config::NotifyConfig;
use crate::error::DispatchResult;

/// Delivers a message to the operators (email in production)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> DispatchResult<()>;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    config: NotifyConfig,
}

impl LogNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> DispatchResult<()> {
        tracing::error!(
            from = %self.config.from,
            to = ?self.config.to,
            subject,
            body,
            "Operator notification"
        );
        Ok(())
    }
}
