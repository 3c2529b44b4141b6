//! Transmitter Dispatch - from inbound notification to response
//!
//! This crate wires the core crates into a running service: configuration,
//! per-route record handlers, the dispatcher, and the `transmitter` CLI.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod local;
pub mod notify;

pub use app::App;
pub use config::{NotifyConfig, RouteConfig, StepKind, TransmitterConfig};
pub use dispatcher::{Collaborators, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use handler::RecordHandler;
pub use local::{DirectoryAffiliations, DirectoryRecordSource, DirectoryRegistry};
pub use notify::{LogNotifier, Notifier};
