//! # minimon Protocols
//!
//! Core protocol definitions for the minimon monitoring agent.
//! Contains the shared data model and the collaborator traits; the
//! implementations live in the other crates.
//!
//! ## Core Types
//!
//! - [`Message`] - A notification produced by the alert pipeline
//! - [`ScrapeEvent`] - An observation published by a probe
//!
//! ## Core Traits
//!
//! - [`Probe`] / [`UpdateTask`] - Periodic health checks
//! - [`Notifier`] - Delivery channels
//! - [`KvStore`] - Bookkeeping key-value store

pub mod error;
pub mod event;
pub mod message;
pub mod naming;
pub mod notifier;
pub mod probe;
pub mod storage;

pub use error::{NotifierError, ProbeError, StorageError};
pub use event::{MetricId, ScrapeEvent};
pub use message::{Message, MessageKind};
pub use naming::is_valid_name;
pub use notifier::Notifier;
pub use probe::{FnTask, MetricHandle, Probe, ScrapeSink, UpdateTask, UpdateTaskList};
pub use storage::KvStore;
