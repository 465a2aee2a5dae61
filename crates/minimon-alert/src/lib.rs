//! # minimon Alert
//!
//! Turns scrape events into notifications.
//!
//! ```text
//! ScrapeEvent -> ingestion (state machines) -> filter (spam) -> grouping -> dispatch -> notifiers
//! ```
//!
//! Stages are connected by bounded channels ([`QUEUE_CAPACITY`]); a full
//! queue blocks the producer, which throttles scraping when delivery is slow.

pub mod console;
pub mod dispatch;
pub mod filter;
pub mod grouping;
pub mod pipeline;
pub mod ring_buffer;
pub mod state_machine;

pub use console::ConsoleNotifier;
pub use dispatch::NotificationDispatcher;
pub use filter::{AlertFilters, MetricFilter, SPAM_THRESHOLD, SPAM_WINDOW};
pub use grouping::{AlertGrouping, MAX_BATCH};
pub use pipeline::{AlertPipeline, QUEUE_CAPACITY};
pub use ring_buffer::RingBuffer;
pub use state_machine::{Health, MetricStateMachine};
