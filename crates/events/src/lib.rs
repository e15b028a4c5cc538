// In crates/events/src/lib.rs

pub mod error;
pub mod payload;
pub mod sink;

pub use error::{Error, Result};
pub use payload::{NotifierMessage, ResultBatch, ScanSummary, build_messages, render_summary, summary_line};
pub use sink::{LogSink, ReportSink, WebhookSink, deliver_all};
