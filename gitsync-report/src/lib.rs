//! # gitsync-report
//!
//! Turns the failures of a sync batch into a report (Tera-rendered subject
//! and body plus the combined logs as an attachment) and delivers it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gitsync_core::Settings;
//! use gitsync_engine::{FailureEntry, Reporter};
//! use gitsync_report::Notifier;
//!
//! fn notify(settings: &Settings, failures: &[FailureEntry]) {
//!     if let Ok(notifier) = Notifier::from_settings(settings) {
//!         if let Err(err) = notifier.report(failures) {
//!             eprintln!("report not delivered: {err}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod notifier;
pub mod payload;
pub mod render;
pub mod transport;

pub use context::ReportContext;
pub use error::ReportError;
pub use notifier::Notifier;
pub use payload::{Attachment, ReportPayload};
pub use render::ReportRenderer;
pub use transport::{SmtpMail, Transport};
