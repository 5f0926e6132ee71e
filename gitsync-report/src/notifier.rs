//! [`Reporter`] implementation: render the failures, hand them to a transport.

use chrono::Utc;

use gitsync_core::Settings;
use gitsync_engine::{FailureEntry, Reporter};

use crate::error::ReportError;
use crate::payload::ReportPayload;
use crate::render::ReportRenderer;
use crate::transport::Transport;

pub struct Notifier {
    renderer: ReportRenderer,
    transport: Transport,
}

impl Notifier {
    pub fn new(renderer: ReportRenderer, transport: Transport) -> Self {
        Self {
            renderer,
            transport,
        }
    }

    /// Renderer with `templates_dir` overrides and the configured transport.
    pub fn from_settings(settings: &Settings) -> Result<Self, ReportError> {
        Ok(Self::new(
            ReportRenderer::new(settings.templates_dir.as_deref())?,
            Transport::from_config(&settings.report)?,
        ))
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn compose(&self, failures: &[FailureEntry]) -> Result<ReportPayload, ReportError> {
        self.renderer.render(failures, Utc::now())
    }
}

impl Reporter for Notifier {
    type Error = ReportError;

    fn report(&self, failures: &[FailureEntry]) -> Result<(), ReportError> {
        let payload = self.compose(failures)?;
        tracing::info!(
            transport = self.transport.name(),
            failures = failures.len(),
            subject = %payload.subject,
            "sending failure report"
        );
        self.transport.deliver(&payload)
    }
}
