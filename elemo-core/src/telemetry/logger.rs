//! Service logger

/// Cloneable handle emitting structured `tracing` events tagged with the
/// service that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    service: &'static str,
}

impl Logger {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(service = self.service, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(service = self.service, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(service = self.service, "{}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("elemo")
    }
}
