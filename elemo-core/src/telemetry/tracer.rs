//! Span-per-operation tracing
//!
//! Every public service operation starts exactly one span through a
//! [`Tracer`]. The returned [`SpanGuard`] ends the span when dropped, so
//! the span is closed on success, on early error returns and while
//! unwinding from a panic.

use crate::context::Context;
use std::fmt;

/// Backend half of a started span
pub trait SpanHandle: Send + Sync {
    fn add_event(&self, message: &str);
    fn end(&self);
}

/// Starts spans for service operations
pub trait Tracer: Send + Sync {
    fn start(&self, ctx: &Context, name: &str) -> SpanGuard;
}

/// A started span, ended on drop
pub struct SpanGuard {
    name: String,
    handle: Box<dyn SpanHandle>,
}

impl SpanGuard {
    pub fn new(name: impl Into<String>, handle: Box<dyn SpanHandle>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_event(&self, message: &str) {
        self.handle.add_event(message);
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.handle.end();
    }
}

impl fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGuard").field("name", &self.name).finish()
    }
}

struct NoopSpan;

impl SpanHandle for NoopSpan {
    fn add_event(&self, _message: &str) {}
    fn end(&self) {}
}

/// Tracer that records nothing; the default for every service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn start(&self, _ctx: &Context, name: &str) -> SpanGuard {
        SpanGuard::new(name, Box::new(NoopSpan))
    }
}

struct TracingSpan {
    span: tracing::Span,
}

impl SpanHandle for TracingSpan {
    fn add_event(&self, message: &str) {
        tracing::info!(parent: &self.span, "{}", message);
    }

    fn end(&self) {
        tracing::trace!(parent: &self.span, "span ended");
    }
}

/// Tracer backed by `tracing` spans
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl Tracer for TracingTracer {
    fn start(&self, ctx: &Context, name: &str) -> SpanGuard {
        let span = tracing::info_span!(
            "operation",
            name = %name,
            principal = tracing::field::Empty,
        );
        if let Some(principal) = ctx.principal() {
            span.record("principal", tracing::field::display(principal));
        }
        SpanGuard::new(name, Box::new(TracingSpan { span }))
    }
}
