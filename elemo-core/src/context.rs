//! Request-scoped context
//!
//! A [`Context`] travels through every service operation. It carries the
//! principal the request acts on behalf of, plus the cancellation token and
//! deadline that bound every I/O call made while serving it.

use crate::domain::Id;
use crate::error::BoxError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context stopped accepting work
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    principal: Option<Id>,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the acting user
    pub fn with_user(mut self, user_id: Id) -> Self {
        self.principal = Some(user_id);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A derived context cancelled together with its parent.
    pub fn child(&self) -> Self {
        Self {
            principal: self.principal,
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// The principal the request acts on behalf of
    pub fn principal(&self) -> Option<Id> {
        self.principal
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns why the context is done, or `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first. The in-flight future is dropped on abort.
    pub async fn run<F, T, E>(&self, fut: F) -> std::result::Result<T, BoxError>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        if let Some(err) = self.err() {
            return Err(err.into());
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ContextError::Canceled.into()),
            () = deadline => Err(ContextError::DeadlineExceeded.into()),
            result = fut => result.map_err(Into::into),
        }
    }
}
