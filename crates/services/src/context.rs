//! Per-request deadline propagation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ServiceError;

/// Deadline carried by one request through every store, cache and catalog
/// call it makes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drives a collaborator call, abandoning it with
    /// [`ServiceError::Cancelled`] once the deadline passes.
    pub async fn run<F, T, E>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ServiceError>,
    {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(ServiceError::Cancelled),
            },
            None => call.await.map_err(Into::into),
        }
    }
}
