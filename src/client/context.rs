use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{ClientError, ClientResult};

/// Deadline and cancellation signal for client operations.
///
/// Every [`StoreClient`](crate::StoreClient) operation takes a context. A
/// cancelled or expired operation stops at its next await point; whatever it
/// had already sent to the backend stays there.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Expire `timeout` from now, or earlier if a deadline is already set
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Expire at `deadline`, or earlier if a deadline is already set
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `operation_future` until it finishes, the token fires or the deadline passes
    pub(crate) async fn run<F, T>(&self, operation: &'static str, operation_future: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled { operation });
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ClientError::Cancelled { operation }),
                result = operation_future => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or(Err(ClientError::DeadlineExceeded { operation })),
            None => guarded.await,
        }
    }

    /// Resolves with the matching error once the context is cancelled or expired
    pub(crate) fn interrupted(
        &self,
        operation: &'static str,
    ) -> impl Future<Output = ClientError> + Send + 'static {
        let cancel = self.cancel.clone();
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ClientError::Cancelled { operation },
                    _ = tokio::time::sleep_until(deadline) => ClientError::DeadlineExceeded { operation },
                },
                None => {
                    cancel.cancelled().await;
                    ClientError::Cancelled { operation }
                }
            }
        }
    }
}
