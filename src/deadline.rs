//! Shared cancellation scope bounding one whole fan-out

use std::future::Future;
use std::time::Duration;
use log::{debug, trace};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Expiry used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// One time-bounded, cancellable scope.
/// Clones share the same token and expiry.
#[derive(Debug, Clone)]
pub struct Deadline
{   token: CancellationToken
  , expires_at: Instant
}

impl Deadline
{   /// Scope that expires `timeout` from now
    pub fn after(timeout: Duration) -> Self
    {   debug!("Creating deadline of {:?}", timeout);
        let now = Instant::now();
        let expires_at = now.checked_add(timeout)
          .unwrap_or_else(|| now + FAR_FUTURE);
        Deadline
        {   token: CancellationToken::new()
          , expires_at
        }
    }

    /// Cancel every holder of this scope
    pub fn cancel(&self)
    {   debug!("Deadline cancelled explicitly");
        self.token.cancel();
    }

    /// Cancels the scope when dropped
    pub fn guard(&self) -> DropGuard
    {   self.token.clone().drop_guard()
    }

    pub fn is_cancelled(&self) -> bool
    {   self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool
    {   Instant::now() >= self.expires_at
    }

    pub fn is_done(&self) -> bool
    {   self.is_cancelled() || self.is_expired()
    }

    pub fn remaining(&self) -> Duration
    {   self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Resolves once the scope is cancelled or expired
    pub async fn done(&self)
    {   tokio::select!
        { _ = self.token.cancelled() => {}
        , _ = tokio::time::sleep_until(self.expires_at) => {}
        }
    }

    /// Race `fut` against the scope. The future is dropped when the
    /// scope ends first, which tears down any in-flight connection.
    pub async fn run<F, T>(&self, fut: F)
      -> Result<T, crate::error::Error>
    where
      F: Future<Output = Result<T, crate::error::Error>>
    {   tokio::select!
        { biased;
          _ = self.token.cancelled() => {
            trace!("Call abandoned: scope cancelled");
            Err(crate::error::Error::Cancelled)
          }
        , _ = tokio::time::sleep_until(self.expires_at) => {
            trace!("Call abandoned: deadline elapsed");
            Err(crate::error::Error::Timeout)
          }
        , res = fut => res
        }
    }
}
