//! services/portal/src/app/mount.rs
//!
//! Ties in-flight requests to the lifetime of the view that issued them.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::app::ViewError;

/// Whether a view is still on screen. Results of requests that finish after
/// `unmount` are dropped instead of being applied.
#[derive(Clone, Debug, Default)]
pub struct Mount {
    token: CancellationToken,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mount that is torn down together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Runs `fut` unless the view goes away first. The future is dropped on
    /// unmount; a result that races with unmount is discarded as well.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ViewError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ViewError::Unmounted),
            output = fut => {
                if self.is_mounted() {
                    Ok(output)
                } else {
                    Err(ViewError::Unmounted)
                }
            }
        }
    }
}
