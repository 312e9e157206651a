//! Graceful shutdown on SIGTERM and SIGINT.

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Watches for shutdown signals and cancels a token when one arrives.
///
/// The token is handed to `axum::serve`'s graceful-shutdown future, so
/// in-flight requests drain before the process exits.
pub struct SigDown {
    token: CancellationToken,
}

impl SigDown {
    /// Registers the signal handlers.
    ///
    /// Returns an error if SIGTERM registration fails.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let token = CancellationToken::new();
        let inner = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
            inner.cancel();
        });
        Ok(Self { token })
    }

    /// A clone of the cancellation token for distributing to subsystems.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}
