//! Log-and-propagate helpers for `Result`.

use std::fmt::Display;

use tracing::{error, warn};

/// Logging adapters for `Result`, so call sites can record a failure
/// without breaking the `?` flow.
///
/// ```ignore
/// use recap_server::result_ext::ResultExt;
///
/// let _ = scheduler.dispatch_once().await.log("Wake dispatch failed");
/// ```
pub trait ResultExt<T, E> {
    /// Log at error level if this is an `Err`, then hand the result back.
    fn log<S: ToString>(self, message: S) -> Result<T, E>;

    /// Log at warn level if this is an `Err`, then hand the result back.
    ///
    /// For failures a later pass absorbs anyway, like a recovery sweep
    /// that reruns on its next tick.
    fn log_warn<S: ToString>(self, message: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, message: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let location = std::panic::Location::caller();
            error!(
                target: "recap_server",
                error = %e,
                location = %location,
                "{}",
                message.to_string()
            );
        }
        self
    }

    #[track_caller]
    fn log_warn<S: ToString>(self, message: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let location = std::panic::Location::caller();
            warn!(
                target: "recap_server",
                error = %e,
                location = %location,
                "{}",
                message.to_string()
            );
        }
        self
    }
}
