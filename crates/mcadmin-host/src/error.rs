//! Error types for the host binary.

/// Top-level error for the host binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`. Data API startup
/// failures are absent: they disable the API but never stop
/// the simulation.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: mcadmin_core::ConfigError,
    },

    /// The authority thread could not be started or stopped cleanly.
    #[error("authority error: {source}")]
    Authority {
        /// The underlying authority error.
        #[from]
        source: mcadmin_core::AuthorityError,
    },

    /// Waiting for the termination signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A blocking shutdown task failed to complete.
    #[error("shutdown error: {message}")]
    Shutdown {
        /// Description of the failure.
        message: String,
    },
}
