//! Error types for the world runtime binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the run itself, so `main` can
//! propagate everything with `?`.

/// Top-level error for the runtime binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: glade_core::config::ConfigError,
    },

    /// Tick timing is unusable.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: glade_core::clock::ClockError,
    },

    /// Initial world construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: glade_world::WorldError,
    },

    /// The scheduler failed or a tick aborted.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: glade_core::scheduler::SchedulerError,
    },

    /// The gateway server failed to start.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying gateway error.
        #[from]
        source: glade_gateway::GatewayError,
    },
}
