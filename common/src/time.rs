//! Timing constants for the balance ledger.

/// Service timing constants.
pub mod constants {
    use std::time::Duration;

    /// Interval between datastore connectivity checks (5 seconds).
    pub fn connection_check_interval() -> Duration {
        Duration::from_secs(5)
    }

    /// Age after which a cached rate snapshot is refreshed (1 hour).
    pub fn rate_refresh_interval() -> Duration {
        Duration::from_secs(60 * 60)
    }

    /// Timeout for a single request to the rate source (10 seconds).
    pub fn rate_request_timeout() -> Duration {
        Duration::from_secs(10)
    }

    /// Timeout for acquiring a datastore connection (5 seconds).
    pub fn database_acquire_timeout() -> Duration {
        Duration::from_secs(5)
    }
}
