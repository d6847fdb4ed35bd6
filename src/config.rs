//! # Binder configuration.
//!
//! Provides [`BindConfig`], the settings a [`Binder`](crate::Binder) applies to
//! every producer it spawns.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no deadline (`deadline()` returns `None`)

use std::time::Duration;

/// Settings applied by a [`Binder`](crate::Binder) to each bound producer.
///
/// ## Field semantics
/// - `timeout`: deadline for the whole producer run (`0s` = none)
/// - `catch_panics`: turn producer panics into an internal-error response
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct BindConfig {
    /// Deadline for a producer run.
    ///
    /// - `Duration::ZERO` = the producer runs until it completes or interest ends
    /// - `> 0` = on expiry the producer is cancelled and
    ///   [`ErrorResponse::timeout`](crate::ErrorResponse::timeout) is pushed as final response
    pub timeout: Duration,

    /// Whether a panicking producer is answered with an internal error.
    ///
    /// When `false`, the panic propagates into the spawned task and nothing is
    /// pushed; observers only learn about it through loss of the producer.
    pub catch_panics: bool,
}

impl BindConfig {
    /// Returns the producer deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → producer cancelled after `d`
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Sets the producer deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for BindConfig {
    /// Default configuration:
    ///
    /// - `timeout = 0s` (no deadline)
    /// - `catch_panics = true`
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            catch_panics: true,
        }
    }
}
