use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{SourceError, SourceResult};

/// Bounded exponential backoff for transient data-source failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31) as i32;
        let ms = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exp);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }

    /// Run `op`, retrying while it fails with [`SourceError::Transient`].
    ///
    /// Other errors are returned immediately. Once the budget is spent the
    /// last transient error is wrapped in [`SourceError::RetriesExhausted`].
    pub fn run<T, F>(&self, what: &str, mut op: F) -> SourceResult<T>
    where
        F: FnMut() -> SourceResult<T>,
    {
        let mut retry = 0;
        loop {
            match op() {
                Err(SourceError::Transient(reason)) => {
                    if retry >= self.max_retries {
                        return Err(SourceError::RetriesExhausted {
                            what: what.to_string(),
                            attempts: retry + 1,
                            last: reason,
                        });
                    }
                    retry += 1;
                    let delay = self.backoff(retry);
                    warn!(
                        "{} transient failure ({}), retry {}/{} in {:?}",
                        what, reason, retry, self.max_retries, delay
                    );
                    std::thread::sleep(delay);
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_recovers_from_transient() {
        let calls = Cell::new(0);
        let result = fast(3).run("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(SourceError::Transient("rate limited".into()))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhausts_budget() {
        let calls = Cell::new(0);
        let result: SourceResult<()> = fast(2).run("catalog", || {
            calls.set(calls.get() + 1);
            Err(SourceError::Transient("timeout".into()))
        });
        assert_eq!(calls.get(), 3);
        match result {
            Err(SourceError::RetriesExhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "timeout");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_permanent_errors_not_retried() {
        let calls = Cell::new(0);
        let result: SourceResult<()> = fast(5).run("dem", || {
            calls.set(calls.get() + 1);
            Err(SourceError::Unavailable("no tile".into()))
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(result, Err(SourceError::Unavailable("no tile".into())));
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff_ms: 100,
            max_backoff_ms: 1000,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(8), Duration::from_millis(1000));
    }
}
