//! Fixed Window Counter
//!
//! The per-key record and the counting step applied to it.

use crate::cache::WriteBack;
use crate::error::{CacheError, Result};

// == Rate Limit Record ==
/// Hits counted in the current window of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    /// End of the window, Unix milliseconds
    pub window_expires_at: u64,
}

// == Decision ==
/// Outcome of one counting step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Over the limit; the window ends in `remaining_ms`
    Deny { remaining_ms: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Applies one hit to `current` at time `now`.
///
/// - no record, or `now` strictly past the window: start a new window with
///   a count of one and allow
/// - under `times`: count the hit and allow, keeping the window end
/// - otherwise deny with the time left in the window, writing nothing
pub fn count_hit(
    current: Option<&RateLimitRecord>,
    now: u64,
    times: u32,
    window_ms: u64,
) -> Result<(WriteBack<RateLimitRecord>, Decision)> {
    match current {
        Some(record) if now <= record.window_expires_at => {
            if record.count < times {
                let next = RateLimitRecord {
                    count: record.count + 1,
                    window_expires_at: record.window_expires_at,
                };
                Ok((WriteBack::Put(next), Decision::Allow))
            } else {
                let remaining_ms = record.window_expires_at.saturating_sub(now);
                Ok((WriteBack::Keep, Decision::Deny { remaining_ms }))
            }
        }
        _ => {
            let window_expires_at = now.checked_add(window_ms).ok_or_else(|| {
                CacheError::Overflow(format!("window end {now} + {window_ms}ms"))
            })?;
            let fresh = RateLimitRecord {
                count: 1,
                window_expires_at,
            };
            Ok((WriteBack::Put(fresh), Decision::Allow))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(count: u32, window_expires_at: u64) -> RateLimitRecord {
        RateLimitRecord {
            count,
            window_expires_at,
        }
    }

    #[test]
    fn test_first_hit_opens_window() {
        let (write, decision) = count_hit(None, 1_000, 3, 5_000).unwrap();

        assert_eq!(write, WriteBack::Put(record(1, 6_000)));
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_hit_within_window_counts() {
        let (write, decision) = count_hit(Some(&record(2, 6_000)), 3_000, 3, 5_000).unwrap();

        assert_eq!(write, WriteBack::Put(record(3, 6_000)));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_hit_at_limit_denies_without_writing() {
        let (write, decision) = count_hit(Some(&record(3, 6_000)), 4_000, 3, 5_000).unwrap();

        assert_eq!(write, WriteBack::Keep);
        assert_eq!(decision, Decision::Deny { remaining_ms: 2_000 });
    }

    #[test]
    fn test_window_end_is_inclusive() {
        let (_, at_end) = count_hit(Some(&record(3, 6_000)), 6_000, 3, 5_000).unwrap();
        assert_eq!(at_end, Decision::Deny { remaining_ms: 0 });

        let (write, after_end) = count_hit(Some(&record(3, 6_000)), 6_001, 3, 5_000).unwrap();
        assert_eq!(after_end, Decision::Allow);
        assert_eq!(write, WriteBack::Put(record(1, 11_001)));
    }

    #[test]
    fn test_zero_times_still_admits_window_opener() {
        let (_, first) = count_hit(None, 0, 0, 1_000).unwrap();
        let (_, second) = count_hit(Some(&record(1, 1_000)), 10, 0, 1_000).unwrap();

        assert_eq!(first, Decision::Allow);
        assert_eq!(second, Decision::Deny { remaining_ms: 990 });
    }

    #[test]
    fn test_window_overflow_is_an_error() {
        let result = count_hit(None, u64::MAX, 1, 1);
        assert!(matches!(result, Err(CacheError::Overflow(_))));
    }
}
