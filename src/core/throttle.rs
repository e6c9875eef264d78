//! Call-site throttling for repetitive log statements
//!
//! Each throttled statement gets an entry in a [`ThrottleRegistry`], keyed
//! either by the statement's source location or by a caller-chosen name.
//! The registry decides whether the current occurrence should be logged:
//!
//! - **first N**: the first `n` occurrences pass, the rest are suppressed
//! - **every N**: occurrences 1, n+1, 2n+1 and so on pass
//! - **every interval**: the first occurrence passes, later ones only once
//!   the interval has elapsed since the last one that passed
//!
//! # Example
//!
//! ```
//! use rust_cascade_logger::core::{ThrottleKey, ThrottleRegistry};
//!
//! let registry = ThrottleRegistry::new();
//! let key = ThrottleKey::named("retry-loop");
//!
//! let passed: Vec<bool> = (0..5).map(|_| registry.every_n(&key, 2)).collect();
//! assert_eq!(passed, vec![true, false, true, false, true]);
//! ```

use super::log_record::SourceLocation;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Identity of a throttled statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThrottleKey {
    /// Keyed by where the statement is in the source
    Site(SourceLocation),
    /// Keyed by a name the caller owns, shared by every statement using it
    Named(String),
}

impl ThrottleKey {
    /// Key for the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn here() -> Self {
        ThrottleKey::Site(SourceLocation::caller())
    }

    pub fn named(name: impl Into<String>) -> Self {
        ThrottleKey::Named(name.into())
    }
}

impl From<SourceLocation> for ThrottleKey {
    fn from(location: SourceLocation) -> Self {
        ThrottleKey::Site(location)
    }
}

#[derive(Debug, Default)]
struct SiteState {
    /// Occurrences seen so far
    seen: u64,
    /// When an interval-throttled occurrence last passed
    last_passed: Option<Instant>,
}

/// Per-statement counters for throttled logging
#[derive(Debug, Default)]
pub struct ThrottleRegistry {
    sites: Mutex<HashMap<ThrottleKey, SiteState>>,
}

impl ThrottleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first `n` occurrences of `key`.
    pub fn first_n(&self, key: &ThrottleKey, n: u64) -> bool {
        self.with_site(key, |site| {
            if site.seen < n {
                site.seen += 1;
                true
            } else {
                false
            }
        })
    }

    /// True for every `n`th occurrence of `key`, starting with the first.
    ///
    /// `n` of zero or one lets every occurrence through.
    pub fn every_n(&self, key: &ThrottleKey, n: u64) -> bool {
        self.with_site(key, |site| {
            let index = site.seen;
            site.seen += 1;
            n <= 1 || index % n == 0
        })
    }

    /// True when at least `interval` has passed since `key` last passed.
    pub fn every_interval(&self, key: &ThrottleKey, interval: Duration) -> bool {
        let now = Instant::now();
        self.with_site(key, |site| {
            site.seen += 1;
            match site.last_passed {
                Some(last) if now.saturating_duration_since(last) < interval => false,
                _ => {
                    site.last_passed = Some(now);
                    true
                }
            }
        })
    }

    /// Number of occurrences recorded for `key`.
    pub fn occurrences(&self, key: &ThrottleKey) -> u64 {
        self.sites.lock().get(key).map_or(0, |site| site.seen)
    }

    /// Number of distinct statements tracked.
    pub fn len(&self) -> usize {
        self.sites.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every statement's history.
    pub fn reset(&self) {
        self.sites.lock().clear();
    }

    fn with_site<R>(&self, key: &ThrottleKey, f: impl FnOnce(&mut SiteState) -> R) -> R {
        let mut sites = self.sites.lock();
        // Avoid cloning the key on the hot path once the entry exists
        if let Some(site) = sites.get_mut(key) {
            return f(site);
        }
        f(sites.entry(key.clone()).or_default())
    }
}
