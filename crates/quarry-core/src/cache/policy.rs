//! Cache expiry policy and the session clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Decides when cached resolution results must be refreshed.
///
/// Configured from `[cache]` in quarry.toml; `refresh_all` and `offline` are
/// set by the session's [`ResolutionOverride`](crate::repository::ResolutionOverride).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// How long a dynamic version listing stays fresh
    #[serde(default = "default_ttl_secs")]
    pub dynamic_version_ttl_secs: u64,

    /// How long metadata of a changing module stays fresh
    #[serde(default = "default_ttl_secs")]
    pub changing_module_ttl_secs: u64,

    #[serde(skip)]
    pub refresh_all: bool,

    #[serde(skip)]
    pub offline: bool,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            dynamic_version_ttl_secs: DEFAULT_TTL_SECS,
            changing_module_ttl_secs: DEFAULT_TTL_SECS,
            refresh_all: false,
            offline: false,
        }
    }
}

impl CachePolicy {
    pub fn must_refresh_version_list(&self, age: Duration) -> bool {
        self.expired(age, self.dynamic_version_ttl_secs)
    }

    /// Metadata of non-changing modules never expires on its own.
    pub fn must_refresh_module(&self, changing: bool, age: Duration) -> bool {
        if self.offline {
            return false;
        }
        self.refresh_all || (changing && age > Duration::from_secs(self.changing_module_ttl_secs))
    }

    /// A module recorded as missing is retried as often as dynamic listings.
    pub fn must_refresh_missing_module(&self, age: Duration) -> bool {
        self.expired(age, self.dynamic_version_ttl_secs)
    }

    pub fn must_refresh_artifacts(&self, changing: bool, age: Duration) -> bool {
        self.must_refresh_module(changing, age)
    }

    /// A downloaded file of a published version never changes, so only a
    /// refresh expires its recorded location.
    pub fn must_refresh_artifact(&self, age: Duration) -> bool {
        self.must_refresh_module(false, age)
    }

    fn expired(&self, age: Duration, ttl_secs: u64) -> bool {
        if self.offline {
            return false;
        }
        self.refresh_all || age > Duration::from_secs(ttl_secs)
    }
}

/// Source of the current time for cache entry ages.
pub trait TimeProvider: Send + Sync {
    fn current_time(&self) -> DateTime<Utc>;
}

/// Reports the moment the build started for the whole session, so every
/// expiry decision in one build agrees.
#[derive(Debug, Clone, Copy)]
pub struct BuildCommencedTimeProvider {
    commenced: DateTime<Utc>,
}

impl BuildCommencedTimeProvider {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(commenced: DateTime<Utc>) -> Self {
        Self { commenced }
    }
}

impl Default for BuildCommencedTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for BuildCommencedTimeProvider {
    fn current_time(&self) -> DateTime<Utc> {
        self.commenced
    }
}

/// Age of an entry written at `cached_at`; entries from the future are fresh.
pub fn entry_age(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - cached_at).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn listings_expire_after_ttl() {
        let policy = CachePolicy::default();
        assert!(!policy.must_refresh_version_list(HOUR));
        assert!(policy.must_refresh_version_list(HOUR * 25));
    }

    #[test]
    fn static_modules_never_expire() {
        let policy = CachePolicy::default();
        assert!(!policy.must_refresh_module(false, HOUR * 24 * 365));
        assert!(policy.must_refresh_module(true, HOUR * 25));
    }

    #[test]
    fn refresh_all_expires_everything() {
        let policy = CachePolicy {
            refresh_all: true,
            ..CachePolicy::default()
        };
        assert!(policy.must_refresh_version_list(Duration::ZERO));
        assert!(policy.must_refresh_module(false, Duration::ZERO));
        assert!(policy.must_refresh_missing_module(Duration::ZERO));
    }

    #[test]
    fn offline_keeps_everything() {
        let policy = CachePolicy {
            offline: true,
            refresh_all: true,
            ..CachePolicy::default()
        };
        assert!(!policy.must_refresh_version_list(HOUR * 1000));
        assert!(!policy.must_refresh_module(true, HOUR * 1000));
    }

    #[test]
    fn downloaded_artifacts_expire_only_on_refresh() {
        let policy = CachePolicy::default();
        assert!(!policy.must_refresh_artifact(HOUR * 24 * 365));

        let refresh = CachePolicy {
            refresh_all: true,
            ..CachePolicy::default()
        };
        assert!(refresh.must_refresh_artifact(Duration::ZERO));
    }

    #[test]
    fn future_entries_have_zero_age() {
        let now = Utc::now();
        let later = now + chrono::Duration::seconds(30);
        assert_eq!(entry_age(later, now), Duration::ZERO);
        assert_eq!(entry_age(now, later), Duration::from_secs(30));
    }

    #[test]
    fn build_commenced_time_is_stable() {
        let provider = BuildCommencedTimeProvider::new();
        assert_eq!(provider.current_time(), provider.current_time());
    }
}
