use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum quiet time between announcements, per category.
///
/// Lookup tries the exact category first, then the prefix before `:` (so
/// "text:4fa3" shares the "text" entry), then the default — which is sized
/// for person identities.
#[derive(Clone, Debug)]
pub struct CooldownPolicy {
    entries: HashMap<String, Duration>,
    default: Duration,
}

impl CooldownPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    pub fn with(mut self, category: &str, cooldown: Duration) -> Self {
        self.entries.insert(category.to_string(), cooldown);
        self
    }

    pub fn cooldown_for(&self, category: &str) -> Duration {
        if let Some(&d) = self.entries.get(category) {
            return d;
        }
        if let Some((prefix, _)) = category.split_once(':') {
            if let Some(&d) = self.entries.get(prefix) {
                return d;
            }
        }
        self.default
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        CooldownPolicy::new(Duration::from_secs(15))
            .with("obstacle", Duration::from_millis(2500))
            .with("objects", Duration::from_secs(4))
            .with("text", Duration::from_secs(5))
            .with("system", Duration::from_secs(2))
            .with("scan", Duration::from_secs(2))
            .with("caption", Duration::from_secs(2))
            .with("depth", Duration::from_secs(2))
            .with("replay", Duration::ZERO)
    }
}

/// Remembers when each category last spoke.
#[derive(Clone, Debug, Default)]
pub struct CooldownTable {
    last: HashMap<String, Instant>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the category has been quiet for at least `cooldown`.
    pub fn ready(&self, category: &str, cooldown: Duration, now: Instant) -> bool {
        self.last
            .get(category)
            .map(|&stamp| now.duration_since(stamp) >= cooldown)
            .unwrap_or(true)
    }

    /// Record that the category was accepted at `now`.
    pub fn stamp(&mut self, category: &str, now: Instant) {
        self.last.insert(category.to_string(), now);
    }

    /// Check and stamp in one step.
    pub fn accept(&mut self, category: &str, cooldown: Duration, now: Instant) -> bool {
        if self.ready(category, cooldown, now) {
            self.stamp(category, now);
            true
        } else {
            false
        }
    }
}
