//! Per-user notification settings.

use compact_str::CompactString;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use spread_core::{normalize_symbol, ComparisonResult};
use std::collections::BTreeSet;

/// Identity of an API or chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk appetite selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Safe,
    Degen,
}

/// Settings for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub notify_enabled: bool,
    /// Minimum |spread| in percent worth reporting.
    pub spread_threshold: f64,
    pub mode: TradingMode,
    /// Symbols the user follows. Empty means all.
    pub tracked_tokens: BTreeSet<CompactString>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notify_enabled: true,
            spread_threshold: 1.0,
            mode: TradingMode::Safe,
            tracked_tokens: BTreeSet::new(),
        }
    }
}

impl UserSettings {
    pub fn tracks(&self, symbol: &str) -> bool {
        self.tracked_tokens.is_empty() || self.tracked_tokens.contains(&normalize_symbol(symbol))
    }

    /// True if `result` is valid, tracked and at or above the threshold.
    pub fn accepts(&self, result: &ComparisonResult) -> bool {
        self.tracks(&result.symbol)
            && result
                .ranking_spread()
                .is_some_and(|spread| spread >= self.spread_threshold)
    }

    /// Upper-case every tracked symbol.
    fn normalized(mut self) -> Self {
        self.tracked_tokens = self
            .tracked_tokens
            .iter()
            .map(|s| normalize_symbol(s))
            .collect();
        self
    }
}

/// Settings keyed by user, shared through application state.
#[derive(Debug, Default)]
pub struct SessionStore {
    users: DashMap<UserId, UserSettings>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for `user`, or defaults when the user is unknown.
    pub fn get(&self, user: UserId) -> UserSettings {
        self.users
            .get(&user)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn update(&self, user: UserId, settings: UserSettings) -> UserSettings {
        let settings = settings.normalized();
        self.users.insert(user, settings.clone());
        settings
    }

    /// Flip whether `user` tracks `symbol`, returning the new state.
    ///
    /// An empty tracked set means every symbol in `universe`, so the first
    /// toggle expands it before removing.
    pub fn toggle_token(&self, user: UserId, symbol: &str, universe: &[CompactString]) -> bool {
        let symbol = normalize_symbol(symbol);
        let mut settings = self.users.entry(user).or_default();
        let tracked = &mut settings.tracked_tokens;

        if tracked.is_empty() {
            tracked.extend(universe.iter().cloned());
        }
        let now_tracked = if tracked.remove(&symbol) {
            false
        } else {
            tracked.insert(symbol);
            true
        };

        // Back to the full universe collapses to "all".
        if !universe.is_empty() && universe.iter().all(|s| tracked.contains(s)) {
            tracked.clear();
        }
        now_tracked
    }

    pub fn remove(&self, user: UserId) -> Option<UserSettings> {
        self.users.remove(&user).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use spread_core::{RawQuote, RejectReason};

    fn universe() -> Vec<CompactString> {
        ["BONK", "JUP", "SOL"].iter().map(|s| CompactString::new(s)).collect()
    }

    fn result(symbol: &str, spread: f64) -> ComparisonResult {
        let quote = RawQuote {
            price: 1.0,
            volume_24h: 5_000.0,
            trend_24h: None,
            slippage: None,
            source: CompactString::new("Jupiter"),
            timestamp: Utc::now(),
        };
        ComparisonResult::valid(symbol, &quote, &quote, spread, quote.timestamp)
    }

    #[test]
    fn test_unknown_user_gets_defaults() {
        let store = SessionStore::new();
        let settings = store.get(UserId(42));
        assert!(settings.notify_enabled);
        assert_eq!(settings.spread_threshold, 1.0);
        assert_eq!(settings.mode, TradingMode::Safe);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_normalizes_symbols() {
        let store = SessionStore::new();
        let settings = UserSettings {
            tracked_tokens: ["sol", "Jup"].iter().map(|s| CompactString::new(s)).collect(),
            mode: TradingMode::Degen,
            ..UserSettings::default()
        };
        store.update(UserId(1), settings);

        let stored = store.get(UserId(1));
        assert!(stored.tracked_tokens.contains("SOL"));
        assert!(stored.tracked_tokens.contains("JUP"));
        assert_eq!(stored.mode, TradingMode::Degen);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_toggle_token() {
        let store = SessionStore::new();
        let user = UserId(7);

        assert!(!store.toggle_token(user, "sol", &universe()));
        let settings = store.get(user);
        assert!(!settings.tracks("SOL"));
        assert!(settings.tracks("JUP"));

        assert!(store.toggle_token(user, "SOL", &universe()));
        assert!(store.get(user).tracked_tokens.is_empty());
        assert!(store.get(user).tracks("SOL"));
    }

    #[test]
    fn test_accepts() {
        let mut settings = UserSettings::default();
        assert!(settings.accepts(&result("SOL", -1.5)));
        assert!(settings.accepts(&result("SOL", 1.0)));
        assert!(!settings.accepts(&result("SOL", 0.5)));

        settings.tracked_tokens.insert(CompactString::new("JUP"));
        assert!(!settings.accepts(&result("SOL", 3.0)));
        assert!(settings.accepts(&result("JUP", 3.0)));

        let invalid = ComparisonResult::rejected(
            "JUP",
            None,
            None,
            Some(15.0),
            RejectReason::SpreadTooHigh,
            "Spread too high: +15.00%",
            Utc::now(),
        );
        assert!(!settings.accepts(&invalid));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        store.update(UserId(1), UserSettings::default());
        assert!(store.remove(UserId(1)).is_some());
        assert!(store.remove(UserId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_settings_json_shape() {
        let json = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(json["mode"], "safe");
        assert_eq!(json["tracked_tokens"], serde_json::json!([]));
        let parsed: UserSettings = serde_json::from_str(r#"{"spread_threshold": 2.5}"#).unwrap();
        assert_eq!(parsed.spread_threshold, 2.5);
        assert!(parsed.notify_enabled);
    }
}
