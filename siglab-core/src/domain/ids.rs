use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque signal identifier.
///
/// Ordering is lexicographic on the token; the engine processes signals in
/// ascending id order so a backtest replays identically run after run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id from the row that introduced the signal.
    ///
    /// Uses BLAKE3 over a canonical JSON rendering, truncated to 16 hex chars.
    /// Importing the same file twice yields the same ids.
    pub fn derive(ordinal: usize, ticker: &str, buy_date: NaiveDate, sell_date: NaiveDate) -> Self {
        use serde_json::json;

        let canonical = json!({
            "buy_date": buy_date.to_string(),
            "ordinal": ordinal,
            "sell_date": sell_date.to_string(),
            "ticker": ticker,
        });
        let hash = blake3::hash(canonical.to_string().as_bytes());
        Self(hash.to_hex().as_str()[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn derive_is_deterministic() {
        let a = SignalId::derive(0, "AAPL", d(2024, 1, 2), d(2024, 2, 1));
        let b = SignalId::derive(0, "AAPL", d(2024, 1, 2), d(2024, 2, 1));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn derive_changes_with_ordinal() {
        let a = SignalId::derive(0, "AAPL", d(2024, 1, 2), d(2024, 2, 1));
        let b = SignalId::derive(1, "AAPL", d(2024, 1, 2), d(2024, 2, 1));
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = SignalId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
