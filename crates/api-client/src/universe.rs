// In crates/api-client/src/universe.rs

use std::collections::HashSet;

use async_trait::async_trait;
use core_types::Symbol;

use crate::error::Result;

/// Supplies the ordered list of instruments to scan.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    async fn symbols(&self) -> Result<Vec<Symbol>>;
}

/// A fixed universe, usually the `scan.universe` list from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<Symbol>,
}

impl StaticUniverse {
    /// Normalizes and de-duplicates tickers, keeping first-seen order.
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let symbols = tickers
            .into_iter()
            .filter_map(|t| normalize_ticker(t.as_ref()))
            .filter(|s| seen.insert(s.clone()))
            .collect();
        Self { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[async_trait]
impl UniverseProvider for StaticUniverse {
    async fn symbols(&self) -> Result<Vec<Symbol>> {
        Ok(self.symbols.clone())
    }
}

/// Index listings write share classes as `BRK.B`; the chart API wants `BRK-B`.
pub fn normalize_ticker(raw: &str) -> Option<Symbol> {
    let ticker = raw.trim().to_uppercase().replace('.', "-");
    if ticker.is_empty() || ticker == "NAN" {
        return None;
    }
    Some(Symbol(ticker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_share_classes_and_case() {
        assert_eq!(normalize_ticker(" brk.b "), Some(Symbol::from("BRK-B")));
        assert_eq!(normalize_ticker("msft"), Some(Symbol::from("MSFT")));
        assert_eq!(normalize_ticker("   "), None);
        assert_eq!(normalize_ticker("nan"), None);
    }

    #[tokio::test]
    async fn static_universe_dedups_in_order() {
        let universe = StaticUniverse::new(["MSFT", "aapl", "msft", "", "BF.B"]);
        let symbols = universe.symbols().await.unwrap();
        let names: Vec<_> = symbols.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(names, vec!["MSFT", "AAPL", "BF-B"]);
    }
}
