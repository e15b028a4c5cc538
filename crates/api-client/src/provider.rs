// In crates/api-client/src/provider.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{RawPricePoint, Symbol};

use crate::error::Result;
use crate::rate_limiter::RateGate;

/// A source of daily closing prices.
#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    /// Returns the daily closes of `symbol` between `start` and `end`, both
    /// inclusive. Points may be unordered, repeated, or carry a missing close;
    /// the preprocessor cleans them up.
    async fn fetch_daily_closes(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<RawPricePoint>>;

    /// Waits until the provider accepts another request.
    ///
    /// Callers await this before each fetch, outside any fetch deadline, so that
    /// time spent queueing for a rate limit is not charged to the request.
    async fn ready(&self) {}
}

#[async_trait]
impl<P: PriceDataProvider + ?Sized> PriceDataProvider for Arc<P> {
    async fn fetch_daily_closes(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<RawPricePoint>> {
        (**self).fetch_daily_closes(symbol, start, end, adjusted).await
    }

    async fn ready(&self) {
        (**self).ready().await
    }
}

/// Wraps a provider behind a shared gate: `ready` takes a token, the fetch itself is passed through.
pub struct GatedProvider<P> {
    inner: P,
    gate: RateGate,
}

impl<P: PriceDataProvider> GatedProvider<P> {
    pub fn new(inner: P, gate: RateGate) -> Self {
        Self { inner, gate }
    }
}

#[async_trait]
impl<P: PriceDataProvider> PriceDataProvider for GatedProvider<P> {
    async fn fetch_daily_closes(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<RawPricePoint>> {
        self.inner.fetch_daily_closes(symbol, start, end, adjusted).await
    }

    async fn ready(&self) {
        self.gate.acquire().await;
        self.inner.ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl PriceDataProvider for Counting {
        async fn fetch_daily_closes(
            &self,
            _symbol: &Symbol,
            _start: NaiveDate,
            _end: NaiveDate,
            _adjusted: bool,
        ) -> Result<Vec<RawPricePoint>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gated_provider_waits_for_the_gate() {
        let inner = Arc::new(Counting(AtomicUsize::new(0)));
        let provider = GatedProvider::new(inner.clone(), RateGate::new(Duration::from_millis(200), 1));
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let symbol = Symbol::from("AAPL");

        let start = Instant::now();
        for _ in 0..4 {
            provider.ready().await;
            provider.fetch_daily_closes(&symbol, day, day, false).await.unwrap();
        }
        assert_eq!(inner.0.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_itself_does_not_queue_on_the_gate() {
        let inner = Arc::new(Counting(AtomicUsize::new(0)));
        let provider = GatedProvider::new(inner.clone(), RateGate::new(Duration::from_secs(10), 1));
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let symbol = Symbol::from("AAPL");

        provider.ready().await;
        let start = Instant::now();
        provider.fetch_daily_closes(&symbol, day, day, false).await.unwrap();
        provider.fetch_daily_closes(&symbol, day, day, false).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        // The next token is still ten seconds away.
        provider.ready().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
