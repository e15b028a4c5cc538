// In crates/api-client/src/lib.rs

use app_config::types::DataProviderSettings;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use core_types::{RawPricePoint, Symbol};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

pub mod error;
pub mod provider;
pub mod rate_limiter;
pub mod types;
pub mod universe;

// Re-export public types
pub use error::{Error, Result};
pub use provider::{GatedProvider, PriceDataProvider};
pub use rate_limiter::RateGate;
pub use types::*;
pub use universe::{StaticUniverse, UniverseProvider, normalize_ticker};

impl ApiClient {
    /// Constructs a new ApiClient from DataProviderSettings.
    pub fn new(settings: &DataProviderSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|e| Error::ClientBuildError(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        // Sent on every request as `x-api-key`, for proxies that require one.
        if let Some(key) = &settings.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| Error::ClientBuildError(format!("invalid api key: {e}")))?;
            headers.insert("x-api-key", value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(ApiClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            initial_backoff: settings.initial_backoff(),
        })
    }

    /// Fetches daily bars for one symbol.
    ///
    /// This corresponds to the `GET /v8/finance/chart/{symbol}` endpoint.
    /// Rate limiting (429) and server errors are retried with exponential
    /// backoff; any other failure is returned at once.
    pub async fn get_daily_chart(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<RawPricePoint>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol.0);
        // period2 is exclusive upstream, so ask for the midnight after `end`.
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let params = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
            ("includeAdjustedClose", "true".to_string()),
        ];

        let mut attempt = 0;
        let mut backoff = self.initial_backoff;
        loop {
            let response = self.http_client.get(&url).query(&params).send().await;

            let retryable = match &response {
                Ok(resp) => {
                    let status = resp.status();
                    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                }
                Err(e) => e.is_timeout() || e.is_connect(),
            };

            if retryable && attempt < self.max_retries {
                attempt += 1;
                tracing::warn!(
                    symbol = %symbol,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient data provider failure, retrying."
                );
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                continue;
            }

            let response = response.map_err(Error::RequestFailed)?;
            let status = response.status();
            let body = response.text().await.map_err(Error::RequestFailed)?;

            if !status.is_success() {
                // Unknown symbols come back as 404 with a chart error object.
                return match parse_chart_response(&body, adjusted) {
                    Err(err @ Error::ApiError { .. }) => Err(err),
                    _ => Err(Error::HttpStatus { status: status.as_u16() }),
                };
            }

            let points = parse_chart_response(&body, adjusted)?;
            tracing::debug!(symbol = %symbol, points = points.len(), attempt, "Fetched daily chart.");
            return Ok(points);
        }
    }
}

#[async_trait]
impl PriceDataProvider for ApiClient {
    async fn fetch_daily_closes(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<RawPricePoint>> {
        self.get_daily_chart(symbol, start, end, adjusted).await
    }
}

/// Converts a chart payload into raw daily points.
///
/// With `adjusted` set, the adjusted close series is used when the payload
/// carries one. Null closes are kept as `None` for the preprocessor to drop.
pub fn parse_chart_response(body: &str, adjusted: bool) -> Result<Vec<RawPricePoint>> {
    let response: ChartResponse = serde_json::from_str(body).map_err(Error::DeserializationFailed)?;

    if let Some(err) = response.chart.error {
        return Err(Error::ApiError { code: err.code, msg: err.description });
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::EmptyPayload("chart.result".to_string()))?;

    let ChartResult { meta, timestamp, indicators } = result;
    let symbol = meta.symbol.unwrap_or_default();

    let adjusted_closes = if adjusted {
        indicators.adjclose.into_iter().next().map(|block| block.adjclose)
    } else {
        None
    };
    let closes = match adjusted_closes {
        Some(closes) => closes,
        None => indicators
            .quote
            .into_iter()
            .next()
            .map(|block| block.close)
            .ok_or_else(|| Error::EmptyPayload(format!("{symbol} quote block")))?,
    };

    if timestamp.is_empty() {
        return Err(Error::EmptyPayload(format!("{symbol} timestamps")));
    }
    if closes.len() != timestamp.len() {
        return Err(Error::MalformedPayload(format!(
            "{symbol}: {} timestamps but {} closes",
            timestamp.len(),
            closes.len()
        )));
    }

    timestamp
        .into_iter()
        .zip(closes)
        .map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts + meta.gmtoffset, 0)
                .ok_or_else(|| Error::MalformedPayload(format!("{symbol}: bad timestamp {ts}")))?
                .date_naive();
            Ok(RawPricePoint { date, close })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "AAPL", "gmtoffset": -14400 },
                "timestamp": [1717075800, 1717162200, 1717421400],
                "indicators": {
                    "quote": [{ "close": [191.29, null, 194.03] }],
                    "adjclose": [{ "adjclose": [190.5, null, 193.2] }]
                }
            }],
            "error": null
        }
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_raw_closes_in_exchange_time() {
        let points = parse_chart_response(CHART, false).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], RawPricePoint { date: date(2024, 5, 30), close: Some(191.29) });
        assert_eq!(points[1].date, date(2024, 5, 31));
        assert_eq!(points[1].close, None);
        assert_eq!(points[2], RawPricePoint { date: date(2024, 6, 3), close: Some(194.03) });
    }

    #[test]
    fn adjusted_flag_selects_adjclose() {
        let points = parse_chart_response(CHART, true).unwrap();
        assert_eq!(points[0].close, Some(190.5));
        assert_eq!(points[2].close, Some(193.2));
    }

    #[test]
    fn adjusted_falls_back_to_close_when_missing() {
        let body = r#"{"chart":{"result":[{"meta":{},"timestamp":[1717075800],
            "indicators":{"quote":[{"close":[10.0]}]}}],"error":null}}"#;
        let points = parse_chart_response(body, true).unwrap();
        assert_eq!(points[0].close, Some(10.0));
    }

    #[test]
    fn chart_error_becomes_api_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart_response(body, false) {
            Err(Error::ApiError { code, msg }) => {
                assert_eq!(code, "Not Found");
                assert!(msg.contains("delisted"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_result_is_empty_payload() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(parse_chart_response(body, false), Err(Error::EmptyPayload(_))));
    }

    #[test]
    fn mismatched_lengths_are_malformed() {
        let body = r#"{"chart":{"result":[{"timestamp":[1717075800,1717162200],
            "indicators":{"quote":[{"close":[1.0]}]}}],"error":null}}"#;
        assert!(matches!(parse_chart_response(body, false), Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn garbage_is_a_deserialization_error() {
        assert!(matches!(
            parse_chart_response("<html>", false),
            Err(Error::DeserializationFailed(_))
        ));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let settings = DataProviderSettings {
            base_url: "https://query1.example.com/".to_string(),
            api_key: None,
            user_agent: "test".to_string(),
            request_timeout_secs: 5,
            max_retries: 2,
            initial_backoff_ms: 10,
        };
        let client = ApiClient::new(&settings).unwrap();
        assert_eq!(client.base_url, "https://query1.example.com");
        assert_eq!(client.max_retries, 2);
    }

    #[test]
    fn api_key_must_be_a_valid_header_value() {
        let mut settings = DataProviderSettings {
            base_url: "https://query1.example.com".to_string(),
            api_key: Some("line\nbreak".to_string()),
            user_agent: "test".to_string(),
            request_timeout_secs: 5,
            max_retries: 2,
            initial_backoff_ms: 10,
        };
        assert!(matches!(ApiClient::new(&settings), Err(Error::ClientBuildError(_))));

        settings.api_key = Some("secret-key".to_string());
        assert!(ApiClient::new(&settings).is_ok());
    }
}
