use analysis_core::{AnalysisError, Fundamentals, MarketDataProvider, PricePoint};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http_client(request_timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Yahoo Finance client.
///
/// The chart endpoint is public. quoteSummary needs a session cookie plus a
/// crumb token; both are fetched on first use, shared across clones and
/// refreshed once when Yahoo rejects them.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    max_retries: u32,
    retry_delay: Duration,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_retries(DEFAULT_MAX_RETRIES)
    }

    /// `max_retries` extra attempts are made on HTTP 429, 5xx and transport errors.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            client: build_http_client(DEFAULT_REQUEST_TIMEOUT),
            base_url: BASE_URL.to_string(),
            cookie_url: COOKIE_URL.to_string(),
            max_retries,
            retry_delay: Duration::from_millis(750),
            crumb: Arc::new(Mutex::new(None)),
        }
    }

    /// Deadline for a single HTTP attempt. A timed-out attempt is retried.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    /// Serve every endpoint, the cookie page included, from `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.base_url = base_url.to_string();
        self.cookie_url = format!("{}/", base_url);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// GET a JSON document with linear backoff on transient failures.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AnalysisError> {
        let mut last_error = AnalysisError::ApiError(format!("No response from {}", url));

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let wait = self.retry_delay * attempt;
                tracing::debug!("Yahoo retry {}/{} for {} in {:?}", attempt, self.max_retries, url, wait);
                tokio::time::sleep(wait).await;
            }

            let response = match self.client.get(url).query(query).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = AnalysisError::ApiError(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                tracing::warn!("Yahoo returned {} for {}", status, url);
                last_error = AnalysisError::ApiError(format!("HTTP {}", status));
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(AnalysisError::Unauthorized(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                )));
            }

            if !status.is_success() {
                return Err(AnalysisError::ApiError(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json::<Value>()
                .await
                .map_err(|e| AnalysisError::InvalidData(e.to_string()));
        }

        Err(last_error)
    }

    /// Cached crumb, or a fresh one from the cookie + getcrumb handshake.
    async fn crumb(&self) -> Result<String, AnalysisError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie page answers 404 but still sets the session cookie.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            tracing::debug!("Yahoo cookie request failed: {}", e);
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Crumb request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Crumb request failed: {}", e)))?;

        // Consent pages and error envelopes come back instead of a bare token.
        let crumb = body.trim();
        let looks_like_token =
            !crumb.is_empty() && !crumb.contains(|c: char| c == '<' || c == '{' || c.is_whitespace());
        if !status.is_success() || !looks_like_token {
            return Err(AnalysisError::Unauthorized(format!(
                "No crumb from Yahoo (HTTP {})",
                status
            )));
        }

        tracing::debug!("Obtained Yahoo crumb");
        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    /// Drop the cached crumb unless another task already replaced it.
    async fn invalidate_crumb(&self, stale: &str) {
        let mut cached = self.crumb.lock().await;
        if cached.as_deref() == Some(stale) {
            *cached = None;
        }
    }

    /// Get daily closes between `start` and `end` (both inclusive).
    pub async fn get_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let json = self
            .get_json(
                &url,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        parse_chart(&json)
    }

    /// Get the fundamentals snapshot used for scoring
    pub async fn get_fundamentals(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);

        let crumb = self.crumb().await?;
        let json = match self.get_summary(&url, &crumb).await {
            Err(AnalysisError::Unauthorized(reason)) => {
                tracing::debug!("Yahoo rejected crumb for {} ({}), refreshing", symbol, reason);
                self.invalidate_crumb(&crumb).await;
                let crumb = self.crumb().await?;
                self.get_summary(&url, &crumb).await?
            }
            other => other?,
        };

        parse_quote_summary(&json)
    }

    async fn get_summary(&self, url: &str, crumb: &str) -> Result<Value, AnalysisError> {
        self.get_json(
            url,
            &[
                ("modules", SUMMARY_MODULES.to_string()),
                ("crumb", crumb.to_string()),
            ],
        )
        .await
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        self.get_price_history(symbol, start, end).await
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        self.get_fundamentals(symbol).await
    }
}

/// Parse a v8 chart response into daily closes. Bars with a null close are skipped.
pub fn parse_chart(json: &Value) -> Result<Vec<PricePoint>, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::InvalidData("No chart object".to_string()))?;

    if let Some(description) = error_description(chart) {
        return Err(AnalysisError::ApiError(description));
    }

    let result = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InvalidData("No chart data found".to_string()))?;

    // A symbol with no trades in the window comes back without timestamps.
    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let closes = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|q| q.get("close"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::InvalidData("No close prices".to_string()))?;

    let mut history = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes.iter()) {
        if let (Some(ts), Some(close)) = (ts.as_i64(), close.as_f64()) {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| AnalysisError::InvalidData(format!("Invalid timestamp {}", ts)))?;
            history.push(PricePoint::new(timestamp.date_naive(), close));
        }
    }

    Ok(history)
}

/// Parse a v10 quoteSummary response (price, summaryDetail, financialData modules).
pub fn parse_quote_summary(json: &Value) -> Result<Fundamentals, AnalysisError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| AnalysisError::InvalidData("No quoteSummary object".to_string()))?;

    if let Some(description) = error_description(summary) {
        return Err(AnalysisError::ApiError(description));
    }

    let data = summary
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InvalidData("No fundamental data found".to_string()))?;

    let price = data.get("price");
    let detail = data.get("summaryDetail");
    let financial = data.get("financialData");

    Ok(Fundamentals {
        short_name: price
            .and_then(|p| p.get("shortName"))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        trailing_pe: raw_f64(detail, "trailingPE"),
        fifty_day_average: raw_f64(detail, "fiftyDayAverage"),
        two_hundred_day_average: raw_f64(detail, "twoHundredDayAverage"),
        revenue_growth: raw_f64(financial, "revenueGrowth"),
        earnings_growth: raw_f64(financial, "earningsGrowth"),
        dividend_yield: raw_f64(detail, "dividendYield"),
        debt_to_equity: raw_f64(financial, "debtToEquity"),
        free_cashflow: raw_f64(financial, "freeCashflow"),
    })
}

/// Read a numeric field that is either a bare number or `{ "raw": n, "fmt": "..." }`.
/// Strings and empty objects are treated as missing.
fn raw_f64(module: Option<&Value>, field: &str) -> Option<f64> {
    let value = module?.get(field)?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(|v| v.as_f64()),
        _ => None,
    }
}

fn error_description(envelope: &Value) -> Option<String> {
    let error = envelope.get("error").filter(|e| !e.is_null())?;
    Some(
        error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown Yahoo error")
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let json = json!({
            "chart": {
                "result": [{
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": { "quote": [{ "close": [185.64, null, 181.91] }] }
                }],
                "error": null
            }
        });

        let history = parse_chart(&json).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], PricePoint::new(date(2024, 1, 2), 185.64));
        assert_eq!(history[1], PricePoint::new(date(2024, 1, 4), 181.91));
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let json = json!({
            "chart": {
                "result": [{ "indicators": { "quote": [{}] } }],
                "error": null
            }
        });
        assert!(parse_chart(&json).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_reports_yahoo_error() {
        let json = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });

        match parse_chart(&json) {
            Err(AnalysisError::ApiError(msg)) => assert!(msg.contains("delisted")),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_quote_summary_reads_raw_values() {
        let json = json!({
            "quoteSummary": {
                "result": [{
                    "price": { "shortName": "Apple Inc." },
                    "summaryDetail": {
                        "trailingPE": { "raw": 29.5, "fmt": "29.50" },
                        "fiftyDayAverage": { "raw": 182.1, "fmt": "182.10" },
                        "twoHundredDayAverage": 178.4,
                        "dividendYield": { "raw": 0.0051, "fmt": "0.51%" }
                    },
                    "financialData": {
                        "revenueGrowth": { "raw": 0.021, "fmt": "2.10%" },
                        "earningsGrowth": { "raw": 0.135, "fmt": "13.50%" },
                        "debtToEquity": { "raw": 1.45, "fmt": "1.45" },
                        "freeCashflow": { "raw": 84726873088.0, "fmt": "84.73B" }
                    }
                }],
                "error": null
            }
        });

        let f = parse_quote_summary(&json).unwrap();
        assert_eq!(f.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(f.trailing_pe, Some(29.5));
        assert_eq!(f.fifty_day_average, Some(182.1));
        assert_eq!(f.two_hundred_day_average, Some(178.4));
        assert_eq!(f.dividend_yield, Some(0.0051));
        assert_eq!(f.revenue_growth, Some(0.021));
        assert_eq!(f.earnings_growth, Some(0.135));
        assert_eq!(f.debt_to_equity, Some(1.45));
        assert_eq!(f.free_cashflow, Some(84726873088.0));
    }

    #[test]
    fn test_parse_quote_summary_string_pe_is_missing() {
        let json = json!({
            "quoteSummary": {
                "result": [{
                    "price": { "shortName": "  " },
                    "summaryDetail": { "trailingPE": "Infinity", "dividendYield": {} }
                }],
                "error": null
            }
        });

        let f = parse_quote_summary(&json).unwrap();
        assert_eq!(f.short_name, None);
        assert_eq!(f.trailing_pe, None);
        assert_eq!(f.dividend_yield, None);
        assert_eq!(f.free_cashflow, None);
    }

    #[test]
    fn test_parse_quote_summary_empty_result() {
        let json = json!({ "quoteSummary": { "result": [], "error": null } });
        assert!(matches!(parse_quote_summary(&json), Err(AnalysisError::InvalidData(_))));
    }

    fn mock_client(server: &mockito::ServerGuard, max_retries: u32) -> YahooFinanceClient {
        YahooFinanceClient::with_retries(max_retries)
            .with_base_url(&server.url())
            .with_retry_delay(Duration::ZERO)
    }

    fn summary_body() -> String {
        json!({
            "quoteSummary": {
                "result": [{
                    "price": { "shortName": "Apple Inc." },
                    "summaryDetail": { "trailingPE": { "raw": 29.5, "fmt": "29.50" } }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let chart = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = mock_client(&server, 2);
        let result = client
            .get_price_history("AAPL", date(2024, 3, 1), date(2024, 3, 31))
            .await;

        match result {
            Err(AnalysisError::ApiError(msg)) => assert!(msg.contains("503"), "got {}", msg),
            other => panic!("expected ApiError, got {:?}", other),
        }
        chart.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let chart = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let client = mock_client(&server, 1);
        let result = client
            .get_price_history("AAPL", date(2024, 3, 1), date(2024, 3, 31))
            .await;

        assert!(matches!(result, Err(AnalysisError::ApiError(ref msg)) if msg.contains("429")));
        chart.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_fails_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let chart = server
            .mock("GET", "/v8/finance/chart/ZZZZ")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("Not Found")
            .expect(1)
            .create_async()
            .await;

        let client = mock_client(&server, 3);
        let result = client
            .get_price_history("ZZZZ", date(2024, 3, 1), date(2024, 3, 31))
            .await;

        assert!(matches!(result, Err(AnalysisError::ApiError(ref msg)) if msg.contains("404")));
        chart.assert_async().await;
    }

    #[tokio::test]
    async fn test_chart_request_window() {
        let mut server = mockito::Server::new_async().await;
        // 2024-03-01 00:00 UTC through the start of 2024-04-01.
        let chart = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("period1".into(), "1709251200".into()),
                Matcher::UrlEncoded("period2".into(), "1711929600".into()),
                Matcher::UrlEncoded("interval".into(), "1d".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "chart": {
                        "result": [{
                            "timestamp": [1709317800],
                            "indicators": { "quote": [{ "close": [179.66] }] }
                        }],
                        "error": null
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = mock_client(&server, 0);
        let history = client
            .get_price_history("AAPL", date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();

        assert_eq!(history, vec![PricePoint::new(date(2024, 3, 1), 179.66)]);
        chart.assert_async().await;
    }

    #[tokio::test]
    async fn test_fundamentals_send_crumb() {
        let mut server = mockito::Server::new_async().await;
        let crumb = server
            .mock("GET", "/v1/test/getcrumb")
            .with_status(200)
            .with_body("Xy1.abc")
            .expect(1)
            .create_async()
            .await;
        let summary = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("crumb".into(), "Xy1.abc".into()),
                Matcher::UrlEncoded("modules".into(), SUMMARY_MODULES.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(summary_body())
            .expect(2)
            .create_async()
            .await;

        let client = mock_client(&server, 0);
        let first = client.get_fundamentals("AAPL").await.unwrap();
        let second = client.get_fundamentals("AAPL").await.unwrap();

        assert_eq!(first.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(second.trailing_pe, Some(29.5));
        crumb.assert_async().await;
        summary.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_crumb_is_refreshed_once() {
        let mut server = mockito::Server::new_async().await;
        let crumb = server
            .mock("GET", "/v1/test/getcrumb")
            .with_status(200)
            .with_body("fresh")
            .expect(1)
            .create_async()
            .await;
        let rejected = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::UrlEncoded("crumb".into(), "stale".into()))
            .with_status(401)
            .with_body(r#"{"finance":{"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::UrlEncoded("crumb".into(), "fresh".into()))
            .with_status(200)
            .with_body(summary_body())
            .expect(1)
            .create_async()
            .await;

        let client = mock_client(&server, 2);
        *client.crumb.lock().await = Some("stale".to_string());

        let fundamentals = client.get_fundamentals("AAPL").await.unwrap();
        assert_eq!(fundamentals.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(client.crumb.lock().await.as_deref(), Some("fresh"));
        crumb.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_unauthorized_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let crumb = server
            .mock("GET", "/v1/test/getcrumb")
            .with_status(200)
            .with_body("abc")
            .expect(2)
            .create_async()
            .await;
        let summary = server
            .mock("GET", "/v10/finance/quoteSummary/AAPL")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("Invalid Crumb")
            .expect(2)
            .create_async()
            .await;

        let client = mock_client(&server, 2);
        let result = client.get_fundamentals("AAPL").await;

        match result {
            Err(AnalysisError::Unauthorized(msg)) => assert!(msg.contains("Invalid Crumb")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
        crumb.assert_async().await;
        summary.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_crumb_is_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _crumb = server
            .mock("GET", "/v1/test/getcrumb")
            .with_status(200)
            .with_body("<html>consent</html>")
            .create_async()
            .await;

        let client = mock_client(&server, 0);
        let result = client.get_fundamentals("AAPL").await;
        assert!(matches!(result, Err(AnalysisError::Unauthorized(_))));
    }
}
