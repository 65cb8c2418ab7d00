use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use yosoku_core::common::{Stock, TimeFrame};
use yosoku_core::config::MarketConfig;
use yosoku_core::market::error::MarketError;
use yosoku_core::market::port::MarketDataProvider;
use yosoku_feed::yahoo::{YahooProvider, parse_chart};

// 两根 NSE 日线：第一根 UTC 仍是 1 月 30 日，IST 已是 1 月 31 日；中间一行 close 为 null
const NSE_CHART: &str = r#"{
  "chart": {
    "result": [{
      "meta": {"symbol": "RELIANCE.NS", "gmtoffset": 19800, "exchangeTimezoneName": "Asia/Kolkata"},
      "timestamp": [1706644800, 1706672700, 1706759100],
      "indicators": {
        "quote": [{
          "open":   [2700.0, 2710.0, 2720.5],
          "high":   [2750.0, 2760.0, 2770.0],
          "low":    [2690.0, 2700.0, 2705.0],
          "close":  [2740.0, null,   2765.25],
          "volume": [1000000, 1100000, 1200000]
        }],
        "adjclose": [{"adjclose": [2739.0, null, 2764.0]}]
      }
    }],
    "error": null
  }
}"#;

const NOT_FOUND: &str = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

#[test]
fn test_parse_chart_uses_exchange_local_date() {
    let candles = parse_chart(NSE_CHART).unwrap();

    // null close 的行被跳过
    assert_eq!(candles.len(), 2);

    let first = &candles[0];
    assert_eq!(first.time, Utc.with_ymd_and_hms(2024, 1, 30, 20, 0, 0).unwrap());
    assert_eq!(first.trade_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    assert_eq!(first.close, 2740.0);
    assert_eq!(first.adj_close, Some(2739.0));

    let second = &candles[1];
    assert_eq!(second.trade_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    assert_eq!(second.close, 2765.25);
}

#[test]
fn test_parse_chart_reports_provider_error() {
    match parse_chart(NOT_FOUND) {
        Err(MarketError::NotFound(msg)) => assert!(msg.contains("No data found")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_chart_without_timestamps_is_empty() {
    let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":19800},"indicators":{"quote":[{}]}}],"error":null}}"#;
    let candles = parse_chart(body).unwrap();
    assert!(candles.is_empty());
}

#[test]
fn test_parse_chart_rejects_garbage() {
    assert!(matches!(parse_chart("<html>"), Err(MarketError::Parse(_))));
}

// 收到的 (代码, 原始查询串)
type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

async fn fake_chart(
    State(seen): State<Seen>,
    Path(symbol): Path<String>,
    RawQuery(query): RawQuery,
) -> (StatusCode, &'static str) {
    seen.lock().unwrap().push((symbol.clone(), query));
    match symbol.as_str() {
        "RELIANCE.NS" => (StatusCode::OK, NSE_CHART),
        "BUSY.NS" => (StatusCode::SERVICE_UNAVAILABLE, "<html>busy</html>"),
        _ => (StatusCode::NOT_FOUND, NOT_FOUND),
    }
}

// 帮助函数：在随机端口启动一个假的 chart 接口，并记录每次请求
async fn spawn_fake_yahoo() -> anyhow::Result<(String, Seen)> {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/chart/{symbol}", get(fake_chart))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((format!("http://{}/chart", addr), seen))
}

#[tokio::test]
async fn test_fetch_candles_against_local_endpoint() -> anyhow::Result<()> {
    let (base_url, _) = spawn_fake_yahoo().await?;
    let config = MarketConfig {
        base_url,
        ..MarketConfig::default()
    };
    let provider = YahooProvider::new(&config)?;
    let end = Utc::now();
    let start = end - chrono::Duration::days(365);

    let candles = provider
        .fetch_candles(&Stock::listed("RELIANCE", ".NS"), TimeFrame::Day1, start, end)
        .await?;
    assert_eq!(candles.len(), 2);

    let err = provider
        .fetch_candles(&Stock::listed("ZZZZZZ", ".NS"), TimeFrame::Day1, start, end)
        .await
        .expect_err("404 must surface as an error");
    assert!(matches!(err, MarketError::NotFound(_)));
    assert!(err.to_string().contains("symbol may be delisted"));

    // 非 2xx 且响应体不是 chart JSON
    let err = provider
        .fetch_candles(&Stock::listed("BUSY", ".NS"), TimeFrame::Day1, start, end)
        .await
        .expect_err("503 must surface as an error");
    assert!(matches!(err, MarketError::Upstream { status: 503 }));

    Ok(())
}

#[tokio::test]
async fn test_symbol_is_sent_as_one_path_segment() -> anyhow::Result<()> {
    let (base_url, seen) = spawn_fake_yahoo().await?;
    let config = MarketConfig {
        // 末尾的 `/` 不应产生空路径段
        base_url: format!("{}/", base_url),
        ..MarketConfig::default()
    };
    let provider = YahooProvider::new(&config)?;
    let end = Utc::now();
    let start = end - chrono::Duration::days(365);

    for base in ["AAPL#", "AAPL?x=", "A/B"] {
        let err = provider
            .fetch_candles(&Stock::listed(base, ".NS"), TimeFrame::Day1, start, end)
            .await
            .expect_err("suffixed symbol is unknown upstream");
        assert!(matches!(err, MarketError::NotFound(_)), "{}: {:?}", base, err);
    }
    provider
        .fetch_candles(&Stock::listed("RELIANCE", ".NS"), TimeFrame::Day1, start, end)
        .await?;

    let seen = seen.lock().unwrap().clone();
    let symbols: Vec<&str> = seen.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL#.NS", "AAPL?x=.NS", "A/B.NS", "RELIANCE.NS"]);
    for (symbol, query) in &seen {
        let query = query.as_deref().unwrap_or_default();
        assert!(query.starts_with("period1="), "{}: {}", symbol, query);
        assert!(query.contains("interval=1d"));
    }

    Ok(())
}

#[test]
fn test_invalid_base_url_is_rejected() {
    for base_url in ["not a url", "mailto:quotes@example.com"] {
        let config = MarketConfig {
            base_url: base_url.to_string(),
            ..MarketConfig::default()
        };
        assert!(matches!(
            YahooProvider::new(&config),
            Err(MarketError::Parse(_))
        ));
    }
}
