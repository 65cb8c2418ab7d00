use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use yosoku_api::server::{AppState, build_router};
use yosoku_core::common::time::FakeClockProvider;
use yosoku_core::common::{Stock, TimeFrame};
use yosoku_core::config::MarketConfig;
use yosoku_core::market::entity::Candle;
use yosoku_core::market::error::MarketError;
use yosoku_core::market::port::MarketDataProvider;
use yosoku_manager::forecast::ForecastManager;

/// 按代码返回固定数据的行情源
struct StubProvider;

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn fetch_candles(
        &self,
        stock: &Stock,
        _timeframe: TimeFrame,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        match stock.symbol.as_str() {
            "RELIANCE.NS" => Ok(history()),
            "EMPTY.NS" => Ok(vec![]),
            other => Err(MarketError::NotFound(format!(
                "{}: No data found, symbol may be delisted",
                other
            ))),
        }
    }
}

fn history() -> Vec<Candle> {
    let first = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (0..30u32)
        .map(|i| {
            let day = first + Days::new(u64::from(i));
            let close = 2800.0 + f64::from(i) * 4.0;
            Candle {
                time: Utc.from_utc_datetime(&day.and_hms_opt(3, 45, 0).unwrap()),
                trade_date: day,
                open: close,
                high: close + 10.0,
                low: close - 10.0,
                close,
                adj_close: Some(close),
                volume: 1_000_000.0,
            }
        })
        .collect()
}

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server() -> String {
    // 工作区内 reqwest 启用了 rustls-no-provider，客户端需要进程级加密实现
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let clock = Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap(),
    ));
    let forecast_manager =
        ForecastManager::new(Arc::new(StubProvider), clock, &MarketConfig::default()).unwrap();
    let app = build_router(AppState { forecast_manager });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

#[tokio::test]
async fn test_predict_returns_five_records() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let base_url = spawn_test_server().await;

    let res = reqwest::get(format!("{}/predict/RELIANCE", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );

    let body: Value = res.json().await.unwrap();
    let records = body.as_array().expect("成功时应返回数组");
    assert_eq!(records.len(), 5);

    let dates: Vec<&str> = records.iter().map(|r| r["ds"].as_str().unwrap()).collect();
    assert_eq!(
        dates,
        vec![
            "2024-02-01T00:00:00",
            "2024-02-02T00:00:00",
            "2024-02-03T00:00:00",
            "2024-02-04T00:00:00",
            "2024-02-05T00:00:00"
        ]
    );
    for record in records {
        let fields = record.as_object().unwrap();
        assert_eq!(fields.len(), 2, "只应包含 ds 与 yhat: {:?}", fields);
        assert!(record["yhat"].as_f64().unwrap().is_finite());
    }
}

#[tokio::test]
async fn test_errors_are_reported_with_status_ok() {
    let base_url = spawn_test_server().await;

    // 未知代码：行情源错误原样透出
    let res = reqwest::get(format!("{}/predict/ZZZZZZ", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let fields = body.as_object().expect("失败时应返回对象");
    assert_eq!(fields.len(), 1);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("ZZZZZZ.NS: No data found")
    );

    // 空历史：拟合失败
    let res = reqwest::get(format!("{}/predict/EMPTY", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("less than 2"));

    // 解码后含 `#` 的代码仍带后缀交给行情源
    let res = reqwest::get(format!("{}/predict/AAPL%23", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("AAPL#.NS"));
}

#[tokio::test]
async fn test_cors_mirrors_origin_with_credentials() {
    let base_url = spawn_test_server().await;
    let client = reqwest::Client::new();

    // 简单请求 (即使业务失败也要带上 CORS 头)
    let res = client
        .get(format!("{}/predict/ZZZZZZ", base_url))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");

    // 预检请求
    let res = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/predict/RELIANCE", base_url),
        )
        .header("Origin", "https://dashboard.example.com")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "x-requested-with")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let headers = res.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://dashboard.example.com"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], "GET");
    assert_eq!(headers["access-control-allow-headers"], "x-requested-with");
}

#[tokio::test]
async fn test_health_and_openapi_document() {
    let base_url = spawn_test_server().await;

    let res = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let res = reqwest::get(format!("{}/api-docs/openapi.json", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = res.json().await.unwrap();
    assert!(doc["paths"]["/predict/{symbol}"]["get"].is_object());
    assert!(doc["paths"]["/health"]["get"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let base_url = spawn_test_server().await;
    let res = reqwest::get(format!("{}/forecast/RELIANCE", base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
