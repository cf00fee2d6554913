//! Integration tests for the HTTP-backed collaborators (wiremock)

use breakdown_alert::error::MarketDataError;
use breakdown_alert::services::{CandleSource, Notifier, OptionChainSource, WebhookNotifier};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chain_payload() -> serde_json::Value {
    json!({
        "records": {
            "underlyingValue": 22_118.35,
            "data": [
                { "strikePrice": 22050.0, "PE": { "lastPrice": 31.0 } },
                { "strikePrice": 22100.0, "PE": {
                    "lastPrice": 48.5, "openPrice": 47.8, "dayHigh": 49.1, "dayLow": 46.9,
                    "totalTradedVolume": 22000, "openInterest": 260000
                }},
                { "strikePrice": 22150.0, "PE": { "lastPrice": 70.0 } }
            ]
        }
    })
}

fn source(server: &MockServer) -> OptionChainSource {
    OptionChainSource::new(
        format!("{}/api/option-chain-indices", server.uri()),
        50.0,
        Duration::from_secs(5),
    )
    .expect("build source")
}

#[tokio::test]
async fn option_chain_yields_atm_put_candle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/option-chain-indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chain_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let candle = source(&server).fetch_latest_candle().await.unwrap();

    assert_eq!(candle.strike, "22100");
    assert_eq!(candle.close, 48.5);
    assert_eq!(candle.low, 46.9);
    assert_eq!(candle.volume, 22_000.0);
}

#[tokio::test]
async fn option_chain_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = source(&server).fetch_latest_candle().await.unwrap_err();
    assert!(matches!(err, MarketDataError::Status(401)));
}

#[tokio::test]
async fn option_chain_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let err = source(&server).fetch_latest_candle().await.unwrap_err();
    assert!(matches!(err, MarketDataError::Malformed(_)));
}

#[tokio::test]
async fn webhook_posts_target_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "to": "919999999999", "text": "hello" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/send", server.uri()), Duration::from_secs(5))
        .expect("build notifier");

    assert!(notifier.is_ready());
    assert!(notifier.send("919999999999", "hello").await);
}

#[tokio::test]
async fn webhook_rejection_reports_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(5)).unwrap();
    assert!(!notifier.send("919999999999", "hello").await);
}

#[tokio::test]
async fn empty_webhook_url_is_not_ready() {
    let notifier = WebhookNotifier::new("", Duration::from_secs(5)).unwrap();
    assert!(!notifier.is_ready());
}
