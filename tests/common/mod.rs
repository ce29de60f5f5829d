#![allow(dead_code)]

use std::time::Duration;

use afriship::{Controller, ControllerConfig, HttpResponse, MockHttpClient};

pub const QUOTE: &str = "POST /calculate-price";
pub const LEAD: &str = "POST /lead";

pub fn config() -> ControllerConfig {
    ControllerConfig {
        base_url: "https://api.example.com".to_string(),
        timeout_ms: 5000,
        ..Default::default()
    }
}

pub fn setup() -> (Controller<MockHttpClient>, MockHttpClient) {
    let mock = MockHttpClient::new();
    let controller = Controller::new(mock.clone(), config()).expect("valid config");
    (controller, mock)
}

pub fn ok_json(body: serde_json::Value) -> afriship::Result<HttpResponse> {
    Ok(HttpResponse {
        status: 200,
        body: body.to_string(),
    })
}

pub fn status(status: u16, body: &str) -> afriship::Result<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

/// Poll until `condition` holds, yielding to spawned tasks in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
