//! Wire formats for `/calculate-price` and `/lead`.
//!
//! Field names on the wire are French (`poids`, `typeColis`, ...) and must not
//! change; the Rust side uses English names with serde renames.

use serde::{Deserialize, Serialize};

use crate::domain::attempt::AttemptId;
use crate::domain::form::PackageType;
use crate::error::Result;

/// Body of `POST /calculate-price`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotePayload {
    /// Parsed weight in kg, always `> 0`.
    #[serde(rename = "poids")]
    pub weight: f64,
    #[serde(rename = "typeColis")]
    pub package_type: PackageType,
    #[serde(rename = "codePromo")]
    pub promo_code: String,
}

/// Success body of `POST /calculate-price`. Only `price` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteReply {
    pub price: f64,
}

/// Body of `POST /lead`.
///
/// All four keys are always present; unset values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPayload {
    pub email: String,
    #[serde(rename = "poids")]
    pub weight: Option<f64>,
    #[serde(rename = "typeColis")]
    pub package_type: Option<PackageType>,
    #[serde(rename = "prix")]
    pub price: Option<f64>,
}

/// Extract a usable `error` string from a parsed failure body.
///
/// Returns `None` when there is no `error` key or its value is not a
/// non-empty string.
pub fn server_error_message(body: &serde_json::Value) -> Option<String> {
    body.get("error")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// A fully built outgoing request, ready for an [`HttpClient`](crate::http::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Attempt this request belongs to, for log correlation.
    pub attempt: AttemptId,
    /// Base URL of the API (e.g., <https://afriship-api.onrender.com>)
    pub endpoint: String,
    pub method: String,
    /// Path portion of the URL (e.g., "/calculate-price")
    pub path: String,
    /// JSON body
    pub body: String,
}

impl ApiRequest {
    /// Build a JSON `POST` for the given attempt.
    pub fn post_json<T: Serialize>(
        attempt: AttemptId,
        endpoint: &str,
        path: &str,
        payload: &T,
    ) -> Result<Self> {
        Ok(Self {
            attempt,
            endpoint: endpoint.to_string(),
            method: "POST".to_string(),
            path: path.to_string(),
            body: serde_json::to_string(payload)?,
        })
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.endpoint, self.path)
    }
}
