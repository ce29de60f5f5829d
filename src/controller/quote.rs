//! Quote flow: validate the shipment, ask `/calculate-price`, store the price.

use crate::domain::attempt::Flow;
use crate::domain::form::PriceQuote;
use crate::domain::payload::{QuoteReply, server_error_message};
use crate::error::{AfriShipError, FlowError, Result};
use crate::http::{HttpClient, HttpResponse};

use super::Controller;

impl<H: HttpClient> Controller<H> {
    /// Request a price for the current shipment input.
    ///
    /// Every accepted trigger clears the previously shown price before anything
    /// else happens, so a stale price never sits next to a fresh error.
    ///
    /// # Errors
    /// - [`Busy`](AfriShipError::Busy) if a quote is already in flight (no state change)
    /// - a validation [`FlowError`] if weight or package type is unusable (nothing sent)
    /// - a transport or server [`FlowError`] if the request failed
    /// - [`Shutdown`](AfriShipError::Shutdown) if the controller was torn down
    pub async fn request_quote(&self) -> Result<PriceQuote> {
        let attempt = self.begin(Flow::Quote, &self.config.quote_path, |form| {
            form.price = None;
            form.quote_payload()
        })?;

        tracing::debug!(attempt = %attempt.id(), body = %attempt.request().body, "Requesting price");

        let Some(response) = self.dispatch(attempt.request()).await else {
            return Err(AfriShipError::Shutdown);
        };

        let outcome = interpret_quote_response(response);
        self.settle(attempt, outcome, |form, price| {
            form.price = Some(*price);
        })
    }
}

/// Map a `/calculate-price` response to a price or a flow error.
///
/// - transport failure, or a body that is not the expected JSON → `Transport`
/// - non-success status with a JSON body → `Server`, carrying its `error` string if any
pub(crate) fn interpret_quote_response(
    response: Result<HttpResponse>,
) -> std::result::Result<PriceQuote, FlowError> {
    let response = response.map_err(|e| {
        tracing::warn!(error = %e, "Price request did not complete");
        FlowError::Transport(e.to_string())
    })?;

    if !response.is_success() {
        let body: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            tracing::warn!(status = response.status, error = %e, "Malformed error reply");
            FlowError::Transport(format!(
                "malformed error reply (status {}): {e}",
                response.status
            ))
        })?;
        return Err(FlowError::Server {
            status: response.status,
            message: server_error_message(&body),
        });
    }

    let reply: QuoteReply = serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!(error = %e, body_len = response.body.len(), "Malformed price reply");
        FlowError::Transport(format!("malformed price reply: {e}"))
    })?;

    Ok(PriceQuote::new(reply.price))
}
