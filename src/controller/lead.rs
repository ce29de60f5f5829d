//! Lead flow: validate the email and post it to `/lead` with the current
//! shipment and price.

use crate::domain::attempt::Flow;
use crate::error::{AfriShipError, FlowError, Result};
use crate::http::{HttpClient, HttpResponse};

use super::Controller;

impl<H: HttpClient> Controller<H> {
    /// Submit the current email as a lead.
    ///
    /// The payload snapshots weight, package type, and price at call time; edits
    /// made while the request is in flight do not change what is sent. A quote
    /// is not required: missing values go out as `null`.
    ///
    /// # Errors
    /// - [`Busy`](AfriShipError::Busy) if a submission is already in flight
    /// - a validation [`FlowError`] if the email has no '@' (nothing sent)
    /// - a transport or server [`FlowError`] if the request failed; server
    ///   detail is never carried for this flow
    /// - [`Shutdown`](AfriShipError::Shutdown) if the controller was torn down
    pub async fn submit_lead(&self) -> Result<()> {
        let attempt = self.begin(Flow::Lead, &self.config.lead_path, |form| {
            form.lead_payload()
        })?;

        let Some(response) = self.dispatch(attempt.request()).await else {
            return Err(AfriShipError::Shutdown);
        };

        let outcome = interpret_lead_response(response);
        self.settle(attempt, outcome, |_, _| {})
    }
}

/// Map a `/lead` response to success or a flow error. The body is never read.
pub(crate) fn interpret_lead_response(
    response: Result<HttpResponse>,
) -> std::result::Result<(), FlowError> {
    match response {
        Ok(response) if response.is_success() => Ok(()),
        Ok(response) => Err(FlowError::Server {
            status: response.status,
            message: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Lead submission did not complete");
            Err(FlowError::Transport(e.to_string()))
        }
    }
}
