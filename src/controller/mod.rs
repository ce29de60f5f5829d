//! The page controller: shared form state plus the quote and lead flows.
//!
//! A [`Controller`] is cheap to clone; clones share the same state, so a UI can
//! keep editing fields through one handle while a flow is awaiting its response
//! through another. The internal mutex is only held for short synchronous
//! sections and never across an `.await`.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::attempt::{AttemptId, Flow, FlowState};
use crate::domain::form::{FormState, PackageType, PriceQuote, UnknownPackageType};
use crate::domain::payload::ApiRequest;
use crate::error::{AfriShipError, FlowError, Result, ValidationError};
use crate::http::{HttpClient, HttpResponse, ReqwestHttpClient};

pub mod lead;
pub mod quote;

pub const DEFAULT_BASE_URL: &str = "https://afriship-api.onrender.com";

/// Configuration for the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL of the AfriShip API, without trailing slash
    pub base_url: String,

    /// Path of the pricing endpoint
    pub quote_path: String,

    /// Path of the lead-capture endpoint
    pub lead_path: String,

    /// Timeout for each request in milliseconds
    pub timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            quote_path: "/calculate-price".to_string(),
            lead_path: "/lead".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ControllerConfig {
    /// Defaults, overridden by `AFRISHIP_API_URL` and `AFRISHIP_TIMEOUT_MS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base_url) = lookup("AFRISHIP_API_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = lookup("AFRISHIP_TIMEOUT_MS") {
            config.timeout_ms = timeout.trim().parse().map_err(|e| {
                AfriShipError::InvalidConfig(format!(
                    "AFRISHIP_TIMEOUT_MS must be a number of milliseconds, got {timeout:?}: {e}"
                ))
            })?;
        }
        Ok(config)
    }

    /// The base URL, checked to be absolute http(s), with any trailing slash removed.
    pub fn endpoint(&self) -> Result<String> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            AfriShipError::InvalidConfig(format!("base_url {:?}: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AfriShipError::InvalidConfig(format!(
                "base_url {:?} must be an http(s) URL",
                self.base_url
            )));
        }
        Ok(self.base_url.trim_end_matches('/').to_string())
    }
}

/// Point-in-time copy of everything the page renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub form: FormState,
    pub quote: FlowState,
    pub lead: FlowState,
}

#[derive(Debug, Default)]
struct Shared {
    form: FormState,
    quote: FlowState,
    lead: FlowState,
    quote_seq: u64,
    lead_seq: u64,
}

impl Shared {
    fn flow(&self, flow: Flow) -> &FlowState {
        match flow {
            Flow::Quote => &self.quote,
            Flow::Lead => &self.lead,
        }
    }

    fn flow_mut(&mut self, flow: Flow) -> &mut FlowState {
        match flow {
            Flow::Quote => &mut self.quote,
            Flow::Lead => &mut self.lead,
        }
    }

    fn next_attempt(&mut self, flow: Flow) -> AttemptId {
        let seq = match flow {
            Flow::Quote => &mut self.quote_seq,
            Flow::Lead => &mut self.lead_seq,
        };
        *seq += 1;
        AttemptId::new(flow, *seq)
    }
}

/// An attempt that is `Pending` and waiting for its response.
///
/// Dropped unsettled while the controller is live (the caller's future was
/// cancelled, e.g. by a timeout), it fails its attempt so the trigger is
/// usable again.
struct InFlight {
    shared: Arc<Mutex<Shared>>,
    shutdown: CancellationToken,
    request: ApiRequest,
    settled: bool,
}

impl InFlight {
    fn id(&self) -> AttemptId {
        self.request.attempt
    }

    fn request(&self) -> &ApiRequest {
        &self.request
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled || self.shutdown.is_cancelled() {
            return;
        }
        let id = self.id();
        tracing::warn!(attempt = %id, "Request abandoned before its response arrived");
        self.shared.lock().flow_mut(id.flow()).settle(
            id,
            Err(FlowError::Transport(
                "request abandoned before completion".to_string(),
            )),
        );
    }
}

/// Owns the form state and drives the quote and lead flows.
pub struct Controller<H: HttpClient> {
    shared: Arc<Mutex<Shared>>,
    http: Arc<H>,
    config: Arc<ControllerConfig>,
    endpoint: Arc<str>,
    shutdown: CancellationToken,
}

impl<H: HttpClient> Clone for Controller<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            http: self.http.clone(),
            config: self.config.clone(),
            endpoint: self.endpoint.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl Controller<ReqwestHttpClient> {
    /// Controller talking to the real API.
    pub fn connect(config: ControllerConfig) -> Result<Self> {
        Self::new(ReqwestHttpClient::new(), config)
    }
}

impl<H: HttpClient> Controller<H> {
    /// Create a controller with empty form state and both flows idle.
    ///
    /// # Errors
    /// Returns [`AfriShipError::InvalidConfig`] if `config.base_url` is not an
    /// absolute http(s) URL.
    pub fn new(http: H, config: ControllerConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        tracing::debug!(endpoint = %endpoint, timeout_ms = config.timeout_ms, "Controller created");
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            http: Arc::new(http),
            config: Arc::new(config),
            endpoint: endpoint.into(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Form input. Plain writes: no validation, no network.
    // ------------------------------------------------------------------------

    pub fn set_weight(&self, weight: impl Into<String>) {
        self.shared.lock().form.shipment.weight = weight.into();
    }

    pub fn set_package_type(&self, package_type: Option<PackageType>) {
        self.shared.lock().form.shipment.package_type = package_type;
    }

    /// Set the package type from a selector value. An empty value clears it.
    pub fn select_package_type(
        &self,
        value: &str,
    ) -> std::result::Result<(), UnknownPackageType> {
        let package_type = match value {
            "" => None,
            label => Some(label.parse::<PackageType>()?),
        };
        self.set_package_type(package_type);
        Ok(())
    }

    pub fn set_promo_code(&self, promo_code: impl Into<String>) {
        self.shared.lock().form.shipment.promo_code = promo_code.into();
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.shared.lock().form.email = email.into();
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn form(&self) -> FormState {
        self.shared.lock().form.clone()
    }

    pub fn price(&self) -> Option<PriceQuote> {
        self.shared.lock().form.price
    }

    pub fn quote_state(&self) -> FlowState {
        self.shared.lock().quote.clone()
    }

    pub fn lead_state(&self) -> FlowState {
        self.shared.lock().lead.clone()
    }

    /// Form and both flows, read under one lock.
    pub fn snapshot(&self) -> Snapshot {
        let shared = self.shared.lock();
        Snapshot {
            form: shared.form.clone(),
            quote: shared.quote.clone(),
            lead: shared.lead.clone(),
        }
    }

    /// Whether the quote trigger is enabled.
    pub fn can_request_quote(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.shared.lock().quote.is_pending()
    }

    /// Whether the lead trigger is enabled.
    pub fn can_submit_lead(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.shared.lock().lead.is_pending()
    }

    pub fn lead_confirmed(&self) -> bool {
        self.shared.lock().lead.is_succeeded()
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Tear the controller down.
    ///
    /// In-flight requests are abandoned and their responses never applied.
    /// Later triggers fail with [`AfriShipError::Shutdown`].
    pub fn shutdown(&self) {
        tracing::info!("Controller shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ------------------------------------------------------------------------
    // Shared flow plumbing
    // ------------------------------------------------------------------------

    /// Validate and, if valid, move `flow` to `Pending` with a new attempt.
    ///
    /// `build` runs under the lock against the live form, so the payload is a
    /// snapshot taken at trigger time. The returned guard must be passed to
    /// [`settle`](Self::settle); dropping it fails the attempt instead.
    fn begin<P: Serialize>(
        &self,
        flow: Flow,
        path: &str,
        build: impl FnOnce(&mut FormState) -> std::result::Result<P, ValidationError>,
    ) -> Result<InFlight> {
        let mut shared = self.shared.lock();

        if self.shutdown.is_cancelled() {
            return Err(AfriShipError::Shutdown);
        }
        if shared.flow(flow).is_pending() {
            tracing::debug!(flow = %flow, "Trigger ignored, request already in flight");
            return Err(AfriShipError::Busy(flow));
        }

        let payload = match build(&mut shared.form) {
            Ok(payload) => payload,
            Err(error) => {
                shared.flow_mut(flow).reject(flow, error);
                return Err(error.into());
            }
        };

        let id = shared.next_attempt(flow);
        let request = ApiRequest::post_json(id, &self.endpoint, path, &payload)?;
        shared.flow_mut(flow).begin(id);
        Ok(InFlight {
            shared: self.shared.clone(),
            shutdown: self.shutdown.clone(),
            request,
            settled: false,
        })
    }

    /// Send a request unless the controller is torn down first.
    ///
    /// Returns `None` if shutdown won the race.
    async fn dispatch(&self, request: &ApiRequest) -> Option<Result<HttpResponse>> {
        tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::debug!(attempt = %request.attempt, "Abandoning in-flight request on shutdown");
                None
            }
            result = self.http.execute(request, self.config.timeout_ms) => Some(result),
        }
    }

    /// Apply the outcome of `attempt` if it is still the flow's pending attempt.
    ///
    /// `apply` runs under the same lock as the state transition, only on success.
    fn settle<T>(
        &self,
        mut attempt: InFlight,
        outcome: std::result::Result<T, FlowError>,
        apply: impl FnOnce(&mut FormState, &T),
    ) -> Result<T> {
        attempt.settled = true;
        let id = attempt.id();
        let mut shared = self.shared.lock();

        if self.shutdown.is_cancelled() {
            tracing::debug!(attempt = %id, "Controller shut down, dropping response");
            return Err(AfriShipError::Shutdown);
        }

        let state_outcome = outcome.as_ref().map(|_| ()).map_err(|error| error.clone());
        if !shared.flow_mut(id.flow()).settle(id, state_outcome) {
            return Err(AfriShipError::Superseded(id.flow()));
        }

        match outcome {
            Ok(value) => {
                apply(&mut shared.form, &value);
                Ok(value)
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;

    fn controller() -> Controller<MockHttpClient> {
        Controller::new(MockHttpClient::new(), ControllerConfig::default()).unwrap()
    }

    #[test]
    fn default_config_points_at_production_api() {
        let config = ControllerConfig::default();
        assert_eq!(config.endpoint().unwrap(), DEFAULT_BASE_URL);
        assert_eq!(config.quote_path, "/calculate-price");
        assert_eq!(config.lead_path, "/lead");
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let config = ControllerConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint().unwrap(), "http://localhost:8080");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        for base_url in ["", "not a url", "ftp://example.com", "localhost:8080"] {
            let config = ControllerConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            };
            let err = Controller::new(MockHttpClient::new(), config).err();
            assert!(
                matches!(err, Some(AfriShipError::InvalidConfig(_))),
                "{base_url:?} should be rejected"
            );
        }
    }

    #[test]
    fn config_from_lookup_overrides_defaults() {
        let config = ControllerConfig::from_lookup(|key| match key {
            "AFRISHIP_API_URL" => Some("http://127.0.0.1:3000".to_string()),
            "AFRISHIP_TIMEOUT_MS" => Some("1500".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.lead_path, "/lead");

        let config = ControllerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn config_from_lookup_rejects_bad_timeout() {
        let result = ControllerConfig::from_lookup(|key| {
            (key == "AFRISHIP_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(AfriShipError::InvalidConfig(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn field_writes_do_not_touch_flows() {
        let controller = controller();
        controller.set_weight("abc");
        controller.set_promo_code("AFRI10");
        controller.set_email("nobody");
        controller.set_package_type(Some(PackageType::Books));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.form.shipment.weight, "abc");
        assert_eq!(snapshot.form.shipment.promo_code, "AFRI10");
        assert_eq!(snapshot.form.email, "nobody");
        assert_eq!(snapshot.form.shipment.package_type, Some(PackageType::Books));
        assert_eq!(snapshot.quote, FlowState::Idle);
        assert_eq!(snapshot.lead, FlowState::Idle);
    }

    #[test]
    fn select_package_type_parses_labels() {
        let controller = controller();
        controller.select_package_type("Vêtements").unwrap();
        assert_eq!(
            controller.form().shipment.package_type,
            Some(PackageType::Clothing)
        );

        controller.select_package_type("").unwrap();
        assert_eq!(controller.form().shipment.package_type, None);

        assert!(controller.select_package_type("Meubles").is_err());
        assert_eq!(controller.form().shipment.package_type, None);
    }

    #[test]
    fn attempt_ids_are_sequenced_per_flow() {
        let mut shared = Shared::default();
        assert_eq!(shared.next_attempt(Flow::Quote), AttemptId::new(Flow::Quote, 1));
        assert_eq!(shared.next_attempt(Flow::Quote), AttemptId::new(Flow::Quote, 2));
        assert_eq!(shared.next_attempt(Flow::Lead), AttemptId::new(Flow::Lead, 1));
    }

    #[test]
    fn dropped_attempt_fails_and_reenables_trigger() {
        let controller = controller();
        controller.set_email("a@b.com");

        let attempt = controller
            .begin(Flow::Lead, "/lead", |form| form.lead_payload())
            .unwrap();
        assert!(!controller.can_submit_lead());

        drop(attempt);
        assert!(controller.can_submit_lead());
        assert!(matches!(
            controller.lead_state().error(),
            Some(FlowError::Transport(_))
        ));
    }

    #[test]
    fn dropped_attempt_after_shutdown_is_left_alone() {
        let controller = controller();
        controller.set_email("a@b.com");

        let attempt = controller
            .begin(Flow::Lead, "/lead", |form| form.lead_payload())
            .unwrap();
        controller.shutdown();
        drop(attempt);
        assert!(controller.lead_state().is_pending());
    }

    #[test]
    fn shutdown_disables_triggers() {
        let controller = controller();
        assert!(controller.can_request_quote());
        assert!(controller.can_submit_lead());

        controller.clone().shutdown();
        assert!(controller.is_shut_down());
        assert!(!controller.can_request_quote());
        assert!(!controller.can_submit_lead());
    }
}
