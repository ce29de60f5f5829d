//! Presentation layer: turns controller state into the text the page shows.
//!
//! The controller only knows error *kinds*; the wording lives here in
//! [`Messages`], which defaults to the French copy of the landing page.

use serde::{Deserialize, Serialize};

use crate::controller::Snapshot;
use crate::domain::attempt::{Flow, FlowState};
use crate::error::{FlowError, ValidationError};

/// User-facing strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub invalid_weight: String,
    pub missing_package_type: String,
    pub invalid_email: String,
    /// Quote flow, server unreachable.
    pub quote_unreachable: String,
    /// Quote flow, server rejected without saying why.
    pub quote_failed: String,
    /// Lead flow, any failure.
    pub lead_failed: String,
    pub lead_confirmed: String,
    pub quote_button: String,
    pub quote_button_pending: String,
    pub lead_button: String,
    pub lead_button_pending: String,
    pub currency_suffix: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_weight: "Veuillez entrer un poids valide.".to_string(),
            missing_package_type: "Veuillez sélectionner un type de colis.".to_string(),
            invalid_email: "Email invalide.".to_string(),
            quote_unreachable: "Impossible de contacter le serveur.".to_string(),
            quote_failed: "Erreur lors du calcul.".to_string(),
            lead_failed: "Erreur. Réessaie plus tard.".to_string(),
            lead_confirmed: "Merci ! On vous contactera dès que c’est prêt.".to_string(),
            quote_button: "Calculer le prix".to_string(),
            quote_button_pending: "Calcul...".to_string(),
            lead_button: "Recevoir les détails d’envoi".to_string(),
            lead_button_pending: "Envoi...".to_string(),
            currency_suffix: " €".to_string(),
        }
    }
}

impl Messages {
    /// Text to show for `error` raised by `flow`.
    ///
    /// The quote flow shows the server's own reason when it sent one; the lead
    /// flow always shows its fixed retry message for network-side failures.
    pub fn render_error(&self, flow: Flow, error: &FlowError) -> String {
        match (flow, error) {
            (_, FlowError::Validation(err)) => self.render_validation(*err).to_string(),
            (Flow::Quote, FlowError::Transport(_)) => self.quote_unreachable.clone(),
            (Flow::Quote, FlowError::Server { message, .. }) => message
                .clone()
                .unwrap_or_else(|| self.quote_failed.clone()),
            (Flow::Lead, FlowError::Transport(_) | FlowError::Server { .. }) => {
                self.lead_failed.clone()
            }
        }
    }

    fn render_validation(&self, error: ValidationError) -> &str {
        match error {
            ValidationError::InvalidWeight => &self.invalid_weight,
            ValidationError::MissingPackageType => &self.missing_package_type,
            ValidationError::InvalidEmail => &self.invalid_email,
        }
    }
}

/// The price calculator card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculatorView {
    /// e.g. `"25.00 €"`; `None` hides the result block.
    pub price: Option<String>,
    pub error: Option<String>,
    pub button_label: String,
    pub button_enabled: bool,
}

/// The email capture card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    pub error: Option<String>,
    pub confirmation: Option<String>,
    pub button_label: String,
    pub button_enabled: bool,
}

/// Everything the page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub calculator: CalculatorView,
    pub contact: ContactView,
}

impl PageView {
    pub fn render(snapshot: &Snapshot, messages: &Messages) -> Self {
        let quote_pending = snapshot.quote.is_pending();
        let lead_pending = snapshot.lead.is_pending();

        let calculator = CalculatorView {
            price: snapshot
                .form
                .price
                .map(|price| format!("{}{}", price.formatted(), messages.currency_suffix)),
            error: error_text(&snapshot.quote, Flow::Quote, messages),
            button_label: if quote_pending {
                messages.quote_button_pending.clone()
            } else {
                messages.quote_button.clone()
            },
            button_enabled: !quote_pending,
        };

        let contact = ContactView {
            error: error_text(&snapshot.lead, Flow::Lead, messages),
            confirmation: snapshot
                .lead
                .is_succeeded()
                .then(|| messages.lead_confirmed.clone()),
            button_label: if lead_pending {
                messages.lead_button_pending.clone()
            } else {
                messages.lead_button.clone()
            },
            button_enabled: !lead_pending,
        };

        Self {
            calculator,
            contact,
        }
    }
}

fn error_text(state: &FlowState, flow: Flow, messages: &Messages) -> Option<String> {
    state
        .error()
        .map(|error| messages.render_error(flow, &error))
}
