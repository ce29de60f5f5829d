//! Shared form state: what the user typed, and the last price obtained.
//!
//! Writes are plain field assignments and never validate. Validation happens
//! only when a flow builds its payload, see [`FormState::quote_payload`] and
//! [`FormState::lead_payload`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::payload::{LeadPayload, QuotePayload};
use crate::error::ValidationError;

/// Package categories offered by the calculator.
///
/// Serialized as the exact French labels the pricing service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageType {
    #[serde(rename = "Documents")]
    Documents,
    #[serde(rename = "Vêtements")]
    Clothing,
    #[serde(rename = "Électronique")]
    Electronics,
    #[serde(rename = "Produits alimentaires")]
    Food,
    #[serde(rename = "Médicaments")]
    Medicine,
    #[serde(rename = "Cosmétiques")]
    Cosmetics,
    #[serde(rename = "Livres")]
    Books,
    #[serde(rename = "Bijoux")]
    Jewellery,
    #[serde(rename = "Artisanat")]
    Crafts,
    #[serde(rename = "Autre (à préciser)")]
    Other,
}

impl PackageType {
    /// All categories, in the order the selector lists them.
    pub const ALL: [PackageType; 10] = [
        PackageType::Documents,
        PackageType::Clothing,
        PackageType::Electronics,
        PackageType::Food,
        PackageType::Medicine,
        PackageType::Cosmetics,
        PackageType::Books,
        PackageType::Jewellery,
        PackageType::Crafts,
        PackageType::Other,
    ];

    /// Wire and display label.
    pub fn label(&self) -> &'static str {
        match self {
            PackageType::Documents => "Documents",
            PackageType::Clothing => "Vêtements",
            PackageType::Electronics => "Électronique",
            PackageType::Food => "Produits alimentaires",
            PackageType::Medicine => "Médicaments",
            PackageType::Cosmetics => "Cosmétiques",
            PackageType::Books => "Livres",
            PackageType::Jewellery => "Bijoux",
            PackageType::Crafts => "Artisanat",
            PackageType::Other => "Autre (à préciser)",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A selector value that is not one of the known labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown package type: {0:?}")]
pub struct UnknownPackageType(pub String);

impl FromStr for PackageType {
    type Err = UnknownPackageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageType::ALL
            .into_iter()
            .find(|package| package.label() == s)
            .ok_or_else(|| UnknownPackageType(s.to_string()))
    }
}

/// A computed price estimate, in euros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    amount: f64,
}

impl PriceQuote {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Amount with exactly two decimals, e.g. `42.50`.
    pub fn formatted(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

/// Shipment parameters as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentInput {
    /// Raw weight text, in kilograms.
    pub weight: String,
    /// `None` while the selector shows its placeholder.
    pub package_type: Option<PackageType>,
    /// Optional promo code, sent as-is (possibly empty).
    pub promo_code: String,
}

impl ShipmentInput {
    /// The weight as a finite number, if the text parses as one.
    ///
    /// Surrounding whitespace is ignored. Sign is not checked here.
    pub fn parsed_weight(&self) -> Option<f64> {
        let text = self.weight.trim();
        if text.is_empty() {
            return None;
        }
        text.parse::<f64>().ok().filter(|weight| weight.is_finite())
    }

    /// The weight the pricing service may be asked about: numeric and `> 0`.
    pub fn validated_weight(&self) -> Result<f64, ValidationError> {
        self.parsed_weight()
            .filter(|weight| *weight > 0.0)
            .ok_or(ValidationError::InvalidWeight)
    }
}

/// Everything the page holds between user actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub shipment: ShipmentInput,
    pub email: String,
    /// Last successful quote; cleared whenever a new quote is triggered.
    pub price: Option<PriceQuote>,
}

impl FormState {
    /// Validate the shipment and build the price request body.
    ///
    /// Checks run in order (weight, then package type) and stop at the first failure.
    pub fn quote_payload(&self) -> Result<QuotePayload, ValidationError> {
        let weight = self.shipment.validated_weight()?;
        let package_type = self
            .shipment
            .package_type
            .ok_or(ValidationError::MissingPackageType)?;

        Ok(QuotePayload {
            weight,
            package_type,
            promo_code: self.shipment.promo_code.clone(),
        })
    }

    /// Validate the email and snapshot the current shipment and price.
    ///
    /// Only the email is validated. Weight is sent as whatever number it parses
    /// to (or null), so a lead can be captured before any quote.
    pub fn lead_payload(&self) -> Result<LeadPayload, ValidationError> {
        if !is_plausible_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(LeadPayload {
            email: self.email.clone(),
            weight: self.shipment.parsed_weight(),
            package_type: self.shipment.package_type,
            price: self.price.map(|price| price.amount()),
        })
    }
}

/// Minimal syntactic check: anything containing '@' passes.
pub fn is_plausible_email(email: &str) -> bool {
    email.contains('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment(weight: &str, package_type: Option<PackageType>) -> FormState {
        FormState {
            shipment: ShipmentInput {
                weight: weight.to_string(),
                package_type,
                promo_code: String::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn package_labels_round_trip_through_from_str() {
        for package in PackageType::ALL {
            assert_eq!(package.label().parse::<PackageType>(), Ok(package));
        }
        assert_eq!(
            "Meubles".parse::<PackageType>(),
            Err(UnknownPackageType("Meubles".to_string()))
        );
        assert!("".parse::<PackageType>().is_err());
    }

    #[test]
    fn package_type_serializes_to_label() {
        let json = serde_json::to_string(&PackageType::Electronics).unwrap();
        assert_eq!(json, "\"Électronique\"");
        let json = serde_json::to_string(&PackageType::Other).unwrap();
        assert_eq!(json, "\"Autre (à préciser)\"");
    }

    #[test]
    fn price_formats_to_two_decimals() {
        assert_eq!(PriceQuote::new(42.5).formatted(), "42.50");
        assert_eq!(PriceQuote::new(25.0).formatted(), "25.00");
        assert_eq!(PriceQuote::new(7.127).formatted(), "7.13");
    }

    #[test]
    fn rejects_unusable_weights() {
        for weight in ["", "   ", "abc", "0", "0.0", "-1", "-0.5", "inf", "NaN", "6kg"] {
            let form = shipment(weight, Some(PackageType::Documents));
            assert_eq!(
                form.quote_payload(),
                Err(ValidationError::InvalidWeight),
                "weight {weight:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_positive_weights() {
        for (text, expected) in [("6", 6.0), (" 2.5 ", 2.5), ("0.1", 0.1), ("1e1", 10.0)] {
            let form = shipment(text, Some(PackageType::Books));
            let payload = form.quote_payload().unwrap();
            assert_eq!(payload.weight, expected);
        }
    }

    #[test]
    fn weight_is_checked_before_package_type() {
        let form = shipment("-3", None);
        assert_eq!(form.quote_payload(), Err(ValidationError::InvalidWeight));

        let form = shipment("3", None);
        assert_eq!(
            form.quote_payload(),
            Err(ValidationError::MissingPackageType)
        );
    }

    #[test]
    fn quote_payload_carries_promo_code() {
        let mut form = shipment("6", Some(PackageType::Documents));
        form.shipment.promo_code = "AFRI10".to_string();
        let payload = form.quote_payload().unwrap();
        assert_eq!(payload.promo_code, "AFRI10");
        assert_eq!(payload.package_type, PackageType::Documents);
    }

    #[test]
    fn email_check_only_needs_an_at_sign() {
        for email in ["a@b.com", "@", "x@", "@y", "not an email @ all"] {
            assert!(is_plausible_email(email), "{email:?} should pass");
        }
        for email in ["", "a.b.com", "user at example.com"] {
            assert!(!is_plausible_email(email), "{email:?} should fail");
        }
    }

    #[test]
    fn lead_payload_snapshots_shipment_and_price() {
        let mut form = shipment("6", Some(PackageType::Documents));
        form.email = "a@b.com".to_string();
        form.price = Some(PriceQuote::new(25.0));

        let payload = form.lead_payload().unwrap();
        assert_eq!(payload.email, "a@b.com");
        assert_eq!(payload.weight, Some(6.0));
        assert_eq!(payload.package_type, Some(PackageType::Documents));
        assert_eq!(payload.price, Some(25.0));
    }

    #[test]
    fn lead_payload_nulls_missing_fields() {
        let mut form = shipment("", None);
        form.email = "a@b.com".to_string();

        let payload = form.lead_payload().unwrap();
        assert_eq!(payload.weight, None);
        assert_eq!(payload.package_type, None);
        assert_eq!(payload.price, None);
    }

    #[test]
    fn lead_payload_keeps_non_positive_weight_but_drops_garbage() {
        let mut form = shipment("-1", None);
        form.email = "a@b.com".to_string();
        assert_eq!(form.lead_payload().unwrap().weight, Some(-1.0));

        form.shipment.weight = "heavy".to_string();
        assert_eq!(form.lead_payload().unwrap().weight, None);
    }

    #[test]
    fn lead_payload_rejects_email_without_at() {
        let form = FormState {
            email: "nobody".to_string(),
            ..Default::default()
        };
        assert_eq!(form.lead_payload(), Err(ValidationError::InvalidEmail));
    }
}
