//! Quote and lead-capture controller for the AfriShip landing page.
//!
//! The page has two flows that share one form. The quote flow validates a
//! weight and package type and asks the pricing service for an estimate. The
//! lead flow validates an email and posts it together with whatever shipment
//! details and price the form holds at that moment.
//!
//! Each flow carries its own lifecycle (`Idle → Pending → Succeeded | Failed`),
//! its own error, and its own trigger state. A [`Controller`] owns all of it;
//! [`view::PageView`] renders it to text.
//!
//! ```ignore
//! let controller = Controller::connect(ControllerConfig::from_env()?)?;
//! controller.set_weight("6");
//! controller.set_package_type(Some(PackageType::Documents));
//! let price = controller.request_quote().await?;
//! controller.set_email("a@b.com");
//! controller.submit_lead().await?;
//! ```

pub mod controller;
pub mod domain;
pub mod error;
pub mod http;
pub mod view;

// Re-export commonly used types
pub use controller::{Controller, ControllerConfig, Snapshot};
pub use domain::attempt::{AttemptId, Flow, FlowState};
pub use domain::form::{FormState, PackageType, PriceQuote, ShipmentInput};
pub use error::{AfriShipError, FlowError, Result, ValidationError};
pub use http::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use view::{Messages, PageView};
