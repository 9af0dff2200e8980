//! Core data types for the Motive API.
//!
//! Only the commonly used fields are typed; everything else the API returns
//! is kept in `extra`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fleet vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle ID.
    pub id: u64,
    /// Fleet number shown to drivers.
    #[serde(default)]
    pub number: Option<String>,
    /// `active` or `deactivated`.
    #[serde(default)]
    pub status: Option<String>,
    /// VIN.
    #[serde(default)]
    pub vin: Option<String>,
    /// Manufacturer.
    #[serde(default)]
    pub make: Option<String>,
    /// Model.
    #[serde(default)]
    pub model: Option<String>,
    /// Model year, as Motive sends it.
    #[serde(default)]
    pub year: Option<String>,
    /// License plate number.
    #[serde(default)]
    pub license_plate_number: Option<String>,
    /// Driver currently assigned.
    #[serde(default)]
    pub current_driver: Option<User>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Last known position of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLocation {
    /// Location ID.
    #[serde(default)]
    pub id: Option<String>,
    /// When the position was recorded.
    #[serde(default)]
    pub located_at: Option<DateTime<Utc>>,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Nearest address or landmark.
    #[serde(default)]
    pub description: Option<String>,
    /// Speed in the account's unit.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Heading in degrees.
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Account user (drivers, admins, fleet users).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: u64,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// `driver`, `admin` or `fleet_user`.
    #[serde(default)]
    pub role: Option<String>,
    /// `active` or `deactivated`.
    #[serde(default)]
    pub status: Option<String>,
    /// Driver's company-assigned ID.
    #[serde(default)]
    pub driver_company_id: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Full name, skipping missing parts.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if the user has the driver role.
    pub fn is_driver(&self) -> bool {
        self.role.as_deref() == Some("driver")
    }
}

/// Webhook subscription registered for the company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyWebhook {
    /// Webhook ID.
    pub id: u64,
    /// Delivery URL.
    pub url: String,
    /// Whether deliveries are enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Subscribed event names.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Payload format.
    #[serde(default)]
    pub format: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for registering a webhook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateWebhookRequest {
    /// Delivery URL.
    pub url: String,
    /// Signing secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Event names to subscribe to.
    pub actions: Vec<String>,
    /// Whether deliveries start enabled.
    pub enabled: bool,
    /// Payload format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Request body for updating a webhook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWebhookRequest {
    /// Delivery URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Event names to subscribe to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    /// Whether deliveries are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
