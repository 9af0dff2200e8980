//! Webhook payload parsing.

use crate::errors::{MotiveError, MotiveResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

macro_rules! webhook_events {
    ($($variant:ident => $name:literal,)+) => {
        /// Webhook event types Motive delivers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum WebhookEvent {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl WebhookEvent {
            /// Every known event.
            pub const ALL: &'static [WebhookEvent] = &[$(WebhookEvent::$variant,)+];

            /// Wire name of the event.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(WebhookEvent::$variant => $name,)+
                }
            }
        }
    };
}

webhook_events! {
    VehicleCreated => "vehicle.created",
    VehicleUpdated => "vehicle.updated",
    VehicleDeactivated => "vehicle.deactivated",
    VehicleLocationUpdated => "vehicle_location.updated",
    UserCreated => "user.created",
    UserUpdated => "user.updated",
    UserDeactivated => "user.deactivated",
    DriverAssigned => "driver.assigned",
    DriverUnassigned => "driver.unassigned",
    HosLogCreated => "hos_log.created",
    HosLogUpdated => "hos_log.updated",
    HosViolationCreated => "hos_violation.created",
    DispatchCreated => "dispatch.created",
    DispatchUpdated => "dispatch.updated",
    DispatchCompleted => "dispatch.completed",
    DocumentCreated => "document.created",
    InspectionReportCreated => "inspection_report.created",
    FaultCodeOpened => "fault_code.opened",
    FaultCodeClosed => "fault_code.closed",
    GeofenceEntered => "geofence.entered",
    GeofenceExited => "geofence.exited",
    MessageCreated => "message.created",
    FuelPurchaseCreated => "fuel_purchase.created",
    DriverPerformanceEventCreated => "driver_performance_event.created",
}

impl FromStr for WebhookEvent {
    type Err = MotiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| MotiveError::invalid_payload(format!("Unknown webhook event: {}", s)))
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    event: WebhookEvent,
    timestamp: DateTime<Utc>,
    data: Map<String, Value>,
    raw: Map<String, Value>,
}

impl WebhookPayload {
    /// Parses a decoded JSON body.
    ///
    /// `event` must be a known event and `timestamp` an RFC 3339 string or
    /// Unix seconds. A missing or non-object `data` becomes an empty map.
    pub fn from_value(value: Value) -> MotiveResult<Self> {
        let raw = match value {
            Value::Object(map) => map,
            _ => return Err(MotiveError::invalid_payload("Webhook payload must be a JSON object")),
        };

        let event = match raw.get("event") {
            Some(Value::String(name)) => name.parse::<WebhookEvent>()?,
            Some(_) => return Err(MotiveError::invalid_payload("Webhook `event` must be a string")),
            None => return Err(MotiveError::invalid_payload("Webhook payload has no `event`")),
        };

        let timestamp = match raw.get("timestamp") {
            Some(value) => parse_timestamp(value)?,
            None => {
                return Err(MotiveError::invalid_payload(
                    "Webhook payload has no `timestamp`",
                ))
            }
        };

        let data = match raw.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        };

        Ok(Self {
            event,
            timestamp,
            data,
            raw,
        })
    }

    /// Parses a raw request body.
    pub fn from_slice(body: &[u8]) -> MotiveResult<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            MotiveError::invalid_payload(format!("Webhook body is not valid JSON: {}", e))
                .with_source(e)
        })?;
        Self::from_value(value)
    }

    /// Event type.
    pub fn event(&self) -> WebhookEvent {
        self.event
    }

    /// When the event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Event data.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// A single field of the event data.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Decodes the event data into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> MotiveResult<T> {
        T::deserialize(Value::Object(self.data.clone())).map_err(|e| {
            MotiveError::deserialization(format!("Failed to deserialize webhook data: {}", e))
                .with_source(e)
        })
    }

    /// The complete payload as received.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

fn parse_timestamp(value: &Value) -> MotiveResult<DateTime<Utc>> {
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    };
    parsed.ok_or_else(|| {
        MotiveError::invalid_payload(format!("Invalid webhook timestamp: {}", value))
    })
}
