use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::role::Role;

pub const DEMO_START: &str = "DEMO_START";
pub const ORDER_STARTED: &str = "ORDER_STARTED";
pub const CART_ITEM_ADDED: &str = "CART_ITEM_ADDED";
pub const ORDER_CREATED: &str = "ORDER_CREATED";
pub const ORDER_STATUS_CHANGED: &str = "ORDER_STATUS_CHANGED";
pub const PAYMENT_COMPLETED: &str = "PAYMENT_COMPLETED";
pub const ROLE_SWITCHED: &str = "ROLE_SWITCHED";

/// Events published by demo screens and simulated backend responses.
///
/// The set of event types is open: anything the UI emits that is not one of
/// the well-known variants arrives as [`DemoEvent::Custom`] and can still be
/// subscribed to and matched by its type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub enum DemoEvent {
    DemoStart,
    OrderStarted,
    CartItemAdded {
        item_id: String,
    },
    OrderCreated {
        order_id: String,
        status: String,
    },
    OrderStatusChanged {
        order_id: String,
        status: String,
    },
    PaymentCompleted {
        order_id: String,
    },
    RoleSwitched {
        role: Role,
    },
    Custom {
        event_type: String,
        data: Map<String, Value>,
    },
}

/// Wire form of an event: `{"type": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    #[error("Event {event_type} is missing string field '{field}'")]
    MissingField { event_type: String, field: String },
    #[error("Event {event_type} carries an unknown role '{value}'")]
    InvalidRole { event_type: String, value: String },
    #[error("Event type must not be empty")]
    EmptyType,
}

impl DemoEvent {
    pub fn cart_item_added(item_id: impl Into<String>) -> Self {
        DemoEvent::CartItemAdded {
            item_id: item_id.into(),
        }
    }

    pub fn order_created(order_id: impl Into<String>, status: impl Into<String>) -> Self {
        DemoEvent::OrderCreated {
            order_id: order_id.into(),
            status: status.into(),
        }
    }

    pub fn order_status_changed(order_id: impl Into<String>, status: impl Into<String>) -> Self {
        DemoEvent::OrderStatusChanged {
            order_id: order_id.into(),
            status: status.into(),
        }
    }

    pub fn payment_completed(order_id: impl Into<String>) -> Self {
        DemoEvent::PaymentCompleted {
            order_id: order_id.into(),
        }
    }

    pub fn custom(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        DemoEvent::Custom {
            event_type: event_type.into(),
            data,
        }
    }

    /// The type tag used for subscription routing and completion matching
    pub fn event_type(&self) -> &str {
        match self {
            DemoEvent::DemoStart => DEMO_START,
            DemoEvent::OrderStarted => ORDER_STARTED,
            DemoEvent::CartItemAdded { .. } => CART_ITEM_ADDED,
            DemoEvent::OrderCreated { .. } => ORDER_CREATED,
            DemoEvent::OrderStatusChanged { .. } => ORDER_STATUS_CHANGED,
            DemoEvent::PaymentCompleted { .. } => PAYMENT_COMPLETED,
            DemoEvent::RoleSwitched { .. } => ROLE_SWITCHED,
            DemoEvent::Custom { event_type, .. } => event_type,
        }
    }

    /// Payload as a JSON object with camelCase keys
    pub fn payload(&self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            DemoEvent::DemoStart | DemoEvent::OrderStarted => {}
            DemoEvent::CartItemAdded { item_id } => {
                data.insert("itemId".into(), Value::String(item_id.clone()));
            }
            DemoEvent::OrderCreated { order_id, status }
            | DemoEvent::OrderStatusChanged { order_id, status } => {
                data.insert("orderId".into(), Value::String(order_id.clone()));
                data.insert("status".into(), Value::String(status.clone()));
            }
            DemoEvent::PaymentCompleted { order_id } => {
                data.insert("orderId".into(), Value::String(order_id.clone()));
            }
            DemoEvent::RoleSwitched { role } => {
                data.insert("role".into(), Value::String(role.as_str().to_string()));
            }
            DemoEvent::Custom { data: custom, .. } => {
                data = custom.clone();
            }
        }
        data
    }

    /// Builds an event of the given type from partial payload fields, filling
    /// the required fields of well-known types with demo placeholders.
    ///
    /// Used to replay a flow's completion rules without a live UI.
    pub fn synthesize(event_type: &str, fields: Map<String, Value>) -> Self {
        let mut data = fields;
        let placeholders: &[(&str, &str)] = match event_type {
            CART_ITEM_ADDED => &[("itemId", "demo-item-1")],
            ORDER_CREATED => &[("orderId", "demo-order-1"), ("status", "OPEN")],
            ORDER_STATUS_CHANGED => &[("orderId", "demo-order-1"), ("status", "OPEN")],
            PAYMENT_COMPLETED => &[("orderId", "demo-order-1")],
            ROLE_SWITCHED => &[("role", "staff")],
            _ => &[],
        };
        for (key, value) in placeholders {
            data.entry(key.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        }

        let raw = RawEvent {
            event_type: event_type.to_string(),
            data,
        };
        match DemoEvent::try_from(raw.clone()) {
            Ok(event) => event,
            Err(_) => DemoEvent::Custom {
                event_type: raw.event_type,
                data: raw.data,
            },
        }
    }
}

impl fmt::Display for DemoEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

fn string_field(raw: &RawEvent, field: &str) -> Result<String, EventDecodeError> {
    raw.data
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EventDecodeError::MissingField {
            event_type: raw.event_type.clone(),
            field: field.to_string(),
        })
}

impl TryFrom<RawEvent> for DemoEvent {
    type Error = EventDecodeError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let event = match raw.event_type.as_str() {
            "" => return Err(EventDecodeError::EmptyType),
            DEMO_START => DemoEvent::DemoStart,
            ORDER_STARTED => DemoEvent::OrderStarted,
            CART_ITEM_ADDED => DemoEvent::CartItemAdded {
                item_id: string_field(&raw, "itemId")?,
            },
            ORDER_CREATED => DemoEvent::OrderCreated {
                order_id: string_field(&raw, "orderId")?,
                status: string_field(&raw, "status")?,
            },
            ORDER_STATUS_CHANGED => DemoEvent::OrderStatusChanged {
                order_id: string_field(&raw, "orderId")?,
                status: string_field(&raw, "status")?,
            },
            PAYMENT_COMPLETED => DemoEvent::PaymentCompleted {
                order_id: string_field(&raw, "orderId")?,
            },
            ROLE_SWITCHED => {
                let value = string_field(&raw, "role")?;
                let role: Role = value.parse().map_err(|_| EventDecodeError::InvalidRole {
                    event_type: raw.event_type.clone(),
                    value,
                })?;
                DemoEvent::RoleSwitched { role }
            }
            _ => DemoEvent::Custom {
                event_type: raw.event_type,
                data: raw.data,
            },
        };
        Ok(event)
    }
}

impl From<DemoEvent> for RawEvent {
    fn from(event: DemoEvent) -> Self {
        RawEvent {
            event_type: event.event_type().to_string(),
            data: event.payload(),
        }
    }
}
