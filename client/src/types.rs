//! Domain types shared by the stall catalog, order ledger and cart.
//!
//! Field names follow the backend's JSON so that values decode directly from
//! API responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier from its numeric value
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the numeric value
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a vendor stall
    StallId
);

id_newtype!(
    /// Identifier of a purchasable menu item
    MenuItemId
);

id_newtype!(
    /// Identifier of a placed order
    OrderId
);

/// A vendor stall as listed in the catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stall {
    /// Stall identifier
    pub id: StallId,
    /// Display name
    pub name: String,
    /// Free-text location (hawker centre, unit number)
    pub location: String,
    /// Cuisine tag, e.g. "Chinese" or "Malay"
    pub cuisine_type: String,
    /// Average review rating
    pub rating: f64,
    /// Whether the stall is currently taking orders
    pub is_open: bool,
    /// Optional image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Distance from the queried coordinate, only set by proximity queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A placed order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Stall the order was placed with
    pub stall_id: StallId,
    /// Stall name at the time the order was placed
    pub stall_name: String,
    /// Lifecycle status as reported by the server
    pub status: String,
    /// Payment status as reported by the server
    pub payment_status: String,
    /// Order total
    pub total_amount: Decimal,
    /// Position in the stall's queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_number: Option<u32>,
    /// Human-readable order number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// Start of the pickup window
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub pickup_window_start: Option<DateTime<Utc>>,
    /// End of the pickup window
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub pickup_window_end: Option<DateTime<Utc>>,
    /// When the order was created
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an order
///
/// The shape is owned by the server; the client passes it through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRequest(serde_json::Value);

impl OrderRequest {
    /// Wraps a JSON payload
    #[must_use]
    pub const fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    /// Returns the JSON payload
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for OrderRequest {
    fn from(payload: serde_json::Value) -> Self {
        Self(payload)
    }
}

/// Timestamps as written by the backend.
///
/// The server emits naive UTC timestamps (`2025-01-01T12:00:00.123456`);
/// RFC 3339 strings with an offset are accepted too. Values are written
/// back as RFC 3339.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        #[allow(clippy::ref_option)] // signature required by serde's `with`
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    super::parse(&raw)
                        .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
                })
                .transpose()
        }
    }
}
