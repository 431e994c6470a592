use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    // The dashboards and the driver app disagree on this name; both spellings are accepted.
    #[serde(alias = "In Transit", alias = "InTransit")]
    Moving,
    Idle,
    Returning,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses that stamp `completed_at`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returning
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Moving => "Moving",
            OrderStatus::Idle => "Idle",
            OrderStatus::Returning => "Returning",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(OrderStatus::Pending),
            "Moving" | "In Transit" | "InTransit" => Ok(OrderStatus::Moving),
            "Idle" => Ok(OrderStatus::Idle),
            "Returning" => Ok(OrderStatus::Returning),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::BadRequest(format!(
                "unknown status: {other}, expected Pending/Moving/Idle/Returning/Delivered/Cancelled"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationMethod {
    Signature,
    Photo,
    Otp,
}

impl ConfirmationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationMethod::Signature => "SIGNATURE",
            ConfirmationMethod::Photo => "PHOTO",
            ConfirmationMethod::Otp => "OTP",
        }
    }
}

impl FromStr for ConfirmationMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIGNATURE" => Ok(ConfirmationMethod::Signature),
            "PHOTO" => Ok(ConfirmationMethod::Photo),
            "OTP" => Ok(ConfirmationMethod::Otp),
            other => Err(AppError::BadRequest(format!(
                "unknown confirmation method: {other}, expected SIGNATURE/PHOTO/OTP"
            ))),
        }
    }
}

/// How the recipient settles the order. `PayOnDelivery` and `PayOnCredit` both
/// collect at the door; they are kept apart because different screens issue them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentKind {
    Prepaid,
    #[serde(alias = "Pay on Delivery")]
    PayOnDelivery,
    #[serde(alias = "Pay on Credit")]
    PayOnCredit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub kind: PaymentKind,
    #[serde(default)]
    pub amount_to_collect: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Confirmation {
    pub method: ConfirmationMethod,
    pub payload: String,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub pickup: Location,
    pub destination: Location,
    pub recipient: Recipient,
    pub payment: Payment,
    #[serde(default)]
    pub assigned_driver: Option<String>,
    #[serde(default)]
    pub confirmation: Option<Confirmation>,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_reason: Option<String>,
}

impl Order {
    /// Overwrites the status and keeps `completed_at` / `return_reason` in step
    /// with it. Does not check whether the move makes sense.
    ///
    /// Entering `Returning` drops any earlier confirmation: a new return is only
    /// settled by a photo taken for it.
    pub fn apply_status(
        &mut self,
        status: OrderStatus,
        return_reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        if status == OrderStatus::Returning && self.status != OrderStatus::Returning {
            self.confirmation = None;
        }
        self.status = status;
        self.completed_at = status.is_terminal().then_some(now);
        self.return_reason = if status == OrderStatus::Returning {
            return_reason
        } else {
            None
        };
    }

    /// A returning order is settled once the returned goods are photographed.
    pub fn is_settled_return(&self) -> bool {
        self.status == OrderStatus::Returning
            && self
                .confirmation
                .as_ref()
                .is_some_and(|c| c.method == ConfirmationMethod::Photo)
    }

    /// Whether this order occupies its driver's single active slot.
    pub fn is_active(&self) -> bool {
        match self.status {
            OrderStatus::Moving => true,
            OrderStatus::Returning => !self.is_settled_return(),
            _ => false,
        }
    }

    pub fn route_distance_km(&self) -> f64 {
        haversine_km(&self.pickup.point(), &self.destination.point())
    }
}
