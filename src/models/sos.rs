use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Severity groups of the TCAS problem-code taxonomy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Critical,
    Blockage,
    ExternalDelay,
    CustomerIssue,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Blockage => "blockage",
            Severity::ExternalDelay => "external-delay",
            Severity::CustomerIssue => "customer-issue",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemCode {
    Accident,
    VehicleBreakdown,
    MedicalEmergency,
    TheftOrRobbery,
    RoadClosed,
    HeavyTraffic,
    Flooding,
    WeatherDelay,
    CheckpointDelay,
    LoadingDelay,
    CustomerUnreachable,
    AddressNotFound,
    DeliveryRefused,
    PaymentDispute,
}

impl ProblemCode {
    pub const ALL: [ProblemCode; 14] = [
        ProblemCode::Accident,
        ProblemCode::VehicleBreakdown,
        ProblemCode::MedicalEmergency,
        ProblemCode::TheftOrRobbery,
        ProblemCode::RoadClosed,
        ProblemCode::HeavyTraffic,
        ProblemCode::Flooding,
        ProblemCode::WeatherDelay,
        ProblemCode::CheckpointDelay,
        ProblemCode::LoadingDelay,
        ProblemCode::CustomerUnreachable,
        ProblemCode::AddressNotFound,
        ProblemCode::DeliveryRefused,
        ProblemCode::PaymentDispute,
    ];

    pub fn severity(self) -> Severity {
        match self {
            ProblemCode::Accident
            | ProblemCode::VehicleBreakdown
            | ProblemCode::MedicalEmergency
            | ProblemCode::TheftOrRobbery => Severity::Critical,
            ProblemCode::RoadClosed | ProblemCode::HeavyTraffic | ProblemCode::Flooding => {
                Severity::Blockage
            }
            ProblemCode::WeatherDelay | ProblemCode::CheckpointDelay | ProblemCode::LoadingDelay => {
                Severity::ExternalDelay
            }
            ProblemCode::CustomerUnreachable
            | ProblemCode::AddressNotFound
            | ProblemCode::DeliveryRefused
            | ProblemCode::PaymentDispute => Severity::CustomerIssue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProblemCode::Accident => "ACCIDENT",
            ProblemCode::VehicleBreakdown => "VEHICLE_BREAKDOWN",
            ProblemCode::MedicalEmergency => "MEDICAL_EMERGENCY",
            ProblemCode::TheftOrRobbery => "THEFT_OR_ROBBERY",
            ProblemCode::RoadClosed => "ROAD_CLOSED",
            ProblemCode::HeavyTraffic => "HEAVY_TRAFFIC",
            ProblemCode::Flooding => "FLOODING",
            ProblemCode::WeatherDelay => "WEATHER_DELAY",
            ProblemCode::CheckpointDelay => "CHECKPOINT_DELAY",
            ProblemCode::LoadingDelay => "LOADING_DELAY",
            ProblemCode::CustomerUnreachable => "CUSTOMER_UNREACHABLE",
            ProblemCode::AddressNotFound => "ADDRESS_NOT_FOUND",
            ProblemCode::DeliveryRefused => "DELIVERY_REFUSED",
            ProblemCode::PaymentDispute => "PAYMENT_DISPUTE",
        }
    }
}

impl FromStr for ProblemCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProblemCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::BadRequest(format!("unknown problem code: {wanted}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosMessage {
    pub id: Uuid,
    pub driver_id: String,
    pub driver_name: String,
    pub message: String,
    pub problem_code: ProblemCode,
    pub severity: Severity,
    pub location: String,
    pub created_at: DateTime<Utc>,
}
