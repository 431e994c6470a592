use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::sos::{ProblemCode, Severity, SosMessage};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSos {
    pub driver_id: String,
    #[serde(default)]
    pub driver_name: String,
    pub message: String,
    pub problem_code: ProblemCode,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemCodeInfo {
    pub code: ProblemCode,
    pub severity: Severity,
}

/// Appends an alert to the log. Alerts are never edited afterwards.
///
/// A missing driver name is filled in from the driver registry when the
/// driver is known.
pub fn submit_sos(state: &AppState, sos: NewSos) -> Result<SosMessage, AppError> {
    let driver_id = sos.driver_id.trim().to_string();
    if driver_id.is_empty() {
        return Err(AppError::BadRequest("driver_id cannot be empty".to_string()));
    }
    if sos.message.trim().is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_string()));
    }

    let driver_name = match sos.driver_name.trim() {
        "" => state
            .store
            .get_driver(&driver_id)
            .map(|driver| driver.name)
            .unwrap_or_default(),
        name => name.to_string(),
    };

    let severity = sos.problem_code.severity();
    let stored = state.store.append_sos(SosMessage {
        id: Uuid::now_v7(),
        driver_id,
        driver_name,
        message: sos.message.trim().to_string(),
        problem_code: sos.problem_code,
        severity,
        location: sos.location.trim().to_string(),
        created_at: Utc::now(),
    });

    state
        .metrics
        .sos_alerts_total
        .with_label_values(&[severity.as_str()])
        .inc();

    if severity == Severity::Critical {
        warn!(
            sos_id = %stored.id,
            driver_id = %stored.driver_id,
            code = stored.problem_code.as_str(),
            location = %stored.location,
            "critical sos received"
        );
    } else {
        info!(
            sos_id = %stored.id,
            driver_id = %stored.driver_id,
            code = stored.problem_code.as_str(),
            "sos received"
        );
    }

    Ok(stored)
}

pub fn list_sos(state: &AppState) -> Vec<SosMessage> {
    state.store.list_sos()
}

pub fn problem_code_catalog() -> Vec<ProblemCodeInfo> {
    ProblemCode::ALL
        .into_iter()
        .map(|code| ProblemCodeInfo {
            code,
            severity: code.severity(),
        })
        .collect()
}
