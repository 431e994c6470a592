use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::order::{Confirmation, ConfirmationMethod, Order, OrderStatus};
use crate::state::AppState;
use crate::store::FleetStore;

/// Applies a status change and keeps the driver's slot in step with it.
///
/// Runs inside `update_order`, so the slot is claimed or released while the
/// order's write lock is held. The claim is the last fallible step: when it
/// fails the draft is discarded and nothing was reserved.
fn apply_transition(
    store: &dyn FleetStore,
    order: &mut Order,
    target: OrderStatus,
    return_reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    order.apply_status(target, return_reason, now);
    sync_driver_slot(store, order)
}

fn sync_driver_slot(store: &dyn FleetStore, order: &Order) -> Result<(), AppError> {
    if let Some(driver_id) = order.assigned_driver.as_deref() {
        if order.is_active() {
            store.claim_active(driver_id, &order.id)?;
        } else {
            store.release_active(driver_id, &order.id);
        }
    }
    Ok(())
}

fn refresh_busy_drivers(state: &AppState) {
    state
        .metrics
        .drivers_with_active_order
        .set(state.store.busy_driver_count() as i64);
}

/// Moves an order to `target`.
///
/// Any status may follow any other. The one rule enforced here is that a
/// driver holds at most one active order (`Moving`, or an unsettled
/// `Returning`); a move that would give the driver a second one fails with
/// `Conflict` and leaves the order as it was.
pub fn transition(
    state: &AppState,
    order_id: &str,
    target: OrderStatus,
    return_reason: Option<String>,
) -> Result<Order, AppError> {
    let return_reason = return_reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    let now = Utc::now();
    let store = state.store.as_ref();

    let mut previous = None;
    let updated = store.update_order(order_id, &mut |order| {
        previous = Some(order.status);
        apply_transition(store, order, target, return_reason.clone(), now)
    })?;

    state
        .metrics
        .status_transitions_total
        .with_label_values(&[target.as_str()])
        .inc();
    refresh_busy_drivers(state);

    info!(
        order_id = %updated.id,
        from = ?previous,
        to = %updated.status,
        driver_id = ?updated.assigned_driver,
        "order status updated"
    );

    Ok(updated)
}

/// Hands an order to a driver. An order that is already on the road cannot be
/// moved to somebody else.
pub fn assign_driver(state: &AppState, order_id: &str, driver_id: &str) -> Result<Order, AppError> {
    if state.store.get_driver(driver_id).is_none() {
        return Err(AppError::driver_not_found(driver_id));
    }

    let store = state.store.as_ref();
    let updated = store.update_order(order_id, &mut |order| {
        if order.is_active() {
            match order.assigned_driver.as_deref() {
                Some(current) if current != driver_id => {
                    return Err(AppError::Conflict(format!(
                        "order {order_id} is active with driver {current}"
                    )));
                }
                Some(_) => {}
                None => store.claim_active(driver_id, order_id)?,
            }
        }
        order.assigned_driver = Some(driver_id.to_string());
        Ok(())
    })?;

    refresh_busy_drivers(state);

    info!(order_id = %order_id, driver_id = %driver_id, "order assigned to driver");
    Ok(updated)
}

/// Records proof of delivery. `SIGNATURE` and `OTP` complete the order;
/// `PHOTO` documents returned goods and leaves the status alone.
pub fn confirm_delivery(
    state: &AppState,
    order_id: &str,
    method: ConfirmationMethod,
    payload: String,
) -> Result<Order, AppError> {
    if payload.trim().is_empty() {
        return Err(AppError::BadRequest(
            "confirmation payload cannot be empty".to_string(),
        ));
    }

    let now = Utc::now();
    let confirmation = Confirmation {
        method,
        payload,
        confirmed_at: now,
    };
    let store = state.store.as_ref();

    let updated = store.update_order(order_id, &mut |order| {
        order.confirmation = Some(confirmation.clone());
        if method == ConfirmationMethod::Photo {
            sync_driver_slot(store, order)
        } else {
            apply_transition(store, order, OrderStatus::Delivered, None, now)
        }
    })?;

    state
        .metrics
        .confirmations_total
        .with_label_values(&[method.as_str()])
        .inc();
    if method != ConfirmationMethod::Photo {
        state
            .metrics
            .status_transitions_total
            .with_label_values(&[OrderStatus::Delivered.as_str()])
            .inc();
    }
    refresh_busy_drivers(state);

    match method {
        ConfirmationMethod::Photo if updated.is_settled_return() => {
            info!(order_id = %order_id, "return documented with photo");
        }
        ConfirmationMethod::Photo => {
            warn!(
                order_id = %order_id,
                status = %updated.status,
                "photo recorded for an order that is not returning"
            );
        }
        _ => {
            info!(order_id = %order_id, method = method.as_str(), "delivery confirmed");
        }
    }

    Ok(updated)
}
