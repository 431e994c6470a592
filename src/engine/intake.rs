use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::driver::{Driver, GeoPoint};
use crate::models::order::{Location, Order, OrderStatus, Payment, PaymentKind, Recipient};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub id: Option<String>,
    pub pickup: Location,
    pub destination: Location,
    pub recipient: Recipient,
    pub payment: Payment,
    #[serde(default)]
    pub assigned_driver: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

fn validate_location(field: &str, location: &Location) -> Result<(), AppError> {
    if location.address.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} address cannot be empty")));
    }
    if !location.point().is_valid() {
        return Err(AppError::BadRequest(format!(
            "{field} coordinates out of range"
        )));
    }
    Ok(())
}

fn validate_payment(payment: &Payment) -> Result<(), AppError> {
    match (payment.kind, payment.amount_to_collect) {
        (PaymentKind::Prepaid, Some(_)) => Err(AppError::BadRequest(
            "prepaid orders have nothing to collect".to_string(),
        )),
        (_, Some(amount)) if !amount.is_finite() || amount < 0.0 => Err(AppError::BadRequest(
            "amount_to_collect must be a non-negative number".to_string(),
        )),
        _ => Ok(()),
    }
}

fn explicit_id(id: Option<String>) -> Option<String> {
    id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty())
}

/// Registers a new order in `Pending`.
pub fn create_order(state: &AppState, new_order: NewOrder) -> Result<Order, AppError> {
    validate_location("pickup", &new_order.pickup)?;
    validate_location("destination", &new_order.destination)?;
    validate_payment(&new_order.payment)?;

    if new_order.recipient.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "recipient name cannot be empty".to_string(),
        ));
    }

    if let Some(driver_id) = new_order.assigned_driver.as_deref() {
        if state.store.get_driver(driver_id).is_none() {
            return Err(AppError::driver_not_found(driver_id));
        }
    }

    let id = explicit_id(new_order.id).unwrap_or_else(|| state.store.allocate_order_id());

    let order = state.store.insert_order(Order {
        id,
        status: OrderStatus::Pending,
        pickup: new_order.pickup,
        destination: new_order.destination,
        recipient: new_order.recipient,
        payment: new_order.payment,
        assigned_driver: new_order.assigned_driver,
        confirmation: None,
        order_date: Utc::now(),
        completed_at: None,
        return_reason: None,
    })?;

    state.metrics.orders_created_total.inc();
    info!(
        order_id = %order.id,
        driver_id = ?order.assigned_driver,
        route_km = order.route_distance_km(),
        "order created"
    );

    Ok(order)
}

pub fn get_order(state: &AppState, id: &str) -> Result<Order, AppError> {
    state
        .store
        .get_order(id)
        .ok_or_else(|| AppError::order_not_found(id))
}

/// Orders matching the filter, sorted by id.
pub fn list_orders(state: &AppState, filter: &OrderFilter) -> Vec<Order> {
    let mut orders: Vec<Order> = state
        .store
        .list_orders()
        .into_iter()
        .filter(|order| filter.status.is_none_or(|status| order.status == status))
        .filter(|order| {
            filter
                .driver
                .as_deref()
                .is_none_or(|driver| order.assigned_driver.as_deref() == Some(driver))
        })
        .collect();

    orders.sort_by(|a, b| a.id.cmp(&b.id));
    orders
}

pub fn create_driver(state: &AppState, new_driver: NewDriver) -> Result<Driver, AppError> {
    if new_driver.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if let Some(location) = &new_driver.location {
        if !location.is_valid() {
            return Err(AppError::BadRequest("coordinates out of range".to_string()));
        }
    }

    let id = explicit_id(new_driver.id).unwrap_or_else(|| state.store.allocate_driver_id());

    let driver = state.store.insert_driver(Driver {
        id,
        name: new_driver.name.trim().to_string(),
        phone: new_driver.phone,
        location: new_driver.location,
        updated_at: Utc::now(),
    })?;

    info!(driver_id = %driver.id, "driver registered");
    Ok(driver)
}

pub fn update_driver_location(
    state: &AppState,
    driver_id: &str,
    location: GeoPoint,
) -> Result<Driver, AppError> {
    if !location.is_valid() {
        return Err(AppError::BadRequest("coordinates out of range".to_string()));
    }

    state.store.update_driver(driver_id, &mut |driver| {
        driver.location = Some(location);
        driver.updated_at = Utc::now();
        Ok(())
    })
}
