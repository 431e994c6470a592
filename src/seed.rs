//! Start-up data: the built-in demo fleet or a JSON seed file.

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::driver::{Driver, GeoPoint};
use crate::models::order::{Location, Order, OrderStatus, Payment, PaymentKind, Recipient};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl SeedData {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Internal(format!("failed to read seed file {}: {err}", path.display()))
        })?;

        serde_json::from_str(&raw).map_err(|err| {
            AppError::Internal(format!("invalid seed file {}: {err}", path.display()))
        })
    }

    pub fn demo() -> Self {
        let now = Utc::now();
        let driver = |id: &str, name: &str, phone: &str, lat: f64, lng: f64| Driver {
            id: id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            location: Some(GeoPoint { lat, lng }),
            updated_at: now,
        };

        let depot = Location {
            address: "Central Depot, Jl. Industri 1".to_string(),
            lat: -6.1754,
            lng: 106.8272,
        };
        let order = |id: &str, status: OrderStatus, driver: Option<&str>, to: (&str, f64, f64)| {
            let mut order = Order {
                id: id.to_string(),
                status: OrderStatus::Pending,
                pickup: depot.clone(),
                destination: Location {
                    address: to.0.to_string(),
                    lat: to.1,
                    lng: to.2,
                },
                recipient: Recipient {
                    name: format!("Recipient {id}"),
                    phone: "+62 21 555 0100".to_string(),
                },
                payment: Payment {
                    kind: PaymentKind::Prepaid,
                    amount_to_collect: None,
                },
                assigned_driver: driver.map(str::to_string),
                confirmation: None,
                order_date: now - Duration::hours(6),
                completed_at: None,
                return_reason: None,
            };
            order.apply_status(status, None, now - Duration::hours(1));
            order
        };

        let mut cod = order(
            "ORD-0004",
            OrderStatus::Pending,
            Some("DRV-0002"),
            ("Pasar Baru Blok C", -6.1621, 106.8339),
        );
        cod.payment = Payment {
            kind: PaymentKind::PayOnDelivery,
            amount_to_collect: Some(250_000.0),
        };

        let mut returning = order(
            "ORD-0005",
            OrderStatus::Returning,
            Some("DRV-0002"),
            ("Jl. Kemang Raya 8", -6.2607, 106.8133),
        );
        returning.return_reason = Some("recipient refused damaged parcel".to_string());

        Self {
            drivers: vec![
                driver("DRV-0001", "Agus Santoso", "+62 812 0001", -6.1800, 106.8300),
                driver("DRV-0002", "Rina Wijaya", "+62 812 0002", -6.2000, 106.8200),
                driver("DRV-0003", "Dedi Pratama", "+62 812 0003", -6.2100, 106.8450),
            ],
            orders: vec![
                order(
                    "ORD-0001",
                    OrderStatus::Pending,
                    Some("DRV-0001"),
                    ("Jl. Thamrin 10", -6.1930, 106.8230),
                ),
                order(
                    "ORD-0002",
                    OrderStatus::Moving,
                    Some("DRV-0001"),
                    ("Jl. Gatot Subroto 22", -6.2297, 106.8176),
                ),
                order(
                    "ORD-0003",
                    OrderStatus::Delivered,
                    Some("DRV-0003"),
                    ("Jl. Rasuna Said 3", -6.2215, 106.8325),
                ),
                cod,
                returning,
                order(
                    "ORD-0006",
                    OrderStatus::Pending,
                    None,
                    ("Kota Tua, Jl. Pintu Besar", -6.1352, 106.8133),
                ),
            ],
        }
    }
}

/// Loads seed records into the store, repairing timestamp fields that disagree
/// with the order's status and claiming active slots for orders on the road.
pub fn apply(state: &AppState, seed: SeedData) -> Result<(), AppError> {
    let driver_count = seed.drivers.len();
    let order_count = seed.orders.len();
    let now = Utc::now();

    for driver in seed.drivers {
        state.store.insert_driver(driver)?;
    }

    for mut order in seed.orders {
        if order.status.is_terminal() != order.completed_at.is_some() {
            let completed_at = order.completed_at.unwrap_or(now);
            let reason = order.return_reason.take();
            order.apply_status(order.status, reason, completed_at);
        }
        if order.status != OrderStatus::Returning {
            order.return_reason = None;
        }

        if let Some(driver_id) = order.assigned_driver.as_deref() {
            if state.store.get_driver(driver_id).is_none() {
                warn!(order_id = %order.id, driver_id = %driver_id, "seed order references unknown driver");
            }
            if order.is_active() {
                state.store.claim_active(driver_id, &order.id)?;
            }
        }

        state.store.insert_order(order)?;
        state.metrics.orders_created_total.inc();
    }

    state
        .metrics
        .drivers_with_active_order
        .set(state.store.busy_driver_count() as i64);

    info!(drivers = driver_count, orders = order_count, "seed data loaded");
    Ok(())
}
