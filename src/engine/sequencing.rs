use serde::Serialize;

use crate::geo::{haversine_km, round_km};
use crate::models::driver::GeoPoint;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    #[serde(flatten)]
    pub order: Order,
    pub actionable: bool,
    /// From the driver's last reported position to the order's next stop.
    pub distance_km: Option<f64>,
}

/// Destination while moving, otherwise the pickup point.
fn next_stop(order: &Order) -> GeoPoint {
    match order.status {
        OrderStatus::Moving => order.destination.point(),
        _ => order.pickup.point(),
    }
}

fn queue_rank(order: &Order) -> Option<u8> {
    match order.status {
        OrderStatus::Moving => Some(0),
        OrderStatus::Returning if !order.is_settled_return() => Some(1),
        OrderStatus::Pending => Some(2),
        _ => None,
    }
}

/// Work list for one driver: moving orders first, then unsettled returns,
/// then pending ones, ties broken by id.
///
/// While the driver has an active order only that order is actionable; the
/// rest are still listed so the driver can see what comes next.
pub fn driver_queue(orders: &[Order], driver_id: &str) -> Vec<QueueEntry> {
    let mut queued: Vec<(u8, &Order)> = orders
        .iter()
        .filter(|order| order.assigned_driver.as_deref() == Some(driver_id))
        .filter_map(|order| queue_rank(order).map(|rank| (rank, order)))
        .collect();

    queued.sort_by(|(rank_a, a), (rank_b, b)| rank_a.cmp(rank_b).then_with(|| a.id.cmp(&b.id)));

    let has_active = queued.iter().any(|(_, order)| order.is_active());

    queued
        .into_iter()
        .map(|(_, order)| QueueEntry {
            actionable: !has_active || order.is_active(),
            order: order.clone(),
            distance_km: None,
        })
        .collect()
}

pub fn queue_for_driver(state: &AppState, driver_id: &str) -> Vec<QueueEntry> {
    let mut queue = driver_queue(&state.store.list_orders(), driver_id);

    let position = state
        .store
        .get_driver(driver_id)
        .and_then(|driver| driver.location);
    if let Some(position) = position {
        for entry in &mut queue {
            let km = haversine_km(&position, &next_stop(&entry.order));
            entry.distance_km = Some(round_km(km));
        }
    }

    queue
}
