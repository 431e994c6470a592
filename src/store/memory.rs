use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::sos::SosMessage;
use crate::store::{DriverUpdate, FleetStore, OrderUpdate};

/// Process-lifetime store. Every instance is isolated, so tests build their own.
#[derive(Default)]
pub struct InMemoryStore {
    orders: DashMap<String, Order>,
    drivers: DashMap<String, Driver>,
    // driver id -> order id holding the driver's active slot
    active: DashMap<String, String>,
    sos: DashMap<u64, SosMessage>,
    order_seq: AtomicU64,
    driver_seq: AtomicU64,
    sos_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_free_id<V>(map: &DashMap<String, V>, seq: &AtomicU64, prefix: &str) -> String {
    loop {
        let n = seq.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{prefix}-{n:04}");
        if !map.contains_key(&id) {
            return id;
        }
    }
}

impl FleetStore for InMemoryStore {
    fn allocate_order_id(&self) -> String {
        next_free_id(&self.orders, &self.order_seq, "ORD")
    }

    fn insert_order(&self, order: Order) -> Result<Order, AppError> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "order {} already exists",
                order.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(order)
            }
        }
    }

    fn get_order(&self, id: &str) -> Option<Order> {
        self.orders.get(id).map(|entry| entry.value().clone())
    }

    fn list_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn update_order(&self, id: &str, update: OrderUpdate<'_>) -> Result<Order, AppError> {
        let mut entry = self
            .orders
            .get_mut(id)
            .ok_or_else(|| AppError::order_not_found(id))?;

        let mut draft = entry.value().clone();
        update(&mut draft)?;
        *entry = draft.clone();

        Ok(draft)
    }

    fn claim_active(&self, driver_id: &str, order_id: &str) -> Result<(), AppError> {
        match self.active.entry(driver_id.to_string()) {
            Entry::Occupied(slot) if slot.get() != order_id => Err(AppError::Conflict(format!(
                "driver {driver_id} already has active order {}",
                slot.get()
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(order_id.to_string());
                Ok(())
            }
        }
    }

    fn release_active(&self, driver_id: &str, order_id: &str) {
        self.active.remove_if(driver_id, |_, held| held == order_id);
    }

    fn active_order_for(&self, driver_id: &str) -> Option<String> {
        self.active.get(driver_id).map(|entry| entry.value().clone())
    }

    fn busy_driver_count(&self) -> usize {
        self.active.len()
    }

    fn allocate_driver_id(&self) -> String {
        next_free_id(&self.drivers, &self.driver_seq, "DRV")
    }

    fn insert_driver(&self, driver: Driver) -> Result<Driver, AppError> {
        match self.drivers.entry(driver.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "driver {} already exists",
                driver.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(driver.clone());
                Ok(driver)
            }
        }
    }

    fn get_driver(&self, id: &str) -> Option<Driver> {
        self.drivers.get(id).map(|entry| entry.value().clone())
    }

    fn list_drivers(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by(|a, b| a.id.cmp(&b.id));
        drivers
    }

    fn update_driver(&self, id: &str, update: DriverUpdate<'_>) -> Result<Driver, AppError> {
        let mut entry = self
            .drivers
            .get_mut(id)
            .ok_or_else(|| AppError::driver_not_found(id))?;

        let mut draft = entry.value().clone();
        update(&mut draft)?;
        *entry = draft.clone();

        Ok(draft)
    }

    fn append_sos(&self, message: SosMessage) -> SosMessage {
        let seq = self.sos_seq.fetch_add(1, Ordering::Relaxed);
        self.sos.insert(seq, message.clone());
        message
    }

    fn list_sos(&self) -> Vec<SosMessage> {
        let mut entries: Vec<(u64, SosMessage)> = self
            .sos
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        entries.into_iter().map(|(_, message)| message).collect()
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    fn sos_count(&self) -> usize {
        self.sos.len()
    }
}
