//! Repository port for orders, drivers and SOS alerts.
//!
//! Engine functions only talk to [`FleetStore`], so the in-memory backend can
//! be swapped for a persistent one without touching the API layer.

pub mod memory;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::Order;
use crate::models::sos::SosMessage;

pub use memory::InMemoryStore;

/// Callback applied to a record while the store holds its write lock.
pub type OrderUpdate<'a> = &'a mut dyn FnMut(&mut Order) -> Result<(), AppError>;
pub type DriverUpdate<'a> = &'a mut dyn FnMut(&mut Driver) -> Result<(), AppError>;

pub trait FleetStore: Send + Sync {
    /// Returns an `ORD-NNNN` id not currently in use.
    fn allocate_order_id(&self) -> String;

    /// Fails with `Conflict` when the id is already taken.
    fn insert_order(&self, order: Order) -> Result<Order, AppError>;

    fn get_order(&self, id: &str) -> Option<Order>;

    fn list_orders(&self) -> Vec<Order>;

    /// Mutates the order in place while holding its write lock. When `update`
    /// fails nothing is written. The callback may claim or release driver slots
    /// but must not touch other orders.
    fn update_order(&self, id: &str, update: OrderUpdate<'_>) -> Result<Order, AppError>;

    /// Reserves the driver's single active slot for `order_id`. Claiming a
    /// slot the order already holds succeeds.
    fn claim_active(&self, driver_id: &str, order_id: &str) -> Result<(), AppError>;

    /// Frees the slot if, and only if, `order_id` holds it.
    fn release_active(&self, driver_id: &str, order_id: &str);

    fn active_order_for(&self, driver_id: &str) -> Option<String>;

    fn busy_driver_count(&self) -> usize;

    /// Returns a `DRV-NNNN` id not currently in use.
    fn allocate_driver_id(&self) -> String;

    fn insert_driver(&self, driver: Driver) -> Result<Driver, AppError>;

    fn get_driver(&self, id: &str) -> Option<Driver>;

    fn list_drivers(&self) -> Vec<Driver>;

    fn update_driver(&self, id: &str, update: DriverUpdate<'_>) -> Result<Driver, AppError>;

    fn append_sos(&self, message: SosMessage) -> SosMessage;

    /// All alerts, newest first.
    fn list_sos(&self) -> Vec<SosMessage>;

    fn order_count(&self) -> usize;

    fn driver_count(&self) -> usize;

    fn sos_count(&self) -> usize;
}
