//! Finance module: user balances, orders and download permissions.
//!
//! Pure domain logic over a unit of work; no IO.

pub mod model;
pub mod service;
pub mod unit_of_work;

#[cfg(test)]
pub(crate) mod testing;

pub use model::{Order, UserProfile};
pub use service::FinanceService;
pub use unit_of_work::FinanceUnitOfWork;
