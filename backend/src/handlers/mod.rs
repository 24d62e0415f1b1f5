//! HTTP handlers for the Tillbook API

pub mod analytics;
pub mod assets;
pub mod costing;
pub mod customers;
pub mod health;
pub mod payments;
pub mod products;
pub mod purchase_orders;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod taxes;

pub use analytics::*;
pub use assets::*;
pub use costing::*;
pub use customers::*;
pub use health::*;
pub use payments::*;
pub use products::*;
pub use purchase_orders::*;
pub use reports::*;
pub use sales::*;
pub use suppliers::*;
pub use taxes::*;
