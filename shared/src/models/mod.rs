//! Domain models shared between the backend and the browser (via WASM)

mod costing;
mod product;
mod sale;

pub use costing::*;
pub use product::*;
pub use sale::*;
