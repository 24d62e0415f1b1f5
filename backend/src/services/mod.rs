//! Business logic services for Tillbook

pub mod analytics;
pub mod asset;
pub mod costing;
pub mod customer;
pub mod payment;
pub mod product;
pub mod purchase_order;
pub mod reporting;
pub mod sale;
pub mod supplier;
pub mod tax;

pub use analytics::AnalyticsService;
pub use asset::AssetService;
pub use costing::CostingService;
pub use customer::CustomerService;
pub use payment::PaymentService;
pub use product::ProductService;
pub use purchase_order::PurchaseOrderService;
pub use reporting::ReportingService;
pub use sale::SaleService;
pub use supplier::SupplierService;
pub use tax::TaxService;
