//! Route definitions for the Tillbook API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog
        .nest("/products", product_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/customers", customer_routes())
        // Transactions
        .nest("/sales", sale_routes())
        .nest("/purchase_orders", purchase_order_routes())
        .nest("/payments", payment_routes())
        .nest("/taxes", tax_routes())
        // Assets
        .nest("/assets", asset_routes())
        // Analytics and reports
        .nest("/analytics", analytics_routes())
        .nest("/reports", report_routes())
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low-stock", get(handlers::low_stock_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/:product_id/costing",
            get(handlers::get_product_costing).post(handlers::save_product_costing),
        )
}

/// Supplier routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
}

/// Customer routes
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
}

/// Sales routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/import", post(handlers::import_sales))
        .route("/:sale_id", get(handlers::get_sale))
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route("/:order_id", get(handlers::get_purchase_order))
        .route(
            "/:order_id/details",
            get(handlers::list_purchase_details).post(handlers::add_purchase_detail),
        )
        .route("/:order_id/receive", post(handlers::receive_purchase_order))
        .route("/:order_id/cancel", post(handlers::cancel_purchase_order))
}

/// Payment routes
fn payment_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_payments).post(handlers::record_payment),
    )
}

/// Tax rate and tax entry routes
fn tax_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rates",
            get(handlers::list_tax_rates).post(handlers::create_tax_rate),
        )
        .route(
            "/rates/:rate_id",
            put(handlers::update_tax_rate).delete(handlers::delete_tax_rate),
        )
        .route(
            "/entries",
            get(handlers::list_tax_entries).post(handlers::record_tax_entry),
        )
}

/// Fixed asset routes
fn asset_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_assets).post(handlers::create_asset))
        .route("/depreciation", get(handlers::depreciation_report))
        .route(
            "/:asset_id",
            get(handlers::get_asset)
                .put(handlers::update_asset)
                .delete(handlers::delete_asset),
        )
}

/// Analytics routes
fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/stock-status", get(handlers::stock_status))
        .route("/products/:product_id/insights", get(handlers::product_insights))
        .route("/margins", get(handlers::margins))
        .route("/dashboard", get(handlers::dashboard))
}

/// Financial report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/income-statement", get(handlers::income_statement))
        .route("/trial-balance", get(handlers::trial_balance))
        .route("/balance-sheet", get(handlers::balance_sheet))
        .route("/general-ledger", get(handlers::general_ledger))
}
