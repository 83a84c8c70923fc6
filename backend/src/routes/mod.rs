//! Route definitions for the Product Tracker API

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::dashboard_metrics))
        // Catalog
        .nest("/shops", shop_routes())
        .route(
            "/series",
            get(handlers::list_series).post(handlers::create_series),
        )
        // Orders and receiving
        .nest("/orders", order_routes())
        .nest("/receives", receive_routes())
        // Views over the ledger
        .nest("/pending", pending_routes())
        .route("/stock/:shop/:series", get(handlers::list_stock))
        .nest("/weekly-sales", weekly_sales_routes())
}

fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_shops).post(handlers::create_shop))
        .route("/:shop_id", get(handlers::get_shop))
        .route("/:shop_id/series", get(handlers::list_shop_series))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/next-number", get(handlers::next_order_number))
        .route("/normalize-negatives", patch(handlers::normalize_negatives))
        .route(
            "/:order_number",
            get(handlers::get_order)
                .put(handlers::replace_order)
                .delete(handlers::delete_order),
        )
}

fn receive_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_receives).post(handlers::create_receive))
        .route("/next-number", get(handlers::next_receive_number))
        .route(
            "/:receive_number",
            get(handlers::get_receive).put(handlers::replace_receive),
        )
        .route("/:receive_number/complete", patch(handlers::complete_receive))
}

fn pending_routes() -> Router<AppState> {
    Router::new()
        .route("/:shop_id/:series_name", get(handlers::pending_overview))
        .route(
            "/:shop_id/:series_name/manufacturing",
            get(handlers::manufacturing_pending),
        )
        .route("/:shop_id/:series_name/in-transit", get(handlers::in_transit))
        .route("/:shop_id/:series_name/total", get(handlers::total_pending))
}

fn weekly_sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sheets).post(handlers::open_week))
        .route(
            "/:sheet_id/items",
            get(handlers::list_items).post(handlers::add_item),
        )
        .route(
            "/:sheet_id/items/:item_id",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .route("/:sheet_id/close", post(handlers::close_week))
}
