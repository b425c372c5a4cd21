mod admin;
mod api;
mod health;

pub use admin::admin_router;
pub use api::api_router;
pub use health::health_router;
