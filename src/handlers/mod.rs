pub mod health_handlers;
pub mod list_handlers;
