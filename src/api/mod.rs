pub mod doc;
pub mod handlers;
pub mod price_handlers;
pub mod routes;
pub mod state;
