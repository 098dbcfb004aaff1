pub mod handlers;
pub mod invoke;
pub mod routes;

pub use routes::create_router;
