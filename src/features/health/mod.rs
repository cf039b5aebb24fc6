pub mod handler;

pub use handler::{HealthResponse, RootResponse, create_health_router};
