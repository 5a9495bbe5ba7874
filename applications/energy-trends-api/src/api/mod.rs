pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::create_router;

use crate::services::TrendsService;

#[derive(Clone)]
pub struct AppState {
    pub service: TrendsService,
}
