//! HTTP API handlers for scolaris-semestres

pub mod error;
pub mod health;
pub mod semestres;

pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use semestres::{
    create_semestre, delete_semestre, get_semestre_by_id, list_semestres, update_semestre,
};
