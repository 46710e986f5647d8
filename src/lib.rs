pub mod config;
pub mod dashboard;
pub mod error;
pub mod etl;
pub mod history;
pub mod model;

pub use error::{AppError, AppResult};
