pub mod clean;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod transform;
