pub mod favorites;
pub mod schema;
pub mod server;
pub mod session;
pub mod shaping;
