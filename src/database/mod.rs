pub mod manager;
pub mod models;

pub use manager::{DatabaseError, Db};
