pub mod acquire;
pub mod aggregate;
