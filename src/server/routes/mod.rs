pub mod cameras;
pub mod reports;
