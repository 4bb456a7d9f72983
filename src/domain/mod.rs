pub mod comparison;
pub mod summary;
