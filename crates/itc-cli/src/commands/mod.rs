pub mod analyze;
pub mod ka;
pub mod plan;
