pub mod catalog;
pub mod metrics;
pub mod plan;
pub mod recipes;
pub mod scaling;
pub mod week;
