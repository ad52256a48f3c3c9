// Domain layer - Core splitting logic

pub mod errors;
pub mod model;
pub mod rules;
