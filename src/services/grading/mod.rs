pub mod aggregator;
pub mod recalculate;
pub mod strategies;
