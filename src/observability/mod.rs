// Observability: metrics for merge-code resolution

pub mod metrics;
