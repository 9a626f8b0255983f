//! Send action: delivery with retry and lineage bookkeeping

pub mod agent;

pub use agent::{backoff_delay, DeliveryAgent, DeliveryReport, DeliverySummary};
