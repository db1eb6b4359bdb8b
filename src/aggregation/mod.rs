pub mod aggregator;
pub mod dedup;

pub use aggregator::{ArchetypeGroup, MetagameAggregator, MetagameSnapshot};
pub use dedup::{DedupOutcome, decklist_hash, deduplicate};
