// ABOUTME: Streaming transfer and verification pipelines
// ABOUTME: Exports the transfer orchestrator, verifier, comparator, and normalizers

pub mod compare;
pub mod normalize;
pub mod transfer;
pub mod verify;

pub use compare::{Comparison, StreamComparator};
pub use normalize::normalize_chunk;
pub use transfer::TransferPipeline;
pub use verify::Verifier;
