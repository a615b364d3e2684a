//! Chunked upload handling.

pub mod cleanup;
pub mod reassembler;

pub use cleanup::StaleChunkSweeper;
pub use reassembler::{ChunkProgress, ChunkReassembler};
