//! # fileuploader-storage
//!
//! Filesystem-facing building blocks for FileUploader: collision-free
//! naming, chunk session reassembly, stale chunk sweeping, local
//! persistence, and the default raster image codec.

pub mod chunked;
pub mod imaging;
pub mod naming;
pub mod providers;

pub use chunked::{ChunkProgress, ChunkReassembler, StaleChunkSweeper};
pub use imaging::RasterCodec;
pub use naming::{GeneratedName, NameSource, NamingEngine};
pub use providers::LocalPersister;
