//! Core type definitions used across the FileUploader workspace.

pub mod chunk;
pub mod editor;
pub mod file;
pub mod list;
pub mod request;
pub mod response;
pub mod warning;

pub use chunk::{ChunkAck, ChunkDescriptor};
pub use editor::{CropMode, CropRect, EditorParams};
pub use file::FileRecord;
pub use list::{ListEntry, ListInputState};
pub use request::{EnvironmentDiagnostic, HttpMethod, RawFile, RawFileInput, RequestContext};
pub use response::{UploadOutcome, UploadResult};
pub use warning::{TransportError, UploadWarning};
