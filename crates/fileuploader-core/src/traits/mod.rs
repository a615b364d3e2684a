//! Collaborator traits defined in `fileuploader-core` and implemented by
//! other crates or by embedding applications.

pub mod codec;
pub mod persist;
pub mod validate;

pub use codec::{ImageCodec, ResizeRequest};
pub use persist::FilePersister;
pub use validate::{AcceptAll, FileValidator};
