//! Upload pipeline stages.

pub mod editor;
pub mod reconciler;
pub mod service;
pub mod sorter;
pub mod validator;

pub use editor::ImagePostProcessor;
pub use reconciler::ListReconciler;
pub use service::UploadService;
pub use sorter::sort_by_index;
pub use validator::UploadValidator;
