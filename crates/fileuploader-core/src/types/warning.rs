//! Warning taxonomy reported in upload results.

use thiserror::Error;

/// Error codes reported by the transport for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("The uploaded file exceeds the maximum upload size allowed by the server")]
    ServerLimit,
    #[error("The uploaded file exceeds the MAX_FILE_SIZE directive that was specified in the HTML form")]
    FormLimit,
    #[error("The uploaded file was only partially uploaded")]
    Partial,
    #[error("No file was uploaded")]
    NoFile,
    #[error("Missing a temporary folder")]
    MissingTempDir,
    #[error("Failed to write file to disk")]
    WriteFailure,
    #[error("File upload stopped by extension")]
    BlockedByExtension,
    #[error("Unknown upload error")]
    Unknown(u16),
}

impl TransportError {
    /// Map a numeric transport code; `0` means no error.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::ServerLimit),
            2 => Some(Self::FormLimit),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::MissingTempDir),
            7 => Some(Self::WriteFailure),
            8 => Some(Self::BlockedByExtension),
            other => Some(Self::Unknown(other)),
        }
    }

    /// Numeric transport code.
    pub fn code(self) -> u16 {
        match self {
            Self::ServerLimit => 1,
            Self::FormLimit => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::MissingTempDir => 6,
            Self::WriteFailure => 7,
            Self::BlockedByExtension => 8,
            Self::Unknown(code) => code,
        }
    }
}

/// A reason a submission or one of its files was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadWarning {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("File uploads are disabled on this server")]
    UploadsDisabled,
    #[error("No file was chosen. Please select one")]
    Required,
    #[error("Maximum number of files is exceeded")]
    TooManyFiles,
    #[error("Upload folder doesn't exist or is not writable")]
    InvalidFolder,
    #[error("Files exceed the maximum request size allowed by the server")]
    PostTooLarge,
    #[error("Files are too big")]
    FilesTooBig,
    #[error("File type is not allowed for {0}")]
    FileType(String),
    #[error("{0} is too large")]
    FileTooLarge(String),
    #[error("{0} could not be saved")]
    PersistFailed(String),
    #[error("Unable to find a free name for {0}")]
    NameUnavailable(String),
    /// Message returned verbatim by a custom validator.
    #[error("{0}")]
    Custom(String),
}
