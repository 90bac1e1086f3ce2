//! use selfcert::error::SelfCertError;

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while issuing and exporting a certificate.
///
/// Every variant is terminal: the issuance pipeline aborts on the first one
/// and performs no retries.
#[derive(Debug, Error)]
pub enum SelfCertError {
    /// The cryptographic backend or certificate store can't be used.
    #[error("Required capability unavailable: {0}")]
    ToolUnavailable(String),

    /// Insufficient rights to modify the certificate store.
    #[error("Permission denied: {0}")]
    PrivilegeDenied(String),

    /// A required configuration key is absent.
    #[error("Missing configuration value: {0}")]
    ConfigMissing(String),

    /// A configuration value is present but unusable.
    #[error("Invalid configuration value: {0}")]
    ConfigInvalid(String),

    /// The requested export format is neither `pfx` nor `cer`.
    #[error("Invalid export format {0:?}: expected \"pfx\" or \"cer\"")]
    InvalidExportFormat(String),

    /// Looking up, removing or installing a store entry failed.
    #[error("Certificate store operation failed: {0}")]
    StoreOperationFailed(String),

    /// Writing or removing an output file failed.
    #[error("Failed to write {}: {source}", path.display())]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key couldn't be recovered from a PKCS#12 container.
    #[error("Failed to extract private key: {0}")]
    KeyExtractionFailed(String),

    /// The private key was generated without the exportable flag.
    #[error("Private key is not exportable")]
    KeyNotExportable,

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),
}

impl SelfCertError {
    /// Wraps an I/O error raised while touching `path`.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SelfCertError::FileWriteFailed {
            path: path.into(),
            source,
        }
    }
}

impl From<der::Error> for SelfCertError {
    /// Converts a `der::Error` into a `SelfCertError`.
    fn from(err: der::Error) -> Self {
        SelfCertError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for SelfCertError {
    fn from(err: rsa::Error) -> Self {
        SelfCertError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs8::Error> for SelfCertError {
    fn from(err: rsa::pkcs8::Error) -> Self {
        SelfCertError::EncodingError(err.to_string())
    }
}

impl From<rsa::pkcs8::spki::Error> for SelfCertError {
    fn from(err: rsa::pkcs8::spki::Error) -> Self {
        SelfCertError::EncodingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SelfCertError>;
