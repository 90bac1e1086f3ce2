//! # selfcert - Self-Signed Certificate Issuance in Pure Rust
//!
//! selfcert issues a self-signed X.509 certificate and writes it to disk as
//! PKCS#12 (`.pfx`), DER (`.cer`) or PEM, together with a three-line summary
//! record. It is built entirely on rustcrypto libraries; no OpenSSL is needed
//! at runtime.
//!
//! ## Fixed Parameters
//!
//! - **Key**: RSA, 4096 bits, exportable
//! - **Signature**: SHA-256 with RSA (PKCS#1 v1.5)
//! - **Validity**: 365 days from issuance unless configured otherwise
//! - **Subject / Issuer**: `CN=<name>`
//!
//! ## Output Layout
//!
//! | Export | Output | Files left in the output directory                 |
//! |--------|--------|----------------------------------------------------|
//! | pfx    | native | `<name>.pfx`, `SSLInfo.txt`                        |
//! | cer    | native | `<name>.cer`, `SSLInfo.txt`                        |
//! | pfx    | pem    | `<name>.pem`, `privkey.pem`, `SSLInfo.txt`         |
//! | cer    | pem    | `<name>.pem`, `privkey.pem`, `SSLInfo.txt`         |
//!
//! `SSLInfo.txt` holds the certificate path, the private key path (empty line
//! when no key file exists) and the expiration date as `MM/dd/yyyy`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use selfcert::{config, issuance::CertificateIssuer, store::FileStore};
//!
//! # fn main() -> Result<(), selfcert::error::SelfCertError> {
//! let settings = config::parse_config(
//!     "Certificate.Name = test-cert\n\
//!      Certificate.Format = pfx\n\
//!      Certificate.OutputFormat = pem\n\
//!      Certificate.Password = Secr3t!\n\
//!      Certificate.Path = /tmp/certs\n",
//! )?;
//! let request = settings.into_request()?;
//!
//! let mut issuer = CertificateIssuer::new(FileStore::new("/tmp/certs/.store"));
//! let issuance = issuer.issue(&request)?;
//! println!("{}", issuance.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is terminal and surfaces as a [`error::SelfCertError`]:
//!
//! ```rust
//! use selfcert::{error::SelfCertError, export::ExportFormat};
//!
//! match "der".parse::<ExportFormat>() {
//!     Ok(format) => println!("exporting as {format}"),
//!     Err(SelfCertError::InvalidExportFormat(value)) => println!("unsupported format {value}"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`issuance`]: The issuance pipeline
//! - [`request`]: The immutable issuance request
//! - [`config`]: Key/value configuration loading
//! - [`key`]: RSA key generation, import/export and signing
//! - [`cert`]: Certificate model, parameters and extensions
//! - [`issuer`]: Certificate signing
//! - [`export`]: PKCS#12, DER and PEM codecs and file writes
//! - [`store`]: Certificate trust stores
//! - [`summary`]: The summary record
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod cert;
pub mod config;
pub mod error;
pub mod export;
pub mod issuance;
pub mod issuer;
pub mod key;
pub mod request;
pub mod store;
pub mod summary;
pub mod tbs_certificate;
