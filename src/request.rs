use std::path::{Path, PathBuf};

use bon::Builder;
use secrecy::{ExposeSecret, SecretString};

use crate::cert::params::{DEFAULT_VALIDITY_DAYS, DistinguishedName, MAX_VALIDITY_DAYS};
use crate::error::{Result, SelfCertError};
use crate::export::{ExportFormat, FinalFormat};

/// Everything needed to issue one self-signed certificate.
///
/// Built once, by the configuration loader or directly through the builder,
/// and never mutated afterwards. Key length (4096 bits) and signature digest
/// (SHA-256) are fixed and not part of the request.
///
/// ```rust
/// use secrecy::SecretString;
/// use selfcert::export::{ExportFormat, FinalFormat};
/// use selfcert::request::IssuanceRequest;
///
/// let request = IssuanceRequest::builder()
///     .common_name("test-cert")
///     .export_format(ExportFormat::Pfx)
///     .final_format(FinalFormat::Pem)
///     .password(SecretString::from("Secr3t!".to_string()))
///     .output_dir("/tmp/certs")
///     .build();
/// assert_eq!(request.subject().to_string(), "CN=test-cert");
/// assert_eq!(request.native_path().to_str(), Some("/tmp/certs/test-cert.pfx"));
/// ```
#[derive(Debug, Builder)]
pub struct IssuanceRequest {
    #[builder(into)]
    pub common_name: String,
    pub export_format: ExportFormat,
    #[builder(default)]
    pub final_format: FinalFormat,
    #[builder(default = SecretString::from(String::new()))]
    pub password: SecretString,
    #[builder(into)]
    pub output_dir: PathBuf,
    #[builder(default = DEFAULT_VALIDITY_DAYS)]
    pub validity_days: u32,
}

/// File name of the unencrypted private key written for PEM output.
pub const PRIVATE_KEY_FILE_NAME: &str = "privkey.pem";

impl IssuanceRequest {
    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::new(self.common_name.clone())
    }

    /// `<dir>/<name>.<pfx|cer>`
    pub fn native_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.common_name, self.export_format.extension()))
    }

    /// `<dir>/<name>.pem`
    pub fn pem_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pem", self.common_name))
    }

    /// `<dir>/privkey.pem`
    pub fn private_key_path(&self) -> PathBuf {
        self.output_dir.join(PRIVATE_KEY_FILE_NAME)
    }

    /// Whether a password-protected PKCS#12 container is produced at any point.
    pub fn needs_password(&self) -> bool {
        self.export_format == ExportFormat::Pfx || self.final_format == FinalFormat::Pem
    }

    /// Checks the request before anything on disk or in a store is touched.
    pub fn validate(&self) -> Result<()> {
        validate_common_name(&self.common_name)?;
        if self.output_dir.as_os_str().is_empty() {
            return Err(SelfCertError::ConfigMissing("Certificate.Path".to_string()));
        }
        if self.validity_days == 0 {
            return Err(SelfCertError::ConfigInvalid(
                "validity must be at least one day".to_string(),
            ));
        }
        if self.validity_days > MAX_VALIDITY_DAYS {
            return Err(SelfCertError::ConfigInvalid(format!(
                "validity of {} days exceeds the maximum of {MAX_VALIDITY_DAYS}",
                self.validity_days
            )));
        }
        if self.final_format == FinalFormat::Pem && self.pem_path() == self.private_key_path() {
            return Err(SelfCertError::ConfigInvalid(format!(
                "certificate name {:?} collides with {PRIVATE_KEY_FILE_NAME}",
                self.common_name
            )));
        }
        if self.needs_password() && self.password.expose_secret().is_empty() {
            return Err(SelfCertError::ConfigMissing(format!(
                "Certificate.Password (required for {} export with {} output)",
                self.export_format, self.final_format
            )));
        }
        Ok(())
    }
}

/// The common name doubles as a file name, so it has to be one.
fn validate_common_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SelfCertError::ConfigInvalid(
            "certificate name must not be empty".to_string(),
        ));
    }
    let as_path = Path::new(name);
    let is_single_component = as_path.components().count() == 1
        && as_path.file_name().and_then(|n| n.to_str()) == Some(name);
    if !is_single_component || name.contains(['/', '\\', '\0']) {
        return Err(SelfCertError::ConfigInvalid(format!(
            "certificate name {name:?} is not usable as a file name"
        )));
    }
    Ok(())
}
