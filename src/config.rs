//! Certificate configuration file parser.
//!
//! Accepts flat `Certificate.Name = value` lines as well as INI-style
//! sections, where `Name = value` under `[Certificate]` means the same thing.
//! Keys are case-insensitive; `#` and `;` start comment lines.
//!
//! ```text
//! [Certificate]
//! Name         = test-cert
//! Format       = pfx
//! OutputFormat = pem
//! Password     = Secr3t!
//! Path         = /tmp/certs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::cert::params::DEFAULT_VALIDITY_DAYS;
use crate::error::{Result, SelfCertError};
use crate::export::{ExportFormat, FinalFormat};
use crate::request::IssuanceRequest;

/// Raw certificate settings as read from the configuration file.
#[derive(Debug, Default)]
pub struct CertificateSettings {
    /// `Certificate.Name`
    pub name: Option<String>,
    /// `Certificate.Format` (pfx|cer)
    pub format: Option<String>,
    /// `Certificate.OutputFormat` (pem|native)
    pub output_format: Option<String>,
    /// `Certificate.Password`
    pub password: Option<SecretString>,
    /// `Certificate.Path`
    pub path: Option<PathBuf>,
    /// `Certificate.ValidityDays`
    pub validity_days: Option<String>,
    /// `Certificate.Store`: directory of the file-backed trust store.
    pub store: Option<PathBuf>,
}

/// Parse `path` as a certificate configuration file.
pub fn load_config(path: &Path) -> Result<CertificateSettings> {
    let content = fs::read_to_string(path).map_err(|e| {
        SelfCertError::ConfigMissing(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_config(&content)
}

/// Parse configuration text. Unknown keys and sections are ignored.
pub fn parse_config(content: &str) -> Result<CertificateSettings> {
    let mut settings = CertificateSettings::default();
    let mut section = String::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_ascii_lowercase();
            continue;
        }
        let Some((key, val)) = line.split_once('=') else {
            return Err(SelfCertError::ConfigInvalid(format!(
                "line {}: expected key = value",
                index + 1
            )));
        };
        let key = key.trim().to_ascii_lowercase();
        let val = val.trim().to_string();

        let qualified = match (section.as_str(), key.contains('.')) {
            ("", _) | (_, true) => key,
            (section, false) => format!("{section}.{key}"),
        };

        match qualified.as_str() {
            "certificate.name"         => settings.name          = Some(val),
            "certificate.format"       => settings.format        = Some(val),
            "certificate.outputformat" => settings.output_format = Some(val),
            "certificate.password"     => settings.password      = Some(SecretString::from(val)),
            "certificate.path"         => settings.path          = Some(PathBuf::from(val)),
            "certificate.validitydays" => settings.validity_days = Some(val),
            "certificate.store"        => settings.store         = Some(PathBuf::from(val)),
            _ => {} // ignore unknown keys
        }
    }

    Ok(settings)
}

impl CertificateSettings {
    /// Validates the raw settings and builds the immutable request.
    ///
    /// The export format is checked here, before any store entry or file is
    /// touched.
    pub fn into_request(self) -> Result<IssuanceRequest> {
        let name = required(self.name, "Certificate.Name")?;
        let export_format: ExportFormat = self
            .format
            .ok_or_else(|| SelfCertError::ConfigMissing("Certificate.Format".to_string()))?
            .parse()?;
        let final_format = self
            .output_format
            .as_deref()
            .map(FinalFormat::parse)
            .unwrap_or_default();
        let output_dir = self
            .path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| SelfCertError::ConfigMissing("Certificate.Path".to_string()))?;
        let validity_days = match self.validity_days.as_deref() {
            None | Some("") => DEFAULT_VALIDITY_DAYS,
            Some(v) => v.parse().map_err(|_| {
                SelfCertError::ConfigInvalid(format!("Certificate.ValidityDays {v:?} is not a number"))
            })?,
        };

        let request = IssuanceRequest::builder()
            .common_name(name)
            .export_format(export_format)
            .final_format(final_format)
            .password(
                self.password
                    .unwrap_or_else(|| SecretString::from(String::new())),
            )
            .output_dir(output_dir)
            .validity_days(validity_days)
            .build();
        request.validate()?;
        Ok(request)
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SelfCertError::ConfigMissing(key.to_string())),
    }
}
