//! Output formats and the codecs that produce them.
//!
//! Certificates leave the process as PKCS#12 (`.pfx`), DER (`.cer`) or PEM.
//! Private keys only ever travel inside a password-protected PKCS#12
//! container or, when PEM output is requested, as an unencrypted PKCS#8 PEM.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use log::debug;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::cert::Certificate;
use crate::error::{Result, SelfCertError};
use crate::key::KeyPair;

/// PEM label for certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Native format the certificate is first exported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PKCS#12 container with the certificate and encrypted private key.
    Pfx,
    /// DER-encoded certificate only.
    Cer,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pfx => "pfx",
            ExportFormat::Cer => "cer",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = SelfCertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pfx" => Ok(ExportFormat::Pfx),
            "cer" => Ok(ExportFormat::Cer),
            _ => Err(SelfCertError::InvalidExportFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Format of the files left behind once issuance completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalFormat {
    /// Keep the native export as the final output.
    #[default]
    Native,
    /// Convert to a PEM certificate plus a separate PEM private key.
    Pem,
}

impl FinalFormat {
    /// Anything other than `pem` (case-insensitive) keeps the native output.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("pem") {
            FinalFormat::Pem
        } else {
            FinalFormat::Native
        }
    }
}

impl fmt::Display for FinalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalFormat::Native => f.write_str("native"),
            FinalFormat::Pem => f.write_str("pem"),
        }
    }
}

/// Friendly name stored alongside the key and certificate bags.
fn friendly_name(cert: &Certificate) -> Result<String> {
    Ok(cert.subject()?.common_name)
}

/// Serializes the certificate and its private key into a PKCS#12 container
/// protected by `password`.
pub fn build_pfx(cert: &Certificate, key: &KeyPair, password: &SecretString) -> Result<Vec<u8>> {
    let cert_der = cert.to_der()?;
    let key_der = key.to_pkcs8_der()?;
    let name = friendly_name(cert)?;
    let pfx = p12::PFX::new(&cert_der, &key_der, None, password.expose_secret(), &name)
        .ok_or_else(|| SelfCertError::EncodingError("Failed to build PKCS#12 container".into()))?;
    Ok(pfx.to_der())
}

/// Contents recovered from a PKCS#12 container.
pub struct PfxContents {
    pub certificate: Certificate,
    pub key: KeyPair,
}

/// Decrypts a PKCS#12 container and returns its certificate and private key.
///
/// The decrypted PKCS#8 bytes are zeroed before this returns, on success and
/// on every error path.
pub fn open_pfx(pfx_der: &[u8], password: &SecretString) -> Result<PfxContents> {
    let pfx = p12::PFX::parse(pfx_der)
        .map_err(|e| SelfCertError::KeyExtractionFailed(format!("Corrupt PKCS#12 data: {e:?}")))?;
    let password = password.expose_secret();
    if !pfx.verify_mac(password) {
        return Err(SelfCertError::KeyExtractionFailed(
            "PKCS#12 integrity check failed (wrong password?)".to_string(),
        ));
    }

    let key_bags: Vec<Zeroizing<Vec<u8>>> = pfx
        .key_bags(password)
        .map_err(|e| SelfCertError::KeyExtractionFailed(format!("{e:?}")))?
        .into_iter()
        .map(Zeroizing::new)
        .collect();
    let key_der = key_bags.first().ok_or_else(|| {
        SelfCertError::KeyExtractionFailed("PKCS#12 container holds no private key".to_string())
    })?;
    let key = KeyPair::import_from_pkcs8_der(key_der)
        .map_err(|e| SelfCertError::KeyExtractionFailed(e.to_string()))?;

    let cert_bags = pfx
        .cert_x509_bags(password)
        .map_err(|e| SelfCertError::KeyExtractionFailed(format!("{e:?}")))?;
    let cert_der = cert_bags.first().ok_or_else(|| {
        SelfCertError::KeyExtractionFailed("PKCS#12 container holds no certificate".to_string())
    })?;
    let certificate = Certificate::from_der(cert_der)?;

    if certificate.public_key()? != key.public_key() {
        return Err(SelfCertError::KeyExtractionFailed(
            "Private key does not match the certificate".to_string(),
        ));
    }

    Ok(PfxContents { certificate, key })
}

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Convert a PEM-encoded string to DER-encoded bytes, checking the label.
pub fn pem_to_der(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str).map_err(|e| SelfCertError::DecodingError(e.to_string()))?;
    if pem.tag() != label {
        return Err(SelfCertError::DecodingError(format!(
            "Expected PEM label {label}, found {}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| SelfCertError::file(path, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| SelfCertError::file(path, e))?;
    tmp.persist(path)
        .map_err(|e| SelfCertError::file(path, e.error))?;
    debug!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Removes `path` if it exists.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SelfCertError::file(path, e)),
    }
}
