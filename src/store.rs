//! Certificate trust stores.
//!
//! Issuance replaces, never accumulates: every certificate already installed
//! under the requested subject is removed before the new one goes in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::cert::params::DistinguishedName;
use crate::cert::{Certificate, Thumbprint};
use crate::error::{Result, SelfCertError};
use crate::export::{remove_if_exists, write_atomic};

/// A certificate held by a store, identified by its thumbprint.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub thumbprint: Thumbprint,
    pub certificate: Certificate,
}

/// Minimal interface to a repository of installed certificates.
pub trait CertificateStore {
    /// Checks the store is reachable and writable before anything is mutated.
    fn probe(&self) -> Result<()>;

    /// Returns every certificate whose subject equals `subject`.
    fn find(&self, subject: &DistinguishedName) -> Result<Vec<StoreEntry>>;

    /// Removes the certificate with the given thumbprint.
    fn remove(&mut self, thumbprint: &Thumbprint) -> Result<()>;

    /// Installs a certificate, returning its thumbprint.
    fn install(&mut self, cert: &Certificate) -> Result<Thumbprint>;

    /// Removes every certificate issued to `subject`. Returns how many went.
    fn remove_subject(&mut self, subject: &DistinguishedName) -> Result<usize> {
        let existing = self.find(subject)?;
        for entry in &existing {
            info!("removing existing certificate {} ({subject})", entry.thumbprint);
            self.remove(&entry.thumbprint)?;
        }
        Ok(existing.len())
    }
}

/// A store that holds nothing, for hosts without a certificate store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl CertificateStore for NoopStore {
    fn probe(&self) -> Result<()> {
        Ok(())
    }

    fn find(&self, _subject: &DistinguishedName) -> Result<Vec<StoreEntry>> {
        Ok(Vec::new())
    }

    fn remove(&mut self, _thumbprint: &Thumbprint) -> Result<()> {
        Ok(())
    }

    fn install(&mut self, cert: &Certificate) -> Result<Thumbprint> {
        cert.thumbprint()
    }
}

/// A directory of DER certificates named `<THUMBPRINT>.cer`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, thumbprint: &Thumbprint) -> PathBuf {
        self.root.join(format!("{thumbprint}.cer"))
    }

    /// Every certificate currently installed. Unreadable files are skipped.
    pub fn entries(&self) -> Result<Vec<StoreEntry>> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_error(&self.root, e)),
        };

        let mut entries = Vec::new();
        for item in dir {
            let path = item.map_err(|e| store_error(&self.root, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("cer") {
                continue;
            }
            let der = fs::read(&path).map_err(|e| store_error(&path, e))?;
            match Certificate::from_der(&der) {
                Ok(certificate) => entries.push(StoreEntry {
                    thumbprint: Thumbprint::of_der(&der),
                    certificate,
                }),
                Err(e) => warn!("skipping unreadable store entry {}: {e}", path.display()),
            }
        }
        entries.sort_by(|a, b| a.thumbprint.cmp(&b.thumbprint));
        Ok(entries)
    }
}

impl CertificateStore for FileStore {
    fn probe(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| access_error(&self.root, e))?;
        tempfile::tempfile_in(&self.root).map_err(|e| access_error(&self.root, e))?;
        Ok(())
    }

    fn find(&self, subject: &DistinguishedName) -> Result<Vec<StoreEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.certificate.subject().ok().as_ref() == Some(subject))
            .collect())
    }

    fn remove(&mut self, thumbprint: &Thumbprint) -> Result<()> {
        let path = self.entry_path(thumbprint);
        match remove_if_exists(&path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SelfCertError::StoreOperationFailed(format!(
                "no certificate with thumbprint {thumbprint} in {}",
                self.root.display()
            ))),
            Err(e) => Err(SelfCertError::StoreOperationFailed(e.to_string())),
        }
    }

    fn install(&mut self, cert: &Certificate) -> Result<Thumbprint> {
        let der = cert.to_der()?;
        let thumbprint = Thumbprint::of_der(&der);
        let path = self.entry_path(&thumbprint);
        fs::create_dir_all(&self.root).map_err(|e| store_error(&self.root, e))?;
        write_atomic(&path, &der).map_err(|e| SelfCertError::StoreOperationFailed(e.to_string()))?;
        debug!("installed {thumbprint} into {}", self.root.display());
        Ok(thumbprint)
    }
}

fn store_error(path: &Path, e: io::Error) -> SelfCertError {
    SelfCertError::StoreOperationFailed(format!("{}: {e}", path.display()))
}

fn access_error(path: &Path, e: io::Error) -> SelfCertError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        SelfCertError::PrivilegeDenied(format!("{}: {e}", path.display()))
    } else {
        SelfCertError::ToolUnavailable(format!("certificate store {}: {e}", path.display()))
    }
}
