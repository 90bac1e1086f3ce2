//! The issuance pipeline: generate, sign, install, export, convert, summarize.
//!
//! ```rust,no_run
//! use secrecy::SecretString;
//! use selfcert::export::{ExportFormat, FinalFormat};
//! use selfcert::issuance::CertificateIssuer;
//! use selfcert::request::IssuanceRequest;
//! use selfcert::store::NoopStore;
//!
//! # fn main() -> Result<(), selfcert::error::SelfCertError> {
//! let request = IssuanceRequest::builder()
//!     .common_name("test-cert")
//!     .export_format(ExportFormat::Pfx)
//!     .final_format(FinalFormat::Pem)
//!     .password(SecretString::from("Secr3t!".to_string()))
//!     .output_dir("/tmp/certs")
//!     .build();
//!
//! let issuance = CertificateIssuer::new(NoopStore).issue(&request)?;
//! println!("{}", issuance.summary);
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::cert::Thumbprint;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use crate::error::{Result, SelfCertError};
use crate::export::{self, CERTIFICATE_LABEL, ExportFormat, FinalFormat};
use crate::issuer::DEFAULT_USAGES;
use crate::key::{KEY_BITS, KeyPair, PublicKey};
use crate::request::IssuanceRequest;
use crate::store::CertificateStore;
use crate::summary::SummaryRecord;

/// The certificate produced by one run, held in memory until exported.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub key: KeyPair,
    pub thumbprint: Thumbprint,
}

impl IssuedCertificate {
    pub fn subject(&self) -> Result<DistinguishedName> {
        self.certificate.subject()
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.certificate.validity().not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.certificate.validity().not_after
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}

/// Files left on disk by a run, excluding the summary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub certificate_path: PathBuf,
    pub private_key_path: Option<PathBuf>,
}

impl ExportArtifact {
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.certificate_path.as_path()).chain(self.private_key_path.as_deref())
    }
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct Issuance {
    pub certificate: IssuedCertificate,
    pub artifact: ExportArtifact,
    pub summary: SummaryRecord,
    pub summary_path: PathBuf,
}

/// Issues self-signed certificates into a trust store and onto disk.
pub struct CertificateIssuer<S> {
    store: S,
}

impl<S: CertificateStore> CertificateIssuer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the whole pipeline for one request.
    ///
    /// The request, output directory and store are all checked before the
    /// store or any file is modified. Once mutation starts, a failure aborts
    /// the remaining steps; files completed by earlier steps stay behind.
    pub fn issue(&mut self, request: &IssuanceRequest) -> Result<Issuance> {
        request.validate()?;
        self.store.probe()?;
        fs::create_dir_all(&request.output_dir)
            .map_err(|e| SelfCertError::file(&request.output_dir, e))?;

        let subject = request.subject();
        info!("issuing self-signed certificate for {subject}");

        let removed = self.store.remove_subject(&subject)?;
        if removed > 0 {
            info!("replaced {removed} existing certificate(s) for {subject}");
        }

        let native_path = request.native_path();
        export::remove_if_exists(&native_path)?;

        let issued = self.create(request, &subject)?;
        let installed = self.store.install(&issued.certificate)?;
        debug!("installed certificate {installed}");

        let native_bytes = export_native(request, &issued)?;
        export::write_atomic(&native_path, &native_bytes)?;
        info!("exported {} to {}", request.export_format, native_path.display());

        let artifact = match request.final_format {
            FinalFormat::Pem => convert_to_pem(request, &issued, &native_path)?,
            FinalFormat::Native => ExportArtifact {
                certificate_path: native_path,
                private_key_path: None,
            },
        };

        let summary = SummaryRecord::new(
            artifact.certificate_path.clone(),
            artifact.private_key_path.clone(),
            issued.not_after(),
        );
        let summary_path = summary.write_to(&request.output_dir)?;
        info!(
            "certificate {} expires {}",
            issued.thumbprint,
            summary.expiration_string()
        );

        Ok(Issuance {
            certificate: issued,
            artifact,
            summary,
            summary_path,
        })
    }

    fn create(&self, request: &IssuanceRequest, subject: &DistinguishedName) -> Result<IssuedCertificate> {
        debug!("generating {KEY_BITS}-bit RSA key");
        let key = KeyPair::generate_rsa(KEY_BITS)?;

        let cert_info = CertificationRequestInfo::builder()
            .subject(subject.clone())
            .subject_public_key(key.public_key())
            .usages(DEFAULT_USAGES.to_vec())
            .build();
        let validity = Validity::for_days(request.validity_days)?;
        let certificate = Certificate::new_self_signed(&cert_info, &key, validity)?;
        let thumbprint = certificate.thumbprint()?;

        Ok(IssuedCertificate {
            certificate,
            key,
            thumbprint,
        })
    }
}

fn export_native(request: &IssuanceRequest, issued: &IssuedCertificate) -> Result<Vec<u8>> {
    match request.export_format {
        ExportFormat::Pfx => export::build_pfx(&issued.certificate, &issued.key, &request.password),
        ExportFormat::Cer => issued.certificate.to_der(),
    }
}

/// Replaces the native export with `<name>.pem` and `privkey.pem`.
fn convert_to_pem(
    request: &IssuanceRequest,
    issued: &IssuedCertificate,
    native_path: &Path,
) -> Result<ExportArtifact> {
    let native = fs::read(native_path).map_err(|e| SelfCertError::file(native_path, e))?;

    // The private key is always recovered from a PKCS#12 carrier. A CER export
    // has none, so one is built in memory and never written out.
    let (carrier, cert_der) = match request.export_format {
        ExportFormat::Pfx => (native, None),
        ExportFormat::Cer => (
            export::build_pfx(&issued.certificate, &issued.key, &request.password)?,
            Some(native),
        ),
    };
    let contents = export::open_pfx(&carrier, &request.password)?;

    let key_path = request.private_key_path();
    let key_pem = contents.key.to_pkcs8_pem()?;
    export::write_atomic(&key_path, key_pem.as_bytes())?;
    drop(key_pem);

    let cert_der = match cert_der {
        Some(der) => der,
        None => contents.certificate.to_der()?,
    };
    let pem_path = request.pem_path();
    export::write_atomic(&pem_path, export::der_to_pem(&cert_der, CERTIFICATE_LABEL).as_bytes())?;

    export::remove_if_exists(native_path)?;
    info!(
        "converted to PEM: {} and {}",
        pem_path.display(),
        key_path.display()
    );

    Ok(ExportArtifact {
        certificate_path: pem_path,
        private_key_path: Some(key_path),
    })
}
