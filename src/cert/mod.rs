pub mod extensions;
pub mod params;

use std::fmt;

use der::{Decode, DecodePem, Encode, EncodePem};
use params::{CertificationRequestInfo, DistinguishedName, Validity};
use sha1::{Digest, Sha1};
use x509_cert::certificate::CertificateInner;

use crate::error::{Result, SelfCertError};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::{TbsCertificate, from_x509_time};

/// Represents the supported signature algorithms for certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA signature algorithms carry an explicit NULL parameter.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::Any::null()),
            },
        }
    }
}

/// SHA-1 digest of a certificate's DER encoding, rendered as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Thumbprint(String);

impl Thumbprint {
    pub fn of_der(der: &[u8]) -> Self {
        Thumbprint(hex::encode_upper(Sha1::digest(der)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| SelfCertError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format (`CERTIFICATE` label, LF line endings).
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| SelfCertError::EncodingError(e.to_string()))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_pem(pem)?,
        })
    }

    pub fn thumbprint(&self) -> Result<Thumbprint> {
        Ok(Thumbprint::of_der(&self.to_der()?))
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the to-be-signed portion into its parameter form.
    pub fn tbs(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    /// Checks that the certificate names itself as issuer and that its
    /// signature verifies under its own public key.
    pub fn verify_self_signed(&self) -> Result<()> {
        if self.subject()? != self.issuer()? {
            return Err(SelfCertError::CertificateError(
                "Subject and issuer differ".to_string(),
            ));
        }
        if self.inner.signature_algorithm.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
        {
            return Err(SelfCertError::CertificateError(format!(
                "Unsupported signature algorithm {}",
                self.inner.signature_algorithm.oid
            )));
        }
        let tbs_der = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.raw_bytes();
        self.public_key()?.verify(&tbs_der, signature)
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity window of the certificate.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };
        self_issuer.issue(cert_info, validity)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{ExtendedKeyUsageOption, KeyUsage, KeyUsages};

    fn self_signed(name: &str) -> (Certificate, KeyPair) {
        let key = KeyPair::generate_rsa(2048).unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::new(name))
            .subject_public_key(key.public_key())
            .usages(vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ])
            .build();
        let cert = Certificate::new_self_signed(&info, &key, Validity::for_days(365).unwrap())
            .unwrap();
        (cert, key)
    }

    #[test]
    fn test_self_signed_certificate_fields() {
        let (cert, key) = self_signed("unit.local");
        assert_eq!(cert.subject().unwrap().to_string(), "CN=unit.local");
        assert_eq!(cert.issuer().unwrap(), cert.subject().unwrap());
        assert_eq!(cert.public_key().unwrap(), key.public_key());
        assert_eq!(
            cert.inner.signature_algorithm.oid,
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION
        );
        cert.verify_self_signed().unwrap();
    }

    #[test]
    fn test_key_usage_marks_signing_and_encipherment() {
        let (cert, _) = self_signed("unit.local");
        let tbs = cert.tbs().unwrap();
        let ku = tbs
            .extensions
            .iter()
            .find(|ext| ext.oid == <KeyUsage as extensions::ToAndFromX509Extension>::OID)
            .expect("key usage present");
        assert!(ku.critical);
        let ku: KeyUsage = ku.to_extension().unwrap();
        assert!(ku.0.contains(KeyUsages::DigitalSignature));
        assert!(ku.0.contains(KeyUsages::KeyEncipherment));
    }

    #[test]
    fn test_pem_and_der_decode_to_same_thumbprint() {
        let (cert, _) = self_signed("unit.local");
        let from_pem = Certificate::from_pem(&cert.to_pem().unwrap()).unwrap();
        let from_der = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
        assert_eq!(from_pem.thumbprint().unwrap(), cert.thumbprint().unwrap());
        assert_eq!(from_der, cert);
        assert_eq!(cert.thumbprint().unwrap().as_str().len(), 40);
    }

    #[test]
    fn test_tampered_certificate_fails_verification() {
        let (mut cert, _) = self_signed("unit.local");
        let (_, other) = self_signed("other.local");
        cert.inner.tbs_certificate.subject_public_key_info = other.as_spki().unwrap();
        assert!(cert.verify_self_signed().is_err());
    }

    #[test]
    fn test_not_after_past_2049_uses_generalized_time() {
        let key = KeyPair::generate_rsa(2048).unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::new("long.local"))
            .subject_public_key(key.public_key())
            .build();
        let validity = Validity::for_days(9500).unwrap();
        let cert = Certificate::new_self_signed(&info, &key, validity.clone()).unwrap();

        let inner = &cert.inner.tbs_certificate.validity;
        assert!(matches!(inner.not_before, x509_cert::time::Time::UtcTime(_)));
        assert!(matches!(inner.not_after, x509_cert::time::Time::GeneralTime(_)));

        let decoded = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
        assert_eq!(decoded.validity(), validity);
        decoded.verify_self_signed().unwrap();
    }
}
