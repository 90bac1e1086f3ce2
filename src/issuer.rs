use der::Encode;
use der::flagset::FlagSet;
use rand_core::RngCore;
use sha1::Sha1;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::extensions::ExtendedKeyUsage;
use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::extensions::KeyUsage;
use crate::cert::extensions::KeyUsages;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::Validity;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam};
use crate::error::{Result, SelfCertError};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Length of generated serial numbers in bytes.
const SERIAL_LEN: usize = 16;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the serial number for the next certificate: random, positive
    /// and without a leading zero octet.
    fn serial_number(&self) -> Vec<u8> {
        let mut serial = vec![0u8; SERIAL_LEN];
        rand_core::OsRng.fill_bytes(&mut serial);
        serial[0] = (serial[0] & 0x7f) | 0x01;
        serial
    }

    /// Issues a certificate based on the provided certification request information.
    ///
    /// The signature is always SHA-256 with RSA. The key is marked for digital
    /// signature and key encipherment, plus any requested extended usages.
    fn issue(&self, cert_request: &CertificationRequestInfo, validity: Validity) -> Result<Certificate> {
        let signature_algo = SignatureAlgorithm::Sha256WithRSA;

        let issuer_key_info = self.signing_key().as_spki()?;
        let issuer_key_id =
            <Sha1 as sha1::Digest>::digest(issuer_key_info.subject_public_key.raw_bytes());
        let subject_key_info = cert_request.subject_public_key.to_spki()?;
        let subject_key_id =
            <Sha1 as sha1::Digest>::digest(subject_key_info.subject_public_key.raw_bytes());

        let key_usage_flags: FlagSet<KeyUsages> =
            KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment;

        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(KeyUsage(key_usage_flags), true)?,
            ExtensionParam::from_extension(SubjectKeyIdentifier(subject_key_id.to_vec()), false)?,
            ExtensionParam::from_extension(
                AuthorityKeyIdentifier {
                    key_identifier: issuer_key_id.to_vec(),
                },
                false,
            )?,
        ];

        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: cert_request.usages.clone(),
            };
            extensions.push(ExtensionParam::from_extension(extended_key_usage, false)?);
        }

        let combined_extensions = cert_request
            .extensions
            .iter()
            .cloned()
            .chain(extensions)
            .collect();

        let tbs_cert = TbsCertificate {
            serial_number: self.serial_number(),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name(),
            validity,
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions: combined_extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| SelfCertError::EncodingError(e.to_string()))?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Extended key usages a default self-signed certificate carries.
pub const DEFAULT_USAGES: [ExtendedKeyUsageOption; 2] = [
    ExtendedKeyUsageOption::ServerAuth,
    ExtendedKeyUsageOption::ClientAuth,
];
