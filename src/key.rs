use der::Encode;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::{Signature, SigningKey, VerifyingKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding},
    signature::{SignatureEncoding, Signer, Verifier},
};
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use zeroize::Zeroizing;

use crate::error::{Result, SelfCertError};

/// Key length used for every issued certificate.
pub const KEY_BITS: usize = 4096;

/// Whether the private half of a key pair may leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPolicy {
    #[default]
    Exportable,
    NonExportable,
}

/// An RSA key pair used to sign certificates.
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: RsaPublicKey,
    policy: ExportPolicy,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an exportable RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| SelfCertError::KeyGenerationError(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair {
            private: Box::new(private),
            public,
            policy: ExportPolicy::Exportable,
        })
    }

    /// Returns the same key pair under a different export policy.
    pub fn with_export_policy(mut self, policy: ExportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_exportable(&self) -> bool {
        self.policy == ExportPolicy::Exportable
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.public.size() * 8
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_key_pair(self)
    }

    /// The subject public key info for this key pair.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        self.public_key().to_spki()
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new((*self.private).clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| SelfCertError::RsaError(e.to_string()))?;
        Ok(signature.to_vec())
    }

    /// Encodes the private key as PKCS#8 DER.
    ///
    /// Fails with [`SelfCertError::KeyNotExportable`] for non-exportable keys.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        if !self.is_exportable() {
            return Err(SelfCertError::KeyNotExportable);
        }
        let document = self.private.to_pkcs8_der()?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Encodes the private key as an unencrypted PKCS#8 PEM (`PRIVATE KEY`).
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>> {
        if !self.is_exportable() {
            return Err(SelfCertError::KeyNotExportable);
        }
        Ok(self.private.to_pkcs8_pem(LineEnding::LF)?)
    }

    /// Imports an RSA private key from PKCS#8 DER.
    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_der(der)?;
        Ok(Self::from_private(private))
    }

    /// Imports an RSA private key from PKCS#8 PEM.
    pub fn import_from_pkcs8_pem(pem: &str) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        KeyPair {
            private: Box::new(private),
            public,
            policy: ExportPolicy::Exportable,
        }
    }
}

/// The public half of an RSA key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub RsaPublicKey);

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        PublicKey(key_pair.public.clone())
    }

    /// Reads an RSA public key out of a certificate's subject public key info.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        if spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(SelfCertError::DecodingError(format!(
                "Unsupported public key algorithm {}",
                spki.algorithm.oid
            )));
        }
        let der = spki.to_der()?;
        let public = RsaPublicKey::from_public_key_der(&der)?;
        Ok(PublicKey(public))
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.0.clone())?)
    }

    /// Verifies an RSASSA-PKCS1-v1_5 / SHA-256 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)
            .map_err(|e| SelfCertError::RsaError(e.to_string()))?;
        verifying_key
            .verify(data, &signature)
            .map_err(|e| SelfCertError::RsaError(e.to_string()))
    }
}
