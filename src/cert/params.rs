use std::fmt;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, PrintableStringRef, SetOfVec, Utf8StringRef};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{Result, SelfCertError};
use crate::key::PublicKey;

/// Default lifetime of an issued certificate.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Longest accepted lifetime, roughly one hundred years.
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `usages` - A list of extended key usage options.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// A single-attribute distinguished name, `CN=<common_name>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DistinguishedName {
    pub common_name: String,
}

impl DistinguishedName {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
        }
    }

    /// Converts the distinguished name to an X.509 name holding one UTF8String CN.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let value = Any::encode_from(&Utf8StringRef::new(&self.common_name)?)?;
        let attribute = AttributeTypeAndValue {
            oid: const_oid::db::rfc4519::CN,
            value,
        };
        let rdn = RelativeDistinguishedName(SetOfVec::try_from(vec![attribute])?);
        Ok(RdnSequence(vec![rdn]))
    }

    /// Reads the common name out of an X.509 name.
    ///
    /// Accepts UTF8String and PrintableString values; other attributes are ignored.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Result<Self> {
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                if attr.oid != const_oid::db::rfc4519::CN {
                    continue;
                }
                let common_name = attr
                    .value
                    .decode_as::<String>()
                    .or_else(|_| {
                        attr.value
                            .decode_as::<PrintableStringRef<'_>>()
                            .map(|s| s.to_string())
                    })
                    .map_err(|e| {
                        SelfCertError::DecodingError(format!("Unreadable common name: {e}"))
                    })?;
                return Ok(Self { common_name });
            }
        }
        Err(SelfCertError::DecodingError(
            "Name has no common name attribute".to_string(),
        ))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CN={}", self.common_name)
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// Both bounds are truncated to whole seconds, the precision of UTCTime.
    /// A lifetime that ends past the representable calendar is `ConfigInvalid`.
    pub fn for_days(days: u32) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        let now = OffsetDateTime::from_unix_timestamp(now.unix_timestamp())
            .map_err(|e| SelfCertError::CertificateError(e.to_string()))?;
        let not_after = now
            .checked_add(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                SelfCertError::ConfigInvalid(format!("validity of {days} days is out of range"))
            })?;
        Ok(Self {
            not_before: now,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}
