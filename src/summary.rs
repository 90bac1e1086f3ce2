//! The three-line summary written next to the exported files.

use std::fmt;
use std::path::{Path, PathBuf};

use time::{Date, Month, OffsetDateTime};

use crate::error::{Result, SelfCertError};
use crate::export::write_atomic;

/// File name of the summary record inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "SSLInfo.txt";

/// Where the certificate and key ended up and when the certificate expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub certificate_path: PathBuf,
    pub private_key_path: Option<PathBuf>,
    pub expiration: Date,
}

impl SummaryRecord {
    pub fn new(
        certificate_path: PathBuf,
        private_key_path: Option<PathBuf>,
        not_after: OffsetDateTime,
    ) -> Self {
        Self {
            certificate_path,
            private_key_path,
            expiration: not_after.date(),
        }
    }

    /// Expiration date as `MM/dd/yyyy`.
    pub fn expiration_string(&self) -> String {
        format_date(self.expiration)
    }

    /// Renders the record: certificate path, private key path (empty when no
    /// key file was written) and expiration date, one per line.
    pub fn render(&self) -> String {
        let key_path = self
            .private_key_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!(
            "{}\n{}\n{}\n",
            self.certificate_path.display(),
            key_path,
            self.expiration_string()
        )
    }

    /// Writes the record to `<dir>/SSLInfo.txt`, replacing any previous one.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(SUMMARY_FILE_NAME);
        write_atomic(&path, self.render().as_bytes())?;
        Ok(path)
    }

    /// Parses a rendered record.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let [certificate, key, expiration] = lines.as_slice() else {
            return Err(SelfCertError::DecodingError(format!(
                "Summary must have exactly three lines, found {}",
                lines.len()
            )));
        };
        if certificate.is_empty() {
            return Err(SelfCertError::DecodingError(
                "Summary has no certificate path".to_string(),
            ));
        }
        Ok(Self {
            certificate_path: PathBuf::from(certificate),
            private_key_path: (!key.is_empty()).then(|| PathBuf::from(key)),
            expiration: parse_date(expiration)?,
        })
    }
}

impl fmt::Display for SummaryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certificate: {}", self.certificate_path.display())?;
        if let Some(key) = &self.private_key_path {
            writeln!(f, "Private key: {}", key.display())?;
        }
        write!(f, "Expires:     {}", self.expiration_string())
    }
}

/// Formats a date as `MM/dd/yyyy`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        u8::from(date.month()),
        date.day(),
        date.year()
    )
}

fn parse_date(s: &str) -> Result<Date> {
    let invalid = || SelfCertError::DecodingError(format!("Invalid date {s:?}: expected MM/dd/yyyy"));
    let parts: Vec<&str> = s.trim().split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return Err(invalid());
    };
    if month.len() != 2 || day.len() != 2 || year.len() != 4 {
        return Err(invalid());
    }
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let day: u8 = day.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    #[test]
    fn test_format_date_is_zero_padded() {
        assert_eq!(format_date(date(2026, Month::May, 8)), "05/08/2026");
        assert_eq!(format_date(date(2031, Month::December, 31)), "12/31/2031");
    }

    #[test]
    fn test_render_without_private_key_keeps_three_lines() {
        let record = SummaryRecord {
            certificate_path: PathBuf::from("/tmp/certs/test-cert.cer"),
            private_key_path: None,
            expiration: date(2026, Month::May, 8),
        };
        assert_eq!(record.render(), "/tmp/certs/test-cert.cer\n\n05/08/2026\n");
        assert_eq!(SummaryRecord::parse(&record.render()).unwrap(), record);
    }

    #[test]
    fn test_parse_with_private_key() {
        let text = "/tmp/certs/test-cert.pem\n/tmp/certs/privkey.pem\n05/08/2026\n";
        let record = SummaryRecord::parse(text).unwrap();
        assert_eq!(
            record.private_key_path,
            Some(PathBuf::from("/tmp/certs/privkey.pem"))
        );
        assert_eq!(record.expiration, date(2026, Month::May, 8));
    }

    #[test]
    fn test_parse_rejects_malformed_records() {
        assert!(SummaryRecord::parse("only-one-line").is_err());
        assert!(SummaryRecord::parse("a\nb\n2026-05-08\n").is_err());
        assert!(SummaryRecord::parse("a\nb\n02/30/2026\n").is_err());
    }

    #[test]
    fn test_write_to_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = SummaryRecord {
            certificate_path: dir.path().join("a.cer"),
            private_key_path: None,
            expiration: date(2026, Month::May, 8),
        };
        record.write_to(dir.path()).unwrap();
        record.expiration = date(2027, Month::May, 8);
        let path = record.write_to(dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.ends_with("05/08/2027\n"));
    }
}
