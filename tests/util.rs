#![allow(dead_code)]

use std::fs;
use std::path::Path;

use secrecy::SecretString;
use selfcert::export::{ExportFormat, FinalFormat};
use selfcert::request::IssuanceRequest;

pub const PASSWORD: &str = "Secr3t!";

pub fn password() -> SecretString {
    SecretString::from(PASSWORD.to_string())
}

pub fn request(
    dir: &Path,
    name: &str,
    export_format: ExportFormat,
    final_format: FinalFormat,
) -> IssuanceRequest {
    IssuanceRequest::builder()
        .common_name(name)
        .export_format(export_format)
        .final_format(final_format)
        .password(password())
        .output_dir(dir)
        .build()
}

/// Sorted names of the regular files directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
