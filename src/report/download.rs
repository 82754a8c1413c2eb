//! Report artifact decoding (plain CSV or a ZIP holding one CSV).

use std::io::{Cursor, Read};

use crate::error::{ReportError, Result};

/// Shape of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Csv,
    Zip,
}

impl ArtifactFormat {
    /// Detect from the leading bytes, falling back to the content type.
    pub fn detect(bytes: &[u8], content_type: Option<&str>) -> Self {
        if has_zip_signature(bytes) {
            return Self::Zip;
        }
        let zip_type = content_type
            .map(|ct| ct.to_ascii_lowercase())
            .is_some_and(|ct| ct.contains("application/zip") || ct.contains("x-zip"));
        if zip_type && bytes.starts_with(b"PK") {
            return Self::Zip;
        }
        Self::Csv
    }
}

// Local file header, end of central directory (empty archive), spanned marker.
fn has_zip_signature(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([b'P', b'K', 3, 4]) | Some([b'P', b'K', 5, 6]) | Some([b'P', b'K', 7, 8])
    )
}

/// Decode artifact bytes into CSV text.
pub fn decode(bytes: &[u8], content_type: Option<&str>) -> Result<String> {
    match ArtifactFormat::detect(bytes, content_type) {
        ArtifactFormat::Zip => extract_csv(bytes),
        ArtifactFormat::Csv => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Read the CSV member of a ZIP archive: the first `.csv` entry, else the first entry.
pub fn extract_csv(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if archive.len() == 0 {
        return Err(ReportError::EmptyArchive);
    }

    let mut index = 0;
    for i in 0..archive.len() {
        if archive.by_index(i)?.name().to_ascii_lowercase().ends_with(".csv") {
            index = i;
            break;
        }
    }

    let mut entry = archive.by_index(index)?;
    tracing::debug!(entry = entry.name(), size = entry.size(), "Extracting report archive entry");
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
