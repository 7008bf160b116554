//! Uploaded files, formats and size limits

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const MIB: u64 = 1024 * 1024;

/// Formats the document processor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from a filename extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self, DomainError> {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Err(DomainError::unsupported_format(filename)),
        };

        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            _ => Err(DomainError::unsupported_format(format!(".{ext}"))),
        }
    }

    /// Detect the format from a MIME type
    pub fn from_mime(mime: &str) -> Result<Self, DomainError> {
        let mime_lower = mime.to_lowercase();

        if mime_lower.starts_with("text/plain") {
            return Ok(Self::Text);
        }

        if mime_lower.starts_with("application/pdf") {
            return Ok(Self::Pdf);
        }

        Err(DomainError::unsupported_format(mime))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Maximum accepted upload size per format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLimits {
    pub max_text_bytes: u64,
    pub max_pdf_bytes: u64,
}

impl DocumentLimits {
    pub fn new(max_text_bytes: u64, max_pdf_bytes: u64) -> Self {
        Self {
            max_text_bytes,
            max_pdf_bytes,
        }
    }

    pub fn limit_for(&self, format: DocumentFormat) -> u64 {
        match format {
            DocumentFormat::Text => self.max_text_bytes,
            DocumentFormat::Pdf => self.max_pdf_bytes,
        }
    }
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_text_bytes: 10 * MIB,
            max_pdf_bytes: 50 * MIB,
        }
    }
}

/// A file handed over by the host application, consumed once per processing call
#[derive(Clone)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Format declared by the filename extension
    pub fn declared_format(&self) -> Result<DocumentFormat, DomainError> {
        DocumentFormat::from_filename(&self.name)
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Check format and size of an upload without reading its content
pub fn validate_upload(
    file: &UploadedFile,
    limits: &DocumentLimits,
) -> Result<DocumentFormat, DomainError> {
    let format = file.declared_format()?;
    let limit = limits.limit_for(format);

    if file.size() > limit {
        return Err(DomainError::file_too_large(
            format.extension(),
            limit,
            file.size(),
        ));
    }

    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_detect_format_from_filename() {
        assert_eq!(DocumentFormat::from_filename("notes.txt").unwrap(), DocumentFormat::Text);
        assert_eq!(DocumentFormat::from_filename("REPORT.PDF").unwrap(), DocumentFormat::Pdf);
        assert!(DocumentFormat::from_filename("slides.pptx").is_err());
        assert!(DocumentFormat::from_filename("noextension").is_err());
    }

    #[test]
    fn test_detect_format_from_mime() {
        assert_eq!(
            DocumentFormat::from_mime("text/plain; charset=utf-8").unwrap(),
            DocumentFormat::Text
        );
        assert_eq!(DocumentFormat::from_mime("application/pdf").unwrap(), DocumentFormat::Pdf);
        assert!(DocumentFormat::from_mime("text/html").is_err());
    }

    #[test]
    fn test_text_file_at_limit_passes() {
        let limits = DocumentLimits::default();
        let file = UploadedFile::new("big.txt", vec![b'a'; (10 * MIB) as usize]);

        assert_eq!(validate_upload(&file, &limits).unwrap(), DocumentFormat::Text);
    }

    #[test]
    fn test_text_file_one_byte_over_limit_fails() {
        let limits = DocumentLimits::default();
        let file = UploadedFile::new("big.txt", vec![b'a'; (10 * MIB + 1) as usize]);

        match validate_upload(&file, &limits) {
            Err(DomainError::FileTooLarge { limit, actual, .. }) => {
                assert_eq!(limit, 10 * MIB);
                assert_eq!(actual, 10 * MIB + 1);
            }
            other => panic!("expected FileTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_pdf_limit_is_larger() {
        let limits = DocumentLimits::new(4, 8);
        let pdf = UploadedFile::new("doc.pdf", vec![0u8; 6]);
        let txt = UploadedFile::new("doc.txt", vec![0u8; 6]);

        assert!(validate_upload(&pdf, &limits).is_ok());
        assert_eq!(
            validate_upload(&txt, &limits).unwrap_err().kind(),
            ErrorKind::FileTooLarge
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let file = UploadedFile::new("image.png", vec![1, 2, 3]);
        let err = validate_upload(&file, &DocumentLimits::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }
}
