//! PDF document parser backed by lopdf

use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::domain::ingestion::{DocumentFormat, DocumentMetadata, DocumentParser, ParsedDocument};
use crate::domain::DomainError;

/// Parser for PDF files.
///
/// Text is extracted page by page. A page without extractable text (a
/// scanned image, an unsupported font encoding) contributes an empty string
/// and is listed in [`DocumentMetadata::empty_pages`].
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    fn extract(bytes: &[u8]) -> Result<ParsedDocument, DomainError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| DomainError::corrupt_document(format!("not a readable PDF: {e}")))?;

        let pages = doc.get_pages();
        let mut content = String::new();
        let mut empty_pages = Vec::new();

        for page_num in pages.keys().copied() {
            let text = match doc.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    empty_pages.push(page_num);
                    String::new()
                }
                Err(e) => {
                    debug!(page = page_num, error = %e, "No extractable text on page");
                    empty_pages.push(page_num);
                    String::new()
                }
            };

            content.push_str(text.trim_end_matches('\n'));
            content.push('\n');
        }

        let mut metadata = DocumentMetadata::from_text(DocumentFormat::Pdf, &content)
            .with_size(bytes.len() as u64)
            .with_pages(pages.len(), empty_pages);

        if let Some(info) = info_dictionary(&doc) {
            if let Some(title) = info_text(info, b"Title") {
                metadata = metadata.with_title(title);
            }
            if let Some(author) = info_text(info, b"Author") {
                metadata = metadata.with_author(author);
            }
        }

        Ok(ParsedDocument::new(content, metadata))
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, DomainError> {
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || Self::extract(&bytes))
            .await
            .map_err(|e| DomainError::internal(format!("PDF extraction task failed: {e}")))?
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Read a PDF text string, which is either PDFDocEncoding or UTF-16BE with a BOM
fn info_text(info: &Dictionary, key: &[u8]) -> Option<String> {
    let raw = info.get(key).ok()?.as_str().ok()?;

    let text = match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => raw.iter().map(|&b| b as char).collect(),
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry. `None` produces a page without
    /// a content stream.
    pub fn pdf_with_pages(pages: &[Option<&str>], title: Option<&str>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for page in pages {
            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            };

            if let Some(text) = page {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 12.into()]),
                        Operation::new("Td", vec![72.into(), 720.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                page_dict.set("Contents", content_id);
            }

            kids.push(doc.add_object(page_dict).into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title),
                "Author" => Object::string_literal("Test Author"),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_pages;
    use super::*;

    #[tokio::test]
    async fn test_parse_pages_in_order() {
        let bytes = pdf_with_pages(&[Some("First page"), Some("Second page")], None);
        let parser = PdfParser::new();

        let result = parser.parse(&bytes).await.unwrap();

        let first = result.content.find("First page").unwrap();
        let second = result.content.find("Second page").unwrap();
        assert!(first < second);
        assert!(result.content.ends_with('\n'));
        assert_eq!(result.metadata.pages, Some(2));
        assert!(result.metadata.empty_pages.is_empty());
    }

    #[tokio::test]
    async fn test_page_without_text_is_empty_not_fatal() {
        let bytes = pdf_with_pages(&[Some("Readable"), None, Some("Also readable")], None);
        let parser = PdfParser::new();

        let result = parser.parse(&bytes).await.unwrap();

        assert!(result.content.contains("Readable"));
        assert!(result.content.contains("Also readable"));
        assert_eq!(result.metadata.empty_pages, vec![2]);
        assert!(result.metadata.is_partial());
    }

    #[tokio::test]
    async fn test_title_and_author() {
        let bytes = pdf_with_pages(&[Some("Body")], Some("Quarterly Report"));
        let parser = PdfParser::new();

        let result = parser.parse(&bytes).await.unwrap();

        assert_eq!(result.metadata.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(result.metadata.author.as_deref(), Some("Test Author"));
    }

    #[tokio::test]
    async fn test_garbage_is_corrupt_document() {
        let parser = PdfParser::new();

        let err = parser.parse(b"this is not a pdf at all").await.unwrap_err();
        assert!(matches!(err, DomainError::CorruptDocument { .. }));
    }

    #[test]
    fn test_info_text_decodes_utf16() {
        let mut info = Dictionary::new();
        info.set(
            "Title",
            Object::String(vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9], lopdf::StringFormat::Hexadecimal),
        );

        assert_eq!(info_text(&info, b"Title").as_deref(), Some("Hé"));
        assert_eq!(info_text(&info, b"Author"), None);
    }
}
