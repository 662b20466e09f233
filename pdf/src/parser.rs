use docqa_rag::{Document, Page};
use lopdf::Object;

use crate::error::{PdfError, Result};

pub(crate) fn parse_bytes(bytes: &[u8], id: &str) -> Result<Document> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    parse_document(&doc, id)
}

pub(crate) fn parse_document(doc: &lopdf::Document, id: &str) -> Result<Document> {
    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(PdfError::NoPages);
    }
    page_numbers.sort_unstable();

    let pages = page_numbers
        .iter()
        .enumerate()
        .map(|(idx, &number)| {
            let raw = doc.extract_text(&[number]).unwrap_or_else(|error| {
                tracing::warn!(page = number, %error, "No extractable text on page");
                String::new()
            });
            Page::new(idx + 1, normalize_text(&raw))
        })
        .collect();

    let document = Document::new(id, pages);
    Ok(match extract_title(doc) {
        Some(title) => document.with_title(title),
        None => document,
    })
}

/// Trims every line and drops the empty ones.
pub(crate) fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_title(doc: &lopdf::Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let title = decode_text_string(info.get(b"Title").ok()?.as_str().ok()?);
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Decodes a PDF text string: UTF-16BE with a byte-order mark, otherwise single-byte.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_lines_and_drops_blanks() {
        let raw = "  Total B2C orders: 1.2 billion  \n\n   \nPage footer\n";
        assert_eq!(normalize_text(raw), "Total B2C orders: 1.2 billion\nPage footer");
    }

    #[test]
    fn normalization_of_blank_page_is_empty() {
        assert_eq!(normalize_text(" \n\t\n"), "");
    }

    #[test]
    fn utf16_titles_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, b'A', 0x00, b'R'];
        assert_eq!(decode_text_string(&bytes), "AR");
        assert_eq!(decode_text_string(b"Annual Report"), "Annual Report");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_bytes(b"not a pdf", "broken").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }
}
