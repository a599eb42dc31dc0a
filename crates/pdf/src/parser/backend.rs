use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::Encoding;

use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Backend-neutral values
// ---------------------------------------------------------------------------

/// A font referenced from a page's `/Resources /Font` dictionary.
#[derive(Debug)]
pub struct PageFont<'a> {
    /// Resource key used by `Tf` (e.g. `b"F1"`).
    pub key: Vec<u8>,
    /// `/BaseFont` name, subset prefix included (e.g. `ABCDEF+Arial-BoldMT`).
    pub base_font: Option<String>,
    /// Code-to-Unicode mapping resolved from `/ToUnicode` or `/Encoding`.
    /// `None` when lopdf cannot resolve one.
    pub encoding: Option<Encoding<'a>>,
}

impl PageFont<'_> {
    /// The name reported on spans: the base font when known, otherwise the
    /// resource key.
    pub fn display_name(&self) -> String {
        match &self.base_font {
            Some(name) => name.clone(),
            None => String::from_utf8_lossy(&self.key).into_owned(),
        }
    }
}

/// An operand of a content-stream operator, detached from `lopdf::Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<Operand>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }

    /// Numeric operand at `index`, if present and numeric.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(Operand::as_number)
    }
}

/// Convert a `lopdf::Object` operand. Only the shapes text operators care
/// about are kept; everything else collapses to [`Operand::Other`].
pub fn convert_operand(obj: &lopdf::Object) -> Operand {
    match obj {
        lopdf::Object::Integer(i) => Operand::Number(*i as f32),
        lopdf::Object::Real(f) => Operand::Number(*f),
        lopdf::Object::Name(n) => Operand::Name(n.clone()),
        lopdf::Object::String(s, _) => Operand::Str(s.clone()),
        lopdf::Object::Array(arr) => Operand::Array(arr.iter().map(convert_operand).collect()),
        _ => Operand::Other,
    }
}

/// Best-effort decoding of PDF string bytes when no font encoding applies.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 byte-for-codepoint.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16be(payload);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Decode big-endian UTF-16 code units; a trailing odd byte is dropped.
fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// The document operations span extraction needs.
///
/// Implemented by [`LopdfBackend`]; tests drive the extractor with a mock.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`], in page-tree order.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Fonts declared in the page's resources, encodings resolved.
    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont<'_>>, PdfError>;

    /// Decoded content-stream operations of a page.
    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the bytes of a text-showing operand drawn with `font`.
    fn decode_text(&self, font: Option<&PageFont<'_>>, bytes: &[u8]) -> String;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PdfBackend`] backed by an in-memory [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from bytes. Encrypted documents are rejected.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// String entries of the trailer's `/Info` dictionary, keyed by name.
    pub fn info(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();

        let dict = match self.doc.trailer.get(b"Info") {
            Ok(lopdf::Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(lopdf::Object::Dictionary(d)) => d,
                _ => return entries,
            },
            Ok(lopdf::Object::Dictionary(d)) => d,
            _ => return entries,
        };

        for (key, value) in dict.iter() {
            if let lopdf::Object::String(bytes, _) = value {
                let text =
                    lopdf::decode_text_string(value).unwrap_or_else(|_| decode_text_simple(bytes));
                entries.insert(String::from_utf8_lossy(key).into_owned(), text);
            }
        }

        entries
    }
}

/// A name-valued dictionary entry as a `String`.
fn dict_name(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont<'_>>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts
            .into_iter()
            .map(|(key, dict)| {
                let encoding = match dict.get_font_encoding(&self.doc) {
                    Ok(encoding) => Some(encoding),
                    Err(e) => {
                        log::debug!(
                            "No encoding for font /{}: {}",
                            String::from_utf8_lossy(&key),
                            e
                        );
                        None
                    }
                };
                PageFont {
                    base_font: dict_name(dict, b"BaseFont"),
                    encoding,
                    key,
                }
            })
            .collect())
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;

        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_operand).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, font: Option<&PageFont<'_>>, bytes: &[u8]) -> String {
        if let Some(encoding) = font.and_then(|f| f.encoding.as_ref()) {
            match lopdf::Document::decode_text(encoding, bytes) {
                Ok(text) => return text,
                Err(e) => log::debug!("Falling back to heuristic text decoding: {}", e),
            }
        }

        decode_text_simple(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
