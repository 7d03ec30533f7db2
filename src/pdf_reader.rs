use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::{PageFragments, TextFragment};
use crate::options::PageSelection;

const GLYPH_WIDTH_RATIO: f32 = 0.5;
const FALLBACK_PAGE_TOP: f32 = 792.0;
const MAX_PARENT_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands.iter().map(as_number).collect::<Option<Vec<_>>>()?;
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(rest);
        if !had_errors {
            return utf16.into_owned();
        }
    }

    let decoded = Document::decode_text(encoding, bytes);
    let looks_broken = decoded.contains('\u{FFFD}') || decoded.contains("Unimplemented");
    if !looks_broken {
        return decoded;
    }

    let wide_hint = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        lower.contains("identity-h") || lower.contains("ucs2") || lower.contains("utf16")
    });
    if wide_hint && bytes.len() % 2 == 0 {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn page_top(document: &Document, page_id: ObjectId) -> f32 {
    let mut current = Some(page_id);
    for _ in 0..MAX_PARENT_DEPTH {
        let Some(id) = current else {
            break;
        };
        let Ok(dictionary) = document.get_dictionary(id) else {
            break;
        };
        let media_box = dictionary
            .get(b"MediaBox")
            .ok()
            .and_then(|object| resolve(document, object))
            .and_then(|object| object.as_array().ok());
        if let Some(values) = media_box {
            if let Some(top) = values.get(3).and_then(as_number) {
                return top;
            }
        }
        current = dictionary
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok());
    }
    FALLBACK_PAGE_TOP
}

#[derive(Debug)]
struct TextState<'a> {
    ctm: Matrix,
    saved: Vec<Matrix>,
    line_matrix: Matrix,
    text_matrix: Matrix,
    leading: f32,
    font_size: f32,
    encoding: Option<&'a str>,
}

impl TextState<'_> {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn origin(&self) -> (f32, f32) {
        self.text_matrix.then(self.ctm).apply(0.0, 0.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn advance(&mut self, glyphs: usize, adjustment: f32) {
        let width = glyphs as f32 * self.font_size * GLYPH_WIDTH_RATIO
            - adjustment / 1000.0 * self.font_size;
        self.text_matrix = Matrix::translation(width, 0.0).then(self.text_matrix);
    }

    fn show(&mut self, operand: &Object) -> String {
        let mut text = String::new();
        match operand {
            Object::String(bytes, _) => {
                let decoded = decode_pdf_bytes(self.encoding, bytes);
                self.advance(decoded.chars().count(), 0.0);
                text.push_str(&decoded);
            }
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => {
                            let decoded = decode_pdf_bytes(self.encoding, bytes);
                            self.advance(decoded.chars().count(), 0.0);
                            text.push_str(&decoded);
                        }
                        other => {
                            if let Some(adjustment) = as_number(other) {
                                if adjustment < -100.0 {
                                    text.push(' ');
                                }
                                self.advance(0, adjustment);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        text
    }
}

fn page_fragments(document: &Document, page_id: ObjectId) -> Vec<TextFragment> {
    let Ok(raw_content) = document.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&raw_content) else {
        return Vec::new();
    };
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();
    let top = page_top(document, page_id);

    let mut state = TextState {
        ctm: Matrix::IDENTITY,
        saved: Vec::new(),
        line_matrix: Matrix::IDENTITY,
        text_matrix: Matrix::IDENTITY,
        leading: 0.0,
        font_size: 12.0,
        encoding: None,
    };
    let mut fragments = Vec::new();

    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        let shown = match operation.operator.as_str() {
            "q" => {
                state.saved.push(state.ctm);
                None
            }
            "Q" => {
                state.ctm = state.saved.pop().unwrap_or(Matrix::IDENTITY);
                None
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.ctm = matrix.then(state.ctm);
                }
                None
            }
            "BT" => {
                state.line_matrix = Matrix::IDENTITY;
                state.text_matrix = Matrix::IDENTITY;
                None
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    state.encoding = encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(as_number) {
                    state.font_size = size;
                }
                None
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(as_number) {
                    state.leading = leading;
                }
                None
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(as_number),
                    operands.get(1).and_then(as_number),
                ) {
                    if operation.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
                None
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.line_matrix = matrix;
                    state.text_matrix = matrix;
                }
                None
            }
            "T*" => {
                state.next_line();
                None
            }
            "Tj" | "TJ" => operands.first().map(|operand| {
                let origin = state.origin();
                (origin, state.show(operand))
            }),
            "'" => {
                state.next_line();
                operands.first().map(|operand| {
                    let origin = state.origin();
                    (origin, state.show(operand))
                })
            }
            "\"" => {
                state.next_line();
                operands.get(2).map(|operand| {
                    let origin = state.origin();
                    (origin, state.show(operand))
                })
            }
            _ => None,
        };

        if let Some(((x, y), text)) = shown {
            let text = text.trim();
            if !text.is_empty() {
                fragments.push(TextFragment::new(text, x, top - y));
            }
        }
    }

    fragments
}

fn read_document_fragments(
    document: &Document,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageFragments>, ExtractError> {
    let mut pages = Vec::new();
    for (page_no, page_id) in document.get_pages() {
        if page_selection.is_some_and(|selection| !selection.contains(page_no)) {
            continue;
        }

        let fragments = page_fragments(document, page_id);
        debug!(
            page = page_no,
            fragments = fragments.len(),
            "extracted positioned text"
        );
        pages.push(PageFragments {
            page_number: page_no,
            fragments,
        });
    }

    if pages.is_empty() && page_selection.is_some() {
        return Err(ExtractError::NoPagesSelected);
    }

    Ok(pages)
}

pub(crate) fn read_pdf_fragments(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageFragments>, ExtractError> {
    let document = Document::load(input_pdf)?;
    read_document_fragments(&document, page_selection)
}

pub(crate) fn read_pdf_fragments_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageFragments>, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    read_document_fragments(&document, page_selection)
}
