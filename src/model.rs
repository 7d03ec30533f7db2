use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One run of text with the position of its first glyph.
///
/// `y` grows downward: the PDF reader flips coordinates against the page top
/// so ascending `y` is top-to-bottom reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl TextFragment {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageFragments {
    pub page_number: u32,
    pub fragments: Vec<TextFragment>,
}

pub type TableRow = IndexMap<String, String>;

/// A recovered table. Every row's keys are drawn from `headers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
    pub page_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    KeyValue,
    Grid,
}
