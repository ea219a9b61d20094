//! Paragraphs, runs and run formatting.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DocxServerError, Result};

/// Largest font size OOXML can express (`w:sz` is in half-points, max 3276).
pub const MAX_FONT_SIZE: f32 = 1638.0;

/// Check that `text` can be stored in an XML 1.0 document.
///
/// Carriage returns are folded into line feeds ("\r\n" and a lone "\r" both
/// become "\n"). Any other C0 control except tab, and the noncharacters
/// U+FFFE and U+FFFF, are rejected.
pub fn clean_text(text: &str) -> Result<String> {
    if let Some(bad) = text.chars().find(|&c| !is_xml_char(c)) {
        return Err(DocxServerError::validation(format!(
            "text contains U+{:04X}, which cannot be stored in a document",
            u32::from(bad)
        )));
    }
    if text.contains('\r') {
        Ok(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Ok(text.to_string())
    }
}

fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{FFFE}' | '\u{FFFF}' => false,
        c => c >= ' ',
    }
}

/// Color accepted as hex text or as an `[r, g, b]` triple.
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum ColorInput {
    Hex(String),
    Rgb([u8; 3]),
}

fn deserialize_color<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<ColorInput>::deserialize(deserializer)?.map(|color| match color {
            ColorInput::Hex(hex) => hex,
            ColorInput::Rgb([r, g, b]) => format!("{r:02X}{g:02X}{b:02X}"),
        }),
    )
}

/// Character formatting of a run.
///
/// Every field is optional: `None` means "inherit from the style". Applying a
/// `RunFormatting` onto another only overwrites the fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RunFormatting {
    /// Bold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Single underline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Font size in points (multiples of 0.5).
    #[serde(
        default,
        alias = "font_size_pt",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f32>,
    /// Font color as hex RGB, e.g. "FF0000" or "#ff0000", or `[255, 0, 0]`.
    #[serde(
        default,
        alias = "font_color_rgb",
        deserialize_with = "deserialize_color",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<ColorInput>")]
    pub color: Option<String>,
    /// Font family name, e.g. "Calibri".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
}

impl RunFormatting {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields set in `overrides`, keeping all others.
    pub fn merge(&mut self, overrides: &RunFormatting) {
        if overrides.bold.is_some() {
            self.bold = overrides.bold;
        }
        if overrides.italic.is_some() {
            self.italic = overrides.italic;
        }
        if overrides.underline.is_some() {
            self.underline = overrides.underline;
        }
        if overrides.font_size.is_some() {
            self.font_size = overrides.font_size;
        }
        if overrides.color.is_some() {
            self.color = overrides.color.clone();
        }
        if overrides.font_name.is_some() {
            self.font_name = overrides.font_name.clone();
        }
    }

    /// Validate ranges and normalize the color to uppercase `RRGGBB`.
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(size) = self.font_size {
            if !(size > 0.0 && size <= MAX_FONT_SIZE) {
                return Err(DocxServerError::validation(format!(
                    "font_size must be between 0.5 and {MAX_FONT_SIZE} points, got {size}"
                )));
            }
            if (size * 2.0).fract() != 0.0 {
                return Err(DocxServerError::validation(format!(
                    "font_size must be a multiple of 0.5 points, got {size}"
                )));
            }
        }

        if let Some(color) = self.color.take() {
            let hex = color.trim().trim_start_matches('#');
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(DocxServerError::validation(format!(
                    "color must be a 6-digit hex RGB value, got '{color}'"
                )));
            }
            self.color = Some(hex.to_ascii_uppercase());
        }

        if let Some(name) = &self.font_name {
            if name.trim().is_empty() {
                return Err(DocxServerError::validation("font_name must not be blank"));
            }
            if name.chars().any(char::is_control) || name.contains(['\u{FFFE}', '\u{FFFF}']) {
                return Err(DocxServerError::validation(
                    "font_name must not contain control characters",
                ));
            }
        }

        Ok(self)
    }
}

/// A span of text sharing one formatting set. The text is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    text: String,
    formatting: RunFormatting,
}

impl Run {
    pub fn new(text: impl Into<String>, formatting: RunFormatting) -> Result<Self> {
        let text = clean_text(&text.into())?;
        if text.is_empty() {
            return Err(DocxServerError::validation("run text must not be empty"));
        }
        Ok(Self {
            text,
            formatting: formatting.normalized()?,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn formatting(&self) -> &RunFormatting {
        &self.formatting
    }

    pub(crate) fn formatting_mut(&mut self) -> &mut RunFormatting {
        &mut self.formatting
    }
}

/// A paragraph: a style reference plus an ordered sequence of runs.
///
/// Manual page breaks sit between runs. Each entry of `page_breaks` is the
/// index of the run the break precedes; `runs.len()` means after the last run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Paragraph style id; `None` uses the document default.
    pub style: Option<String>,
    runs: Vec<Run>,
    page_breaks: Vec<usize>,
}

impl Paragraph {
    pub fn new(style: Option<String>) -> Self {
        Self {
            style,
            runs: Vec::new(),
            page_breaks: Vec::new(),
        }
    }

    /// Paragraph holding `text` as a single unformatted run (no run if empty).
    pub fn with_text(text: &str, style: Option<String>) -> Result<Self> {
        let mut paragraph = Self::new(style);
        if !text.is_empty() {
            paragraph.runs.push(Run::new(text, RunFormatting::default())?);
        }
        Ok(paragraph)
    }

    /// Empty paragraph holding one manual page break.
    pub fn page_break() -> Self {
        let mut paragraph = Self::new(None);
        paragraph.push_page_break();
        paragraph
    }

    /// Break positions, ascending, as run indices.
    pub fn page_breaks(&self) -> &[usize] {
        &self.page_breaks
    }

    /// Add a page break after the current last run.
    pub fn push_page_break(&mut self) {
        self.page_breaks.push(self.runs.len());
    }

    /// True for a paragraph that only carries page breaks.
    pub fn is_page_break(&self) -> bool {
        !self.page_breaks.is_empty() && self.runs.is_empty()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub(crate) fn runs_mut(&mut self) -> &mut Vec<Run> {
        &mut self.runs
    }

    pub fn push_run(&mut self, run: Run) -> usize {
        self.runs.push(run);
        self.runs.len() - 1
    }

    /// Visible text: the concatenation of all run texts.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}
