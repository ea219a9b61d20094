//! Style sheet: named paragraph, character and table styles.

use schemars::JsonSchema;
use serde::Serialize;

use crate::error::{DocxServerError, Result};
use crate::model::RunFormatting;

/// What a style can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    /// The `w:type` attribute value used in `styles.xml`.
    pub fn as_str(self) -> &'static str {
        match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            _ => None,
        }
    }
}

/// A single style definition.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Style {
    /// Style id referenced from the document body (e.g. `Heading1`).
    pub id: String,
    /// Display name (e.g. `heading 1`).
    pub name: String,
    pub kind: StyleKind,
    /// Parent style id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    /// Run formatting contributed by this style.
    #[serde(skip_serializing_if = "RunFormatting::is_empty")]
    pub formatting: RunFormatting,
    /// Whether this is the default style for its kind.
    pub is_default: bool,
}

impl Style {
    pub fn new(id: &str, name: &str, kind: StyleKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            based_on: None,
            formatting: RunFormatting::default(),
            is_default: false,
        }
    }

    fn based_on(mut self, parent: &str) -> Self {
        self.based_on = Some(parent.to_string());
        self
    }

    fn with_formatting(mut self, formatting: RunFormatting) -> Self {
        self.formatting = formatting;
        self
    }

    fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    fn matches(&self, key: &str) -> bool {
        normalize_key(&self.id) == key || normalize_key(&self.name) == key
    }
}

/// Lookup key for style names: case-insensitive, whitespace ignored.
fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordered collection of styles belonging to one document.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    styles: Vec<Style>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleSheet {
    /// Style sheet used for newly created documents.
    pub fn builtin() -> Self {
        let heading_sizes = [16.0, 13.0, 12.0, 11.0, 11.0, 11.0, 11.0, 11.0, 11.0];

        let mut styles = vec![
            Style::new("Normal", "Normal", StyleKind::Paragraph)
                .with_formatting(RunFormatting {
                    font_size: Some(11.0),
                    ..Default::default()
                })
                .as_default(),
            Style::new("Title", "Title", StyleKind::Paragraph)
                .based_on("Normal")
                .with_formatting(RunFormatting {
                    font_size: Some(28.0),
                    ..Default::default()
                }),
        ];

        for (i, size) in heading_sizes.iter().enumerate() {
            let level = i + 1;
            styles.push(
                Style::new(
                    &format!("Heading{level}"),
                    &format!("heading {level}"),
                    StyleKind::Paragraph,
                )
                .based_on("Normal")
                .with_formatting(RunFormatting {
                    bold: Some(true),
                    font_size: Some(*size),
                    color: (level <= 3).then(|| "2F5496".to_string()),
                    ..Default::default()
                }),
            );
        }

        styles.extend([
            Style::new("BodyText", "Body Text", StyleKind::Paragraph).based_on("Normal"),
            Style::new("Quote", "Quote", StyleKind::Paragraph)
                .based_on("Normal")
                .with_formatting(RunFormatting {
                    italic: Some(true),
                    ..Default::default()
                }),
            Style::new("ListBullet", "List Bullet", StyleKind::Paragraph).based_on("Normal"),
            Style::new("ListNumber", "List Number", StyleKind::Paragraph).based_on("Normal"),
            Style::new("Caption", "caption", StyleKind::Paragraph)
                .based_on("Normal")
                .with_formatting(RunFormatting {
                    italic: Some(true),
                    font_size: Some(9.0),
                    ..Default::default()
                }),
            Style::new(
                "DefaultParagraphFont",
                "Default Paragraph Font",
                StyleKind::Character,
            )
            .as_default(),
            Style::new("TableNormal", "Normal Table", StyleKind::Table).as_default(),
            Style::new("TableGrid", "Table Grid", StyleKind::Table).based_on("TableNormal"),
            Style::new(
                "LightShading-Accent1",
                "Light Shading Accent 1",
                StyleKind::Table,
            )
            .based_on("TableNormal"),
        ]);

        Self { styles }
    }

    /// Build a sheet from styles read out of an existing document.
    pub fn from_styles(styles: Vec<Style>) -> Self {
        Self { styles }
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    /// Look up a style by exact id.
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// Default style for a kind, if the sheet declares one.
    pub fn default_style(&self, kind: StyleKind) -> Option<&Style> {
        self.styles.iter().find(|s| s.kind == kind && s.is_default)
    }

    /// Resolve a caller-supplied style name (id or display name) for use as `kind`.
    pub fn resolve(&self, name: &str, kind: StyleKind) -> Result<&Style> {
        let key = normalize_key(name);
        if key.is_empty() {
            return Err(DocxServerError::InvalidStyle(
                "style name must not be empty".to_string(),
            ));
        }

        // Exact id wins over a display-name match of another style.
        let found = self
            .styles
            .iter()
            .find(|s| s.id == name)
            .or_else(|| self.styles.iter().find(|s| s.matches(&key)));

        match found {
            Some(style) if style.kind == kind => Ok(style),
            Some(style) => Err(DocxServerError::InvalidStyle(format!(
                "'{}' is a {} style, expected a {} style",
                name,
                style.kind.as_str(),
                kind.as_str()
            ))),
            None => Err(DocxServerError::InvalidStyle(format!(
                "'{}' is not defined in this document",
                name
            ))),
        }
    }

    /// Run formatting contributed by a style and its ancestors.
    ///
    /// `None` falls back to the default style of `kind`.
    pub fn formatting_for(&self, style_id: Option<&str>, kind: StyleKind) -> RunFormatting {
        let start = match style_id {
            Some(id) => self.get(id),
            None => self.default_style(kind),
        };

        let mut chain = Vec::new();
        let mut current = start;
        while let Some(style) = current {
            if chain.iter().any(|s: &&Style| s.id == style.id) {
                break;
            }
            chain.push(style);
            current = style.based_on.as_deref().and_then(|id| self.get(id));
        }

        let mut formatting = RunFormatting::default();
        for style in chain.iter().rev() {
            formatting.merge(&style.formatting);
        }
        formatting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_id_and_name() {
        let sheet = StyleSheet::builtin();
        assert_eq!(sheet.resolve("Heading1", StyleKind::Paragraph).unwrap().id, "Heading1");
        assert_eq!(sheet.resolve("Heading 1", StyleKind::Paragraph).unwrap().id, "Heading1");
        assert_eq!(sheet.resolve("body text", StyleKind::Paragraph).unwrap().id, "BodyText");
        assert_eq!(sheet.resolve("Table Grid", StyleKind::Table).unwrap().id, "TableGrid");
    }

    #[test]
    fn test_resolve_rejects_unknown_and_wrong_kind() {
        let sheet = StyleSheet::builtin();
        assert!(matches!(
            sheet.resolve("Fancy", StyleKind::Paragraph),
            Err(DocxServerError::InvalidStyle(_))
        ));
        assert!(matches!(
            sheet.resolve("TableGrid", StyleKind::Paragraph),
            Err(DocxServerError::InvalidStyle(_))
        ));
        assert!(sheet.resolve("  ", StyleKind::Paragraph).is_err());
    }

    #[test]
    fn test_formatting_follows_based_on_chain() {
        let sheet = StyleSheet::builtin();
        let heading = sheet.formatting_for(Some("Heading2"), StyleKind::Paragraph);
        assert_eq!(heading.bold, Some(true));
        assert_eq!(heading.font_size, Some(13.0));

        let normal = sheet.formatting_for(None, StyleKind::Paragraph);
        assert_eq!(normal.font_size, Some(11.0));
        assert_eq!(normal.bold, None);
    }

    #[test]
    fn test_formatting_survives_based_on_cycle() {
        let mut a = Style::new("A", "A", StyleKind::Paragraph).based_on("B");
        a.formatting.bold = Some(true);
        let b = Style::new("B", "B", StyleKind::Paragraph).based_on("A");
        let sheet = StyleSheet::from_styles(vec![a, b]);
        assert_eq!(
            sheet.formatting_for(Some("A"), StyleKind::Paragraph).bold,
            Some(true)
        );
    }
}
