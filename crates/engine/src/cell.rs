use serde::{Deserialize, Serialize};

use crate::rich_text;

/// Number format type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    #[default]
    General,
    Number { decimals: u8 },
    Currency { decimals: u8 },
    Percent { decimals: u8 },
}

/// Stored (raw) value of a cell, the `v` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Classify non-formula input: numbers become `Number`, everything else
    /// is kept verbatim as `Text`.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            if num.is_finite() {
                return CellValue::Number(num);
            }
        }

        CellValue::Text(input.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// Format a number according to the specified format
    pub fn format_number(n: f64, format: &NumberFormat) -> String {
        match format {
            NumberFormat::General => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", n as i64)
                } else {
                    format!("{}", n)
                }
            }
            NumberFormat::Number { decimals } => {
                format!("{:.*}", *decimals as usize, n)
            }
            NumberFormat::Currency { decimals } => {
                if n < 0.0 {
                    format!("-${:.*}", *decimals as usize, n.abs())
                } else {
                    format!("${:.*}", *decimals as usize, n)
                }
            }
            NumberFormat::Percent { decimals } => {
                format!("{:.*}%", *decimals as usize, n * 100.0)
            }
        }
    }

    /// Display value with the number format applied
    pub fn formatted_display(&self, format: &NumberFormat) -> String {
        match self {
            CellValue::Number(n) => Self::format_number(*n, format),
            other => other.raw_display(),
        }
    }
}

/// One run of inline rich text with its own formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InlineRun {
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A stored cell.
///
/// Field names on the wire follow the usual sheet-data shorthand:
/// `v` raw value, `m` display text, `f` formula source, `rt` inline runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Cell {
    #[serde(rename = "v", skip_serializing_if = "CellValue::is_empty")]
    pub value: CellValue,
    #[serde(rename = "m", skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(rename = "f", skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(rename = "rt", skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<InlineRun>>,
    #[serde(skip_serializing_if = "is_general")]
    pub format: NumberFormat,
}

fn is_general(format: &NumberFormat) -> bool {
    *format == NumberFormat::General
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: CellValue) -> Self {
        let mut cell = Self { value, ..Default::default() };
        cell.refresh_display();
        cell
    }

    /// Formula cell with a cached computed value.
    pub fn with_formula(source: &str, computed: CellValue) -> Self {
        let mut cell = Self::with_value(computed);
        cell.formula = Some(source.to_string());
        cell
    }

    pub fn with_rich_text(runs: Vec<InlineRun>) -> Self {
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        Self {
            value: CellValue::Text(text),
            rich_text: Some(runs),
            ..Default::default()
        }
    }

    /// True if this cell holds inline rich text (at least one run).
    pub fn is_rich_text(&self) -> bool {
        self.rich_text.as_ref().is_some_and(|runs| !runs.is_empty())
    }

    /// Formula source, if present and non-empty.
    pub fn formula_source(&self) -> Option<&str> {
        self.formula.as_deref().filter(|f| !f.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
            && self.display.as_deref().map_or(true, str::is_empty)
            && self.formula_source().is_none()
            && !self.is_rich_text()
    }

    /// Replace this cell's content from edit input.
    ///
    /// The input is classified here: a leading `=` (after whitespace) makes a
    /// formula whose value is left for the evaluator, span markup becomes
    /// inline rich text, and anything else is a plain value with its entities
    /// decoded. The number format is preserved.
    pub fn set(&mut self, input: &str) {
        self.formula = None;
        self.rich_text = None;
        self.display = None;

        let trimmed = input.trim_start();
        if trimmed.starts_with('=') {
            self.value = CellValue::Empty;
            self.formula = Some(trimmed.trim_end().to_string());
            return;
        }

        if let Some(runs) = rich_text::parse_html(input) {
            *self = Cell { format: self.format, ..Cell::with_rich_text(runs) };
            return;
        }

        self.value = CellValue::from_input(&rich_text::decode_text(input));
        self.refresh_display();
    }

    /// Recompute `m` from `v` and the number format.
    pub fn refresh_display(&mut self) {
        self.display = match &self.value {
            CellValue::Empty => None,
            value => Some(value.formatted_display(&self.format)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_classification() {
        assert_eq!(CellValue::from_input(""), CellValue::Empty);
        assert_eq!(CellValue::from_input("  "), CellValue::Empty);
        assert_eq!(CellValue::from_input("7"), CellValue::Number(7.0));
        assert_eq!(CellValue::from_input(" 2.5 "), CellValue::Number(2.5));
        assert_eq!(CellValue::from_input("hello"), CellValue::Text("hello".into()));
        // Non-finite parses stay text
        assert_eq!(CellValue::from_input("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_set_plain_number_refreshes_display() {
        let mut cell = Cell::new();
        cell.format = NumberFormat::Currency { decimals: 2 };
        cell.set("7");
        assert_eq!(cell.value, CellValue::Number(7.0));
        assert_eq!(cell.display.as_deref(), Some("$7.00"));
        assert!(cell.formula.is_none());
    }

    #[test]
    fn test_set_formula_clears_value() {
        let mut cell = Cell::with_value(CellValue::Number(5.0));
        cell.set("=SUM(1,4)");
        assert_eq!(cell.formula_source(), Some("=SUM(1,4)"));
        assert!(cell.value.is_empty());
        assert!(cell.display.is_none());
    }

    #[test]
    fn test_set_span_markup_becomes_rich_text() {
        let mut cell = Cell::new();
        cell.set("<span style='font-weight:bold;'>Hi</span><span style=''> there</span>");
        assert!(cell.is_rich_text());
        let runs = cell.rich_text.as_ref().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].bold);
        assert_eq!(cell.value, CellValue::Text("Hi there".into()));
    }

    #[test]
    fn test_set_formula_is_never_markup() {
        let mut cell = Cell::new();
        cell.set("  =\"<span>x</span>\"&\"&lt;\"");
        assert!(!cell.is_rich_text());
        assert_eq!(cell.formula_source(), Some("=\"<span>x</span>\"&\"&lt;\""));
    }

    #[test]
    fn test_set_plain_decodes_entities() {
        let mut cell = Cell::new();
        cell.set("&lt;span&gt;x&lt;/span&gt; &amp; &lt;b&gt;");
        assert!(!cell.is_rich_text());
        assert_eq!(cell.value, CellValue::Text("<span>x</span> & <b>".into()));
    }

    #[test]
    fn test_set_plain_over_rich_drops_runs() {
        let mut cell = Cell::with_rich_text(vec![InlineRun::plain("x")]);
        cell.set("plain");
        assert!(!cell.is_rich_text());
        assert_eq!(cell.value, CellValue::Text("plain".into()));
    }

    #[test]
    fn test_empty_formula_is_not_a_formula() {
        let cell = Cell { formula: Some(String::new()), ..Default::default() };
        assert!(cell.formula_source().is_none());
        assert!(cell.is_empty());
    }

    #[test]
    fn test_format_number_variants() {
        assert_eq!(CellValue::format_number(3.0, &NumberFormat::General), "3");
        assert_eq!(CellValue::format_number(1.5, &NumberFormat::Number { decimals: 3 }), "1.500");
        assert_eq!(CellValue::format_number(-2.0, &NumberFormat::Currency { decimals: 2 }), "-$2.00");
        assert_eq!(CellValue::format_number(0.25, &NumberFormat::Percent { decimals: 0 }), "25%");
    }

    #[test]
    fn test_cell_json_uses_short_keys() {
        let cell = Cell::with_formula("=SUM(1,4)", CellValue::Number(5.0));
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(json["v"], serde_json::json!(5.0));
        assert_eq!(json["m"], serde_json::json!("5"));
        assert_eq!(json["f"], serde_json::json!("=SUM(1,4)"));

        let back: Cell = serde_json::from_value(json).unwrap();
        assert_eq!(back, cell);
    }
}
