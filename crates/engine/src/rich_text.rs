//! Inline rich text <-> editor markup.
//!
//! Each run is rendered as one `<span>` carrying its formatting as inline
//! CSS, so the editable surface shows per-run styling and a commit can
//! recover the runs from the same markup. Run text is entity-escaped, so a
//! literal `<` or `&` typed by the user never reads back as markup.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::cell::InlineRun;

/// Class attribute placed on every rendered run.
pub const SPAN_CLASS: &str = "gridedit-input-span";

static SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<span\b([^>]*)>(.*?)</span\s*>").expect("span pattern is valid")
});

static STYLE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bstyle\s*=\s*(?:'([^']*)'|"([^"]*)")"#).expect("style pattern is valid")
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("br pattern is valid")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(lt|gt|amp|quot|#39|nbsp);").expect("entity pattern is valid")
});

/// Escape `&`, `<` and `>` so the text reads back verbatim from markup.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Inverse of [`escape_text`], in a single pass so `&amp;lt;` decodes to `&lt;`.
pub fn decode_text(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, |caps: &Captures| {
        let decoded = match &caps[1] {
            "lt" => "<",
            "gt" => ">",
            "amp" => "&",
            "quot" => "\"",
            "#39" => "'",
            _ => " ",
        };
        decoded.to_string()
    })
}

/// Render runs as editor markup. Runs with empty text are skipped.
pub fn render_html(runs: &[InlineRun]) -> String {
    let mut html = String::new();
    for (index, run) in runs.iter().enumerate() {
        if run.text.is_empty() {
            continue;
        }
        html.push_str(&format!(
            "<span class='{}' index='{}' style='{}'>{}</span>",
            SPAN_CLASS,
            index,
            style_of(run),
            escape_text(&run.text).replace("\r\n", "<br>").replace('\n', "<br>"),
        ));
    }
    html
}

fn style_of(run: &InlineRun) -> String {
    let mut style = String::new();
    if run.bold {
        style.push_str("font-weight:bold;");
    }
    if run.italic {
        style.push_str("font-style:italic;");
    }
    match (run.underline, run.strikethrough) {
        (true, true) => style.push_str("text-decoration:underline line-through;"),
        (true, false) => style.push_str("text-decoration:underline;"),
        (false, true) => style.push_str("text-decoration:line-through;"),
        (false, false) => {}
    }
    if let Some(color) = &run.color {
        style.push_str(&format!("color:{};", color));
    }
    if let Some(size) = run.font_size {
        style.push_str(&format!("font-size:{}px;", size));
    }
    if let Some(family) = &run.font_family {
        style.push_str(&format!("font-family:{};", family));
    }
    style
}

/// Recover runs from editor markup.
///
/// Returns None when the markup contains no `<span>`, meaning the content is
/// plain text (or a formula) rather than rich text. Text between spans is
/// kept as unformatted runs.
pub fn parse_html(html: &str) -> Option<Vec<InlineRun>> {
    let mut runs = Vec::new();
    let mut last_end = 0;

    for caps in SPAN.captures_iter(html) {
        let whole = caps.get(0)?;
        push_plain(&mut runs, &html[last_end..whole.start()]);

        let mut run = InlineRun::plain(decode_run_text(&caps[2]));
        if let Some(style) = STYLE_ATTR.captures(&caps[1]) {
            let css = style.get(1).or_else(|| style.get(2)).map_or("", |m| m.as_str());
            apply_style(&mut run, css);
        }
        if !run.text.is_empty() {
            runs.push(run);
        }
        last_end = whole.end();
    }

    if last_end == 0 {
        return None;
    }
    push_plain(&mut runs, &html[last_end..]);
    Some(runs)
}

fn push_plain(runs: &mut Vec<InlineRun>, text: &str) {
    let text = decode_run_text(text);
    if !text.is_empty() {
        runs.push(InlineRun::plain(text));
    }
}

fn decode_run_text(text: &str) -> String {
    decode_text(&LINE_BREAK.replace_all(text, "\n")).into_owned()
}

fn apply_style(run: &mut InlineRun, css: &str) {
    for decl in css.split(';') {
        let Some((key, value)) = decl.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "font-weight" => run.bold = value.eq_ignore_ascii_case("bold") || value == "700",
            "font-style" => run.italic = value.eq_ignore_ascii_case("italic"),
            "text-decoration" | "text-decoration-line" => {
                let lower = value.to_ascii_lowercase();
                run.underline = lower.contains("underline");
                run.strikethrough = lower.contains("line-through");
            }
            "color" if !value.is_empty() => run.color = Some(value.to_string()),
            "font-size" => run.font_size = value.trim_end_matches("px").trim().parse().ok(),
            "font-family" if !value.is_empty() => run.font_family = Some(value.to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled() -> Vec<InlineRun> {
        vec![
            InlineRun { text: "Bold".into(), bold: true, ..Default::default() },
            InlineRun::plain(""),
            InlineRun {
                text: "red\nline".into(),
                italic: true,
                underline: true,
                color: Some("#ff0000".into()),
                font_size: Some(14.0),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_render_skips_empty_runs_and_keeps_index() {
        let html = render_html(&styled());
        assert_eq!(html.matches("<span").count(), 2);
        assert!(html.contains("index='0' style='font-weight:bold;'>Bold</span>"));
        assert!(html.contains("index='2'"));
        assert!(html.contains("red<br>line"));
        assert!(html.contains("font-size:14px;"));
        assert!(html.contains("text-decoration:underline;"));
    }

    #[test]
    fn test_parse_recovers_rendered_runs() {
        let runs = parse_html(&render_html(&styled())).unwrap();
        let expected: Vec<InlineRun> = styled().into_iter().filter(|r| !r.text.is_empty()).collect();
        assert_eq!(runs, expected);
    }

    #[test]
    fn test_parse_plain_text_is_none() {
        assert!(parse_html("hello").is_none());
        assert!(parse_html("=A1+1").is_none());
        assert!(parse_html("a<br>b").is_none());
    }

    #[test]
    fn test_parse_keeps_text_between_spans() {
        let runs = parse_html("pre<span style=\"color:blue\">mid</span>post").unwrap();
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["pre", "mid", "post"]);
        assert_eq!(runs[1].color.as_deref(), Some("blue"));
        assert!(runs[0].color.is_none());
    }

    #[test]
    fn test_markup_in_run_text_survives() {
        let runs = vec![
            InlineRun { text: "a</span>b".into(), bold: true, ..Default::default() },
            InlineRun::plain("x < y & <br> z"),
        ];
        let html = render_html(&runs);
        assert_eq!(html.matches("</span>").count(), 2);
        assert!(html.contains("a&lt;/span&gt;b"));
        assert_eq!(parse_html(&html).unwrap(), runs);
    }

    #[test]
    fn test_entities_between_spans_are_decoded() {
        let runs = parse_html("1 &lt; 2&nbsp;<span>&amp;amp;</span>").unwrap();
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["1 < 2 ", "&amp;"]);
    }

    #[test]
    fn test_escape_text_borrows_clean_input() {
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_text("<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(decode_text(&escape_text("&lt; <")), "&lt; <");
    }

    #[test]
    fn test_parse_span_without_style() {
        let runs = parse_html("<span>x</span>").unwrap();
        assert_eq!(runs, vec![InlineRun::plain("x")]);
    }
}
