//! Neutralizes executable markup before cell content reaches an editable
//! surface. Cell text can come from imported files, so this runs on every
//! snapshot the editor is seeded with.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Start of an opening or closing script tag, any case, plus its attributes
/// and closing bracket when present.
static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(\s*/?\s*script\b[^<>]*)(>?)").expect("script tag pattern is valid")
});

/// Escape `<script ...>` / `</script>` tags to `&lt;...&gt;`.
///
/// Only the `<` that opens a tag is what makes it live, and the text after it
/// is never rewritten into a new `<`, so the escaped output has no tag left
/// for a second pass to find. Returns `Cow::Borrowed` when nothing matched.
pub fn escape_script_tag(input: &str) -> Cow<'_, str> {
    let escaped = SCRIPT_TAG.replace_all(input, |caps: &Captures| {
        let close = if caps[2].is_empty() { "" } else { "&gt;" };
        format!("&lt;{}{}", &caps[1], close)
    });
    if let Cow::Owned(_) = escaped {
        log::debug!("neutralized script markup in cell content");
    }
    escaped
}

/// True if the text still carries a script tag.
pub fn contains_script_tag(input: &str) -> bool {
    SCRIPT_TAG.is_match(input)
}
