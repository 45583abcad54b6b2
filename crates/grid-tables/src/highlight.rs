use regex::{Regex, RegexBuilder};

pub const HIGHLIGHT_CLASS: &str = "textHighlighted";

/// Wraps the search term in rendered cells. Cells are already HTML-escaped,
/// so the term is escaped the same way before matching.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// `None` for an empty term.
    pub fn new(search: &str) -> Option<Self> {
        if search.is_empty() {
            return None;
        }
        let escaped = html_escape::encode_safe(search);
        RegexBuilder::new(&regex::escape(&escaped))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|pattern| Self { pattern })
    }

    /// Every occurrence of the first match's exact casing is wrapped; other
    /// casings are left as they are.
    pub fn apply(&self, haystack: &str) -> String {
        match self.pattern.find(haystack) {
            Some(found) => {
                let needle = found.as_str();
                haystack.replace(
                    needle,
                    &format!(r#"<span class="{HIGHLIGHT_CLASS}">{needle}</span>"#),
                )
            }
            None => haystack.to_string(),
        }
    }
}
