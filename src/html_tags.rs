//! Case-insensitive whitelist of HTML tag names that open a raw HTML
//! *block* (§4.4), as opposed to an inline HTML span.
//!
//! A line starting with `<` is only treated as the start of an HTML block
//! if the tag name immediately following is one of these; anything else
//! falls through to the paragraph/inline recognizers instead.

use phf::phf_set;

static BLOCK_TAGS: phf::Set<&'static str> = phf_set! {
    "address", "article", "aside", "base", "blockquote", "body", "caption",
    "center", "col", "colgroup", "dd", "details", "dialog", "dir", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hr", "html", "iframe", "legend", "li", "link", "main",
    "menu", "menuitem", "nav", "noframes", "ol", "optgroup", "option",
    "p", "param", "section", "summary", "table", "tbody", "td", "tfoot",
    "th", "thead", "title", "tr", "track", "ul", "script", "style", "pre",
};

/// Looks up `name` case-insensitively and, if it names a known block tag,
/// returns the whitelist's canonical (lowercase) spelling.
pub fn find_block_tag(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    BLOCK_TAGS.get_key(lower.as_str()).copied()
}

/// True if `name` opens a raw HTML block rather than an inline span.
pub fn is_block_tag(name: &str) -> bool {
    find_block_tag(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_known_tags_match_case_insensitively() {
        assert!(is_block_tag("div"));
        assert!(is_block_tag("DIV"));
        assert!(is_block_tag("Table"));
        assert_eq!(find_block_tag("BLOCKQUOTE"), Some("blockquote"));
    }

    #[test]
    fn smoke_test_unknown_tag_rejected() {
        assert!(!is_block_tag("span"));
        assert!(!is_block_tag("em"));
        assert!(!is_block_tag("notareal"));
    }
}
