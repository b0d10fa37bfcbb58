//! Two-pass Markdown parser and HTML renderer, Sundown/Hoedown lineage.
//!
//! The pipeline: [`refs::scan`] (pass 1, reference/footnote extraction)
//! feeds a tab-expanded intermediate document to [`block::parse_block`]
//! (pass 2), which recognises block structure and calls
//! [`inline::parse_inline`] for each block's text, which in turn drives
//! whatever [`render::Render`] implementor the caller supplies. Call
//! [`render`] to run the whole pipeline; `render::html::Html` is the
//! bundled reference implementor.

pub mod autolink;
pub mod block;
pub mod buffer;
pub mod driver;
pub mod error;
pub mod flags;
pub mod html_tags;
pub mod inline;
pub mod refs;
pub mod render;

pub use buffer::Buffer;
pub use driver::{render, ParserState, DEFAULT_MAX_NESTING};
pub use error::{RenderError, Result};
pub use flags::{AutolinkKind, Extension, ListFlags, RenderOptions, TableAlignment, TableFlags};
pub use render::{html::Html, Render};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_end_to_end_render() {
        let mut out = Buffer::new(256);
        let mut html = Html::new(RenderOptions::empty());
        let doc = b"# Title\n\nSome *text* with a [link][1].\n\n[1]: http://example.com \"t\"\n";
        render(&mut out, doc, &mut html, Extension::empty(), DEFAULT_MAX_NESTING).unwrap();
        let text = out.as_str_lossy();
        assert!(text.contains("<h1>Title</h1>"));
        assert!(text.contains("<em>text</em>"));
        assert!(text.contains(r#"<a href="http://example.com" title="t">link</a>"#));
    }

    #[test]
    fn smoke_test_extensions_gate_tables_and_strikethrough() {
        let mut out = Buffer::new(256);
        let mut html = Html::new(RenderOptions::empty());
        let doc = b"a | b\n--|--\n1 | 2\n";
        render(&mut out, doc, &mut html, Extension::empty(), DEFAULT_MAX_NESTING).unwrap();
        assert!(!out.as_str_lossy().contains("<table>"));

        let mut out2 = Buffer::new(256);
        let mut html2 = Html::new(RenderOptions::empty());
        render(&mut out2, doc, &mut html2, Extension::TABLES, DEFAULT_MAX_NESTING).unwrap();
        assert!(out2.as_str_lossy().contains("<table>"));
    }
}
