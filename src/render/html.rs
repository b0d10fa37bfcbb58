//! The reference HTML renderer (§4.8): a thin, concrete [`Render`]
//! implementor configured by [`RenderOptions`].

use super::Render;
use crate::autolink;
use crate::buffer::Buffer;
use crate::flags::{AutolinkKind, ListFlags, RenderOptions, TableAlignment, TableFlags};
use log::trace;
use std::fmt::Write;

/// The bundled HTML renderer.
#[derive(Debug, Default)]
pub struct Html {
    options: RenderOptions,
    toc: Buffer,
    section_depth: u32,
}

impl Html {
    pub fn new(options: RenderOptions) -> Self {
        Html {
            options,
            toc: Buffer::new(256),
            section_depth: 0,
        }
    }

    fn escape(&self, output: &mut Buffer, text: &[u8]) {
        let escaped = htmlescape::encode_minimal(&String::from_utf8_lossy(text));
        let _ = output.put_str(&escaped);
    }

    fn escape_attribute(&self, output: &mut Buffer, text: &[u8]) {
        let escaped = htmlescape::encode_attribute(&String::from_utf8_lossy(text));
        let _ = output.put_str(&escaped);
    }

    fn close_tag(&self) -> &'static str {
        if self.options.contains(RenderOptions::USE_XHTML) {
            " />"
        } else {
            ">"
        }
    }

    fn url_is_allowed(&self, url: &[u8]) -> bool {
        if !self.options.contains(RenderOptions::SAFELINK) {
            return true;
        }
        autolink::is_safe(&String::from_utf8_lossy(url))
    }
}

impl Render for Html {
    fn blockcode(&mut self, output: &mut Buffer, text: &[u8], lang: &[u8]) {
        trace!("html: blockcode, {} bytes, lang={:?}", text.len(), String::from_utf8_lossy(lang));
        let _ = output.put(b"<pre><code");
        if !lang.is_empty() {
            let _ = output.put(b" class=\"");
            self.escape_attribute(output, lang);
            let _ = output.put(b"\"");
        }
        let _ = output.put(b">");
        self.escape(output, text);
        let _ = output.put(b"</code></pre>\n");
    }

    fn blockquote(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(b"<blockquote>\n");
        let _ = output.put(text);
        let _ = output.put(b"</blockquote>\n");
    }

    fn blockhtml(&mut self, output: &mut Buffer, text: &[u8]) {
        if self.options.contains(RenderOptions::SKIP_HTML) && !self.options.contains(RenderOptions::ESCAPE) {
            return;
        }
        if self.options.contains(RenderOptions::ESCAPE) {
            self.escape(output, text);
        } else {
            let _ = output.put(text);
        }
    }

    fn header(&mut self, output: &mut Buffer, text: &[u8], level: u32) {
        if self.options.contains(RenderOptions::OUTLINE) {
            while self.section_depth >= level {
                let _ = output.put(b"</section>\n");
                self.section_depth = self.section_depth.saturating_sub(1);
            }
            let _ = output.put(b"<section>\n");
            self.section_depth = level;
        }
        let _ = write!(output, "<h{}>", level);
        let _ = output.put(text);
        let _ = write!(output, "</h{}>\n", level);
        if self.options.contains(RenderOptions::TOC) {
            let _ = write!(self.toc, "<li><a href=\"#toc_{}\">", self.toc.len());
            let _ = self.toc.put(text);
            let _ = self.toc.put_str("</a></li>\n");
        }
    }

    fn hrule(&mut self, output: &mut Buffer) {
        let _ = output.put_str(&format!("<hr{}\n", self.close_tag()));
    }

    fn list(&mut self, output: &mut Buffer, text: &[u8], flags: ListFlags) {
        let tag: &[u8] = if flags.contains(ListFlags::ORDERED) { b"ol" } else { b"ul" };
        let _ = output.put(b"<");
        let _ = output.put(tag);
        let _ = output.put(b">\n");
        let _ = output.put(text);
        let _ = output.put(b"</");
        let _ = output.put(tag);
        let _ = output.put(b">\n");
    }

    fn listitem(&mut self, output: &mut Buffer, text: &[u8], _flags: ListFlags) {
        let _ = output.put(b"<li>");
        let trimmed = text.strip_suffix(b"\n").unwrap_or(text);
        let _ = output.put(trimmed);
        let _ = output.put(b"</li>\n");
    }

    fn paragraph(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(b"<p>");
        let text = text.strip_suffix(b"\n").unwrap_or(text);
        if self.options.contains(RenderOptions::HARD_WRAP) {
            for (i, line) in text.split(|&b| b == b'\n').enumerate() {
                if i > 0 {
                    let _ = output.put_str(&format!("<br{}\n", self.close_tag()));
                }
                let _ = output.put(line);
            }
        } else {
            let _ = output.put(text);
        }
        let _ = output.put(b"</p>\n");
    }

    fn table(&mut self, output: &mut Buffer, content: &[u8]) {
        let _ = output.put(b"<table>\n");
        let _ = output.put(content);
        let _ = output.put(b"</table>\n");
    }

    fn table_row(&mut self, output: &mut Buffer, content: &[u8]) {
        let _ = output.put(b"<tr>\n");
        let _ = output.put(content);
        let _ = output.put(b"</tr>\n");
    }

    fn table_cell(&mut self, output: &mut Buffer, content: &[u8], flags: TableFlags) {
        let tag = if flags.contains(TableFlags::HEADER) { "th" } else { "td" };
        let _ = output.put_str(&format!("<{}", tag));
        match flags.alignment() {
            TableAlignment::Left => { let _ = output.put_str(" style=\"text-align: left\""); }
            TableAlignment::Center => { let _ = output.put_str(" style=\"text-align: center\""); }
            TableAlignment::Right => { let _ = output.put_str(" style=\"text-align: right\""); }
            TableAlignment::Default => {}
        }
        let _ = output.put(b">");
        let _ = output.put(content);
        let _ = output.put_str(&format!("</{}>\n", tag));
    }

    fn footnotes(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(b"<div class=\"footnotes\">\n<ol>\n");
        let _ = output.put(text);
        let _ = output.put(b"</ol>\n</div>\n");
    }

    fn footnote_def(&mut self, output: &mut Buffer, text: &[u8], num: usize) {
        let _ = output.put_str(&format!("<li id=\"fn{}\">", num));
        let _ = output.put(text);
        let _ = output.put_str(&format!(" <a href=\"#fnref{}\" rev=\"footnote\">&#8617;</a></li>\n", num));
    }

    fn autolink(&mut self, output: &mut Buffer, link: &[u8], kind: AutolinkKind) -> bool {
        if !self.url_is_allowed(link) {
            return false;
        }
        let _ = output.put(b"<a href=\"");
        if kind == AutolinkKind::Email {
            let _ = output.put(b"mailto:");
        }
        self.escape_attribute(output, link);
        let _ = output.put(b"\">");
        self.escape(output, link);
        let _ = output.put(b"</a>");
        true
    }

    fn codespan(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<code>");
        self.escape(output, text);
        let _ = output.put(b"</code>");
        true
    }

    fn double_emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<strong>");
        let _ = output.put(text);
        let _ = output.put(b"</strong>");
        true
    }

    fn emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<em>");
        let _ = output.put(text);
        let _ = output.put(b"</em>");
        true
    }

    fn image(&mut self, output: &mut Buffer, link: &[u8], title: &[u8], alt: &[u8]) -> bool {
        if self.options.contains(RenderOptions::SKIP_IMAGES) || !self.url_is_allowed(link) {
            return false;
        }
        let _ = output.put(b"<img src=\"");
        self.escape_attribute(output, link);
        let _ = output.put(b"\" alt=\"");
        self.escape_attribute(output, alt);
        let _ = output.put(b"\"");
        if !title.is_empty() {
            let _ = output.put(b" title=\"");
            self.escape_attribute(output, title);
            let _ = output.put(b"\"");
        }
        let _ = output.put_str(self.close_tag());
        true
    }

    fn linebreak(&mut self, output: &mut Buffer) -> bool {
        let _ = output.put_str(&format!("<br{}\n", self.close_tag()));
        true
    }

    fn link(&mut self, output: &mut Buffer, link: &[u8], title: &[u8], content: &[u8]) -> bool {
        if !self.url_is_allowed(link) {
            return false;
        }
        if self.options.contains(RenderOptions::SKIP_LINKS) {
            let _ = output.put(content);
            return true;
        }
        let _ = output.put(b"<a href=\"");
        self.escape_attribute(output, link);
        let _ = output.put(b"\"");
        if !title.is_empty() {
            let _ = output.put(b" title=\"");
            self.escape_attribute(output, title);
            let _ = output.put(b"\"");
        }
        let _ = output.put(b">");
        let _ = output.put(content);
        let _ = output.put(b"</a>");
        true
    }

    fn raw_html_tag(&mut self, output: &mut Buffer, tag: &[u8]) -> bool {
        if self.options.contains(RenderOptions::SKIP_HTML) && !self.options.contains(RenderOptions::ESCAPE) {
            return true;
        }
        if self.options.contains(RenderOptions::ESCAPE) {
            self.escape(output, tag);
        } else {
            let _ = output.put(tag);
        }
        true
    }

    fn triple_emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<strong><em>");
        let _ = output.put(text);
        let _ = output.put(b"</em></strong>");
        true
    }

    fn ins(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<ins>");
        let _ = output.put(text);
        let _ = output.put(b"</ins>");
        true
    }

    fn strikethrough(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<del>");
        let _ = output.put(text);
        let _ = output.put(b"</del>");
        true
    }

    fn superscript(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        let _ = output.put(b"<sup>");
        let _ = output.put(text);
        let _ = output.put(b"</sup>");
        true
    }

    fn footnote_ref(&mut self, output: &mut Buffer, num: usize) -> bool {
        let _ = output.put_str(&format!(
            "<sup id=\"fnref{n}\"><a href=\"#fn{n}\" rel=\"footnote\">{n}</a></sup>",
            n = num
        ));
        true
    }

    fn entity(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(text);
    }

    fn normal_text(&mut self, output: &mut Buffer, text: &[u8]) {
        self.escape(output, text);
    }

    fn doc_footer(&mut self, output: &mut Buffer) {
        if self.options.contains(RenderOptions::TOC) && !self.toc.is_empty() {
            let _ = output.put(b"<nav class=\"toc\">\n<ul>\n");
            let _ = output.put(self.toc.as_slice());
            let _ = output.put(b"</ul>\n</nav>\n");
        }
    }

    fn outline(&mut self, output: &mut Buffer) {
        while self.section_depth > 0 {
            let _ = output.put(b"</section>\n");
            self.section_depth -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_paragraph_escapes_text() {
        let mut html = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        html.paragraph(&mut out, b"a < b & c");
        assert_eq!(out.as_slice(), b"<p>a < b & c</p>\n");
    }

    #[test]
    fn smoke_test_normal_text_escapes_entities() {
        let mut html = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        html.normal_text(&mut out, b"<script>");
        assert_eq!(out.as_slice(), b"&lt;script&gt;");
    }

    #[test]
    fn smoke_test_blockcode_with_language_class() {
        let mut html = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        html.blockcode(&mut out, b"int x;\n", b"c");
        assert_eq!(out.as_slice(), b"<pre><code class=\"c\">int x;\n</code></pre>\n");
    }

    #[test]
    fn smoke_test_safelink_rejects_javascript_uri() {
        let mut html = Html::new(RenderOptions::SAFELINK);
        let mut out = Buffer::new(64);
        let handled = html.link(&mut out, b"javascript:alert(1)", b"", b"click");
        assert!(!handled);
    }

    #[test]
    fn smoke_test_footnote_def_and_ref_render() {
        let mut html = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        html.footnote_ref(&mut out, 1);
        assert_eq!(
            out.as_slice(),
            br#"<sup id="fnref1"><a href="#fn1" rel="footnote">1</a></sup>"#
        );
    }

    #[test]
    fn smoke_test_table_cell_alignment_style() {
        let mut html = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        html.table_cell(&mut out, b"x", TableFlags::ALIGN_CENTER);
        assert_eq!(out.as_slice(), br#"<td style="text-align: center">x</td>
"#);
    }
}
