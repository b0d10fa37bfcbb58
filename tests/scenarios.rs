//! Integration tests exercising the full pipeline against the
//! reference HTML renderer (§8's concrete scenarios plus invariants).

use marrow_core::{render, Buffer, Extension, Html, RenderOptions};
use pretty_assertions::assert_eq;

fn render_html(doc: &[u8], extensions: Extension) -> String {
    let mut out = Buffer::new(doc.len().max(64));
    let mut html = Html::new(RenderOptions::empty());
    render(&mut out, doc, &mut html, extensions, marrow_core::DEFAULT_MAX_NESTING).unwrap();
    out.as_str_lossy().into_owned()
}

#[test]
fn bold_paragraph() {
    assert_eq!(render_html(b"**hello**\n", Extension::empty()), "<p><strong>hello</strong></p>\n");
}

#[test]
fn reference_link() {
    let doc = b"[x][y]\n\n[y]: http://e.com \"t\"\n";
    assert_eq!(render_html(doc, Extension::empty()), "<p><a href=\"http://e.com\" title=\"t\">x</a></p>\n");
}

#[test]
fn fenced_code_with_language_class() {
    let doc = b"```c\nint x;\n```\n";
    assert_eq!(render_html(doc, Extension::FENCED_CODE), "<pre><code class=\"c\">int x;\n</code></pre>\n");
}

#[test]
fn ordered_list() {
    let doc = b"1. a\n2. b\n";
    assert_eq!(render_html(doc, Extension::empty()), "<ol>\n<li>a</li>\n<li>b</li>\n</ol>\n");
}

#[test]
fn blockquote_with_two_lines() {
    let doc = b"> q1\n> q2\n";
    assert_eq!(render_html(doc, Extension::empty()), "<blockquote>\n<p>q1\nq2</p>\n</blockquote>\n");
}

#[test]
fn footnotes_render_reference_and_definition() {
    let doc = b"see[^1]\n\n[^1]: note\n";
    let out = render_html(doc, Extension::FOOTNOTES);
    assert!(out.contains(r#"<sup id="fnref1"><a href="#fn1" rel="footnote">1</a></sup>"#));
    assert!(out.contains(r#"<div class="footnotes">"#));
    assert!(out.contains("note"));
    assert!(out.contains(r#"<li id="fn1">"#));
}

#[test]
fn reference_resolution_is_order_independent() {
    let before = render_html(b"[x][y]\n\n[y]: /a\n", Extension::empty());
    let after = render_html(b"[y]: /a\n\n[x][y]\n", Extension::empty());
    assert_eq!(before, after);
}

#[test]
fn tab_expansion_aligns_to_four_column_stops() {
    let mut out = Buffer::new(64);
    let tables = marrow_core::refs::scan(b"a\tb\n", Extension::empty()).unwrap();
    out.put(tables.document.as_slice()).unwrap();
    assert_eq!(out.as_slice(), b"a   b\n");
}

#[test]
fn idempotent_reference_scanning() {
    let doc = b"[y]: /a\nbody text\n";
    let first = marrow_core::refs::scan(doc, Extension::empty()).unwrap();
    let second = marrow_core::refs::scan(first.document.as_slice(), Extension::empty()).unwrap();
    assert_eq!(first.document.as_slice(), second.document.as_slice());
    assert!(second.refs.is_empty());
}

#[test]
fn work_buffer_pools_are_empty_after_render() {
    let doc = b"# h\n\n> nested\n> text\n\n1. a\n2. b\n";
    let mut out = Buffer::new(128);
    let mut html = Html::new(RenderOptions::empty());
    render(&mut out, doc, &mut html, Extension::empty(), marrow_core::DEFAULT_MAX_NESTING).unwrap();
    // render() itself debug_asserts this; a clean return is the observable proof.
    assert!(!out.is_empty());
}

#[test]
fn deeply_nested_blockquotes_are_bounded_by_max_nesting() {
    let doc = ">".repeat(40) + " x\n";
    let mut out = Buffer::new(256);
    let mut html = Html::new(RenderOptions::empty());
    render(&mut out, doc.as_bytes(), &mut html, Extension::empty(), 8).unwrap();
    // truncated rather than stack-overflowing or erroring
    assert!(out.len() < doc.len() * 4);
}
