//! The top-level driver (§4.7): owns parser state across a render and
//! sequences pass 1, the block parser, and the footnote/outline tail.

use crate::buffer::{Buffer, BufferPools};
use crate::error::Result;
use crate::flags::Extension;
use crate::refs::RefTables;
use crate::render::Render;
use crate::{block, refs};
use log::debug;

/// Default recursion depth bound (`--nesting` on the CLI).
pub const DEFAULT_MAX_NESTING: usize = 16;

/// Mutable state threaded through pass 1, the block parser, and the
/// inline tokeniser for the duration of one [`render`] call. The
/// renderer is always passed as a separate `&mut dyn Render` argument
/// rather than stored here, so it is borrowed only for the span of the
/// call it actually participates in (§9).
pub struct ParserState {
    pub extensions: Extension,
    pub max_nesting: usize,
    pub pools: BufferPools,
    pub refs: RefTables,
    /// Suppresses bare-autolink scanning while rendering a link's own
    /// text content, so `[http://x](y)` doesn't double-link.
    pub in_link_body: bool,
}

impl ParserState {
    pub fn new(extensions: Extension, max_nesting: usize) -> Self {
        ParserState {
            extensions,
            max_nesting,
            pools: BufferPools::new(),
            refs: RefTables::default(),
            in_link_body: false,
        }
    }
}

/// Renders `document` (markdown source bytes) into `out`, driving
/// `renderer` through the full two-pass sequence (§4.7).
pub fn render(
    out: &mut Buffer,
    document: &[u8],
    renderer: &mut dyn Render,
    extensions: Extension,
    max_nesting: usize,
) -> Result<()> {
    let mut state = ParserState::new(extensions, max_nesting);

    state.refs = refs::scan(document, extensions)?;
    debug!(
        "driver: pass 1 done, {} refs, {} footnote defs",
        state.refs.refs.len(),
        state.refs.footnotes_found.len()
    );

    out.grow(document.len() + document.len() / 2)?;

    renderer.doc_header(out);

    if !state.refs.document.as_slice().ends_with(b"\n") {
        state.refs.document.put(b"\n")?;
    }
    let working = std::mem::take(&mut state.refs.document);
    block::parse_block(&mut state, renderer, out, working.as_slice())?;
    state.refs.document = working;

    if state.extensions.contains(Extension::FOOTNOTES) && !state.refs.footnotes_used.is_empty() {
        let mut footnotes_out = state.pools.block.acquire();
        let used = std::mem::take(&mut state.refs.footnotes_used);
        for key in &used {
            let Some(def) = state.refs.footnotes_found.get(key) else {
                continue;
            };
            let contents = def.contents.clone();
            let num = def.num;
            let mut body = state.pools.span.acquire();
            block::parse_block(&mut state, renderer, &mut body, &add_trailing_newline(&contents))?;
            renderer.footnote_def(&mut footnotes_out, body.as_slice(), num);
            state.pools.span.release(body);
        }
        state.refs.footnotes_used = used;
        renderer.footnotes(out, footnotes_out.as_slice());
        state.pools.block.release(footnotes_out);
    }

    renderer.doc_footer(out);
    renderer.outline(out);

    debug_assert!(state.pools.is_empty(), "work-buffer pools not empty at end of render");
    Ok(())
}

fn add_trailing_newline(data: &[u8]) -> Vec<u8> {
    let mut v = data.to_vec();
    v.push(b'\n');
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::RenderOptions;
    use crate::render::html::Html;

    #[test]
    fn smoke_test_render_paragraph_to_html() {
        let mut out = Buffer::new(128);
        let mut html = Html::new(RenderOptions::empty());
        render(&mut out, b"hello world\n", &mut html, Extension::empty(), DEFAULT_MAX_NESTING).unwrap();
        assert_eq!(out.as_slice(), b"<p>hello world</p>\n");
    }

    #[test]
    fn smoke_test_render_with_footnotes() {
        let mut out = Buffer::new(128);
        let mut html = Html::new(RenderOptions::empty());
        let doc = b"see[^1]\n\n[^1]: a note\n";
        render(&mut out, doc, &mut html, Extension::FOOTNOTES, DEFAULT_MAX_NESTING).unwrap();
        let text = String::from_utf8_lossy(out.as_slice());
        assert!(text.contains("fnref1"));
        assert!(text.contains("class=\"footnotes\""));
    }

    #[test]
    fn smoke_test_pools_empty_after_render() {
        let mut out = Buffer::new(128);
        let mut html = Html::new(RenderOptions::empty());
        let mut state = ParserState::new(Extension::empty(), DEFAULT_MAX_NESTING);
        state.refs = refs::scan(b"> quoted\n", Extension::empty()).unwrap();
        let working = std::mem::take(&mut state.refs.document);
        block::parse_block(&mut state, &mut html, &mut out, working.as_slice()).unwrap();
        assert!(state.pools.is_empty());
    }
}
