//! The inline tokeniser (§4.6): a 256-entry active-character dispatch
//! table drives `parse_inline`. Bytes that aren't active are batched and
//! emitted through `normal_text`; an active byte dispatches to a handler
//! that either consumes some bytes and renders something, or declines (no
//! match) and the trigger byte falls through as a single literal byte.

use crate::autolink::{self, AutolinkMatch};
use crate::flags::{AutolinkKind, Extension};
use crate::render::Render;
use crate::{Buffer, ParserState, Result};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Emphasis,
    Code,
    NewlineOrBreak,
    Link,
    Angle,
    Backslash,
    Entity,
    AutolinkColon,
    AutolinkAt,
    AutolinkW,
    Superscript,
}

/// Builds the active-character table for the given extension set.
fn active_table(extensions: Extension) -> [Option<Trigger>; 256] {
    let mut table = [None; 256];
    table[b'*' as usize] = Some(Trigger::Emphasis);
    table[b'_' as usize] = Some(Trigger::Emphasis);
    if extensions.contains(Extension::STRIKETHROUGH) {
        table[b'~' as usize] = Some(Trigger::Emphasis);
    }
    if extensions.contains(Extension::INS) {
        table[b'+' as usize] = Some(Trigger::Emphasis);
    }
    table[b'`' as usize] = Some(Trigger::Code);
    table[b'\n' as usize] = Some(Trigger::NewlineOrBreak);
    table[b'[' as usize] = Some(Trigger::Link);
    table[b'<' as usize] = Some(Trigger::Angle);
    table[b'\\' as usize] = Some(Trigger::Backslash);
    table[b'&' as usize] = Some(Trigger::Entity);
    if extensions.contains(Extension::AUTOLINK) {
        table[b':' as usize] = Some(Trigger::AutolinkColon);
        table[b'@' as usize] = Some(Trigger::AutolinkAt);
        table[b'w' as usize] = Some(Trigger::AutolinkW);
    }
    if extensions.contains(Extension::SUPERSCRIPT) {
        table[b'^' as usize] = Some(Trigger::Superscript);
    }
    table
}

/// Parses `data` as inline content, invoking `renderer` span callbacks,
/// and writes the rendered result into `output`.
pub fn parse_inline(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
) -> Result<()> {
    if state.pools.depth() >= state.max_nesting {
        return Ok(());
    }
    let guard = state.pools.span.acquire();

    let table = active_table(state.extensions);
    let mut i = 0;
    while i < data.len() {
        let mut end = i;
        while end < data.len() && table[data[end] as usize].is_none() {
            end += 1;
        }
        if end > i {
            renderer.normal_text(output, &data[i..end]);
        }
        if end >= data.len() {
            break;
        }

        let trigger = table[data[end] as usize].unwrap();
        let consumed = dispatch(state, renderer, output, data, end, trigger)?;
        match consumed {
            Some(n) if n > 0 => i = end + n,
            _ => {
                renderer.normal_text(output, &data[end..end + 1]);
                i = end + 1;
            }
        }
    }

    state.pools.span.release(guard);
    Ok(())
}

fn dispatch(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
    trigger: Trigger,
) -> Result<Option<usize>> {
    match trigger {
        Trigger::Emphasis => Ok(emphasis(state, renderer, output, data, offset)?),
        Trigger::Code => Ok(code_span(renderer, output, data, offset)),
        Trigger::NewlineOrBreak => Ok(newline(renderer, output)),
        Trigger::Link => Ok(link_or_image(state, renderer, output, data, offset)?),
        Trigger::Angle => Ok(angle(state, renderer, output, data, offset)?),
        Trigger::Backslash => Ok(backslash(renderer, output, data, offset)),
        Trigger::Entity => Ok(entity(renderer, output, data, offset)),
        Trigger::AutolinkColon => Ok(bare_autolink(state, renderer, output, data, offset, AutolinkScan::Url)),
        Trigger::AutolinkAt => Ok(bare_autolink(state, renderer, output, data, offset, AutolinkScan::Email)),
        Trigger::AutolinkW => Ok(bare_autolink(state, renderer, output, data, offset, AutolinkScan::Www)),
        Trigger::Superscript => Ok(superscript(state, renderer, output, data, offset)?),
    }
}

// ---- emphasis (§4.6: parse_emph1 / parse_emph2) ----

fn emphasis(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
) -> Result<Option<usize>> {
    let ch = data[offset];
    let no_intra = state.extensions.contains(Extension::NO_INTRA_EMPHASIS);

    let max_run = if ch == b'~' || ch == b'+' { 2 } else { 3 };
    let mut run = 0;
    while run < max_run && data.get(offset + run) == Some(&ch) {
        run += 1;
    }
    let double_only = ch == b'~' || ch == b'+';
    let level = if double_only {
        if run < 2 {
            return Ok(None);
        }
        2
    } else {
        run
    };

    let content_start = offset + level;
    if content_start >= data.len() || data[content_start].is_ascii_whitespace() {
        return Ok(None);
    }
    if no_intra && offset > 0 && data[offset - 1].is_ascii_alphanumeric() {
        return Ok(None);
    }

    let Some(close) = find_emphasis_close(data, content_start, ch, level, no_intra) else {
        return Ok(None);
    };

    let content = &data[content_start..close];
    let mut inner = state.pools.span.acquire();
    parse_inline(state, renderer, &mut inner, content)?;
    let handled = match (ch, level) {
        (b'~', 2) => renderer.strikethrough(output, inner.as_slice()),
        (b'+', 2) => renderer.ins(output, inner.as_slice()),
        (_, 1) => renderer.emphasis(output, inner.as_slice()),
        (_, 2) => renderer.double_emphasis(output, inner.as_slice()),
        (_, 3) => renderer.triple_emphasis(output, inner.as_slice()),
        _ => false,
    };
    state.pools.span.release(inner);
    if !handled {
        return Ok(None);
    }
    Ok(Some(close + level - offset))
}

fn find_emphasis_close(data: &[u8], start: usize, ch: u8, len: usize, no_intra: bool) -> Option<usize> {
    let mut pos = start;
    while pos < data.len() {
        if data[pos] == ch {
            let mut run = 0;
            while pos + run < data.len() && data[pos + run] == ch {
                run += 1;
            }
            if run >= len {
                let prev_ok = pos > start && !data[pos - 1].is_ascii_whitespace();
                let next_idx = pos + len;
                let next_ok = !no_intra || next_idx >= data.len() || !data[next_idx].is_ascii_alphanumeric();
                if prev_ok && next_ok {
                    return Some(pos);
                }
            }
            pos += run.max(1);
        } else {
            pos += 1;
        }
    }
    None
}

// ---- code span ----

fn code_span(renderer: &mut dyn Render, output: &mut Buffer, data: &[u8], offset: usize) -> Option<usize> {
    let mut run = 0;
    while data.get(offset + run) == Some(&b'`') {
        run += 1;
    }
    let content_start = offset + run;
    let mut pos = content_start;
    while pos < data.len() {
        if data[pos] == b'`' {
            let mut close_run = 0;
            while data.get(pos + close_run) == Some(&b'`') {
                close_run += 1;
            }
            if close_run == run {
                let mut content = &data[content_start..pos];
                if content.len() >= 2 && content.first() == Some(&b' ') && content.last() == Some(&b' ') {
                    content = &content[1..content.len() - 1];
                }
                if !renderer.codespan(output, content) {
                    return None;
                }
                return Some(pos + close_run - offset);
            }
            pos += close_run;
        } else {
            pos += 1;
        }
    }
    None
}

// ---- hard line break ----

fn newline(renderer: &mut dyn Render, output: &mut Buffer) -> Option<usize> {
    if output.as_slice().ends_with(b"  ") {
        output.truncate_last(2);
        if renderer.linebreak(output) {
            return Some(1);
        }
    }
    None
}

// ---- backslash escapes ----

fn backslash(renderer: &mut dyn Render, output: &mut Buffer, data: &[u8], offset: usize) -> Option<usize> {
    let next = *data.get(offset + 1)?;
    if next.is_ascii_punctuation() {
        renderer.normal_text(output, &[next]);
        Some(2)
    } else {
        None
    }
}

// ---- entities ----

fn entity(renderer: &mut dyn Render, output: &mut Buffer, data: &[u8], offset: usize) -> Option<usize> {
    let rest = &data[offset..];
    let semi = rest.iter().take(32).position(|&b| b == b';')?;
    if semi == 0 {
        return None;
    }
    let body = &rest[1..semi];
    let valid = body.first() == Some(&b'#')
        || body.iter().all(|b| b.is_ascii_alphanumeric());
    if !valid {
        return None;
    }
    renderer.entity(output, &rest[..=semi]);
    Some(semi + 1)
}

// ---- bare autolinks ----

enum AutolinkScan {
    Url,
    Www,
    Email,
}

fn bare_autolink(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
    kind: AutolinkScan,
) -> Option<usize> {
    if state.in_link_body {
        return None;
    }
    let m: AutolinkMatch = match kind {
        AutolinkScan::Url => autolink::scan_url(data, offset)?,
        AutolinkScan::Www => autolink::scan_www(data, offset)?,
        AutolinkScan::Email => autolink::scan_email(data, offset)?,
    };
    let start = offset - m.rewind;
    let end = offset + m.len;
    let text = &data[start..end];
    output.truncate_last(m.rewind);
    let link_kind = if matches!(kind, AutolinkScan::Email) { AutolinkKind::Email } else { AutolinkKind::Normal };
    if !renderer.autolink(output, text, link_kind) {
        let _ = output.put(text);
    }
    trace!("inline: bare autolink {:?} bytes", text.len());
    Some(end - offset)
}

// ---- `<...>` raw tag or angle autolink ----

fn angle(
    _state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
) -> Result<Option<usize>> {
    let rest = &data[offset + 1..];
    let Some(close_rel) = rest.iter().position(|&b| b == b'>') else {
        return Ok(None);
    };
    let inner = &rest[..close_rel];
    if inner.is_empty() || inner.iter().any(|b| b.is_ascii_whitespace()) {
        // fall through to raw html tag handling below
    } else if let Some(colon) = inner.iter().position(|&b| b == b':') {
        let scheme = &inner[..colon];
        if !scheme.is_empty() && scheme.iter().all(|b| b.is_ascii_alphanumeric()) {
            if renderer.autolink(output, inner, AutolinkKind::Normal) {
                return Ok(Some(offset + 2 + close_rel - offset));
            }
        }
    } else if inner.contains(&b'@') {
        if renderer.autolink(output, inner, AutolinkKind::Email) {
            return Ok(Some(offset + 2 + close_rel - offset));
        }
    }

    // raw html tag: <tag ...> or </tag> or <!-- ... -->
    let first = *inner.first().unwrap_or(&0);
    let is_tag = first == b'/' || first == b'!' || first == b'?' || first.is_ascii_alphabetic();
    if is_tag {
        let whole = &data[offset..offset + 2 + close_rel];
        if renderer.raw_html_tag(output, whole) {
            return Ok(Some(whole.len()));
        }
    }
    Ok(None)
}

// ---- superscript ----

fn superscript(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
) -> Result<Option<usize>> {
    let after = offset + 1;
    if data.get(after) == Some(&b'(') {
        let rest = &data[after + 1..];
        let Some(close_rel) = rest.iter().position(|&b| b == b')') else {
            return Ok(None);
        };
        let content = &rest[..close_rel];
        let mut inner = state.pools.span.acquire();
        parse_inline(state, renderer, &mut inner, content)?;
        let handled = renderer.superscript(output, inner.as_slice());
        state.pools.span.release(inner);
        if !handled {
            return Ok(None);
        }
        return Ok(Some(after + 1 + close_rel + 1 - offset));
    }

    let mut end = after;
    while end < data.len() && !data[end].is_ascii_whitespace() {
        end += 1;
    }
    if end == after {
        return Ok(None);
    }
    let content = &data[after..end];
    let mut inner = state.pools.span.acquire();
    parse_inline(state, renderer, &mut inner, content)?;
    let handled = renderer.superscript(output, inner.as_slice());
    state.pools.span.release(inner);
    if !handled {
        return Ok(None);
    }
    Ok(Some(end - offset))
}

// ---- links, images, footnote references ----

fn find_matching_bracket(data: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut i = open;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn collapse_label(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut in_space = false;
    for &b in text {
        if b.is_ascii_whitespace() {
            in_space = true;
        } else {
            if in_space && !out.is_empty() {
                out.push(b' ');
            }
            in_space = false;
            out.push(b);
        }
    }
    out
}

fn parse_inline_url_title(data: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut i = 0;
    while data.get(i).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        i += 1;
    }
    let angled = data.get(i) == Some(&b'<');
    if angled {
        i += 1;
    }
    let url_start = i;
    if angled {
        while i < data.len() && data[i] != b'>' {
            i += 1;
        }
    } else {
        while i < data.len() && !data[i].is_ascii_whitespace() && data[i] != b')' {
            i += 1;
        }
    }
    let link = data[url_start..i].to_vec();
    if angled && data.get(i) == Some(&b'>') {
        i += 1;
    }
    while data.get(i).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        i += 1;
    }
    let title = match data.get(i) {
        Some(&open @ (b'"' | b'\'')) => {
            let start = i + 1;
            let end = data[start..].iter().position(|&b| b == open).map(|p| start + p)?;
            data[start..end].to_vec()
        }
        _ => Vec::new(),
    };
    Some((link, title))
}

fn link_or_image(
    state: &mut ParserState,
    renderer: &mut dyn Render,
    output: &mut Buffer,
    data: &[u8],
    offset: usize,
) -> Result<Option<usize>> {
    let is_image = offset > 0 && data[offset - 1] == b'!';
    let close = match find_matching_bracket(data, offset) {
        Some(c) => c,
        None => return Ok(None),
    };
    let label_text = &data[offset + 1..close];

    // footnote reference: [^id]
    if state.extensions.contains(Extension::FOOTNOTES) {
        if let Some(id) = label_text.strip_prefix(b"^") {
            let Some(num) = state.refs.use_footnote(id) else {
                return Ok(None);
            };
            if is_image {
                return Ok(None);
            }
            let handled = renderer.footnote_ref(output, num);
            return Ok(if handled { Some(close + 1 - offset) } else { None });
        }
    }

    let mut end = close + 1;
    let mut link = Vec::new();
    let mut title = Vec::new();

    if data.get(end) == Some(&b'(') {
        let paren_start = end + 1;
        let Some(paren_rel) = data[paren_start..].iter().position(|&b| b == b')') else {
            return Ok(None);
        };
        let inner = &data[paren_start..paren_start + paren_rel];
        let Some((l, t)) = parse_inline_url_title(inner) else {
            return Ok(None);
        };
        link = l;
        title = t;
        end = paren_start + paren_rel + 1;
    } else if data.get(end) == Some(&b'[') {
        let Some(ref_close) = data[end + 1..].iter().position(|&b| b == b']').map(|p| end + 1 + p) else {
            return Ok(None);
        };
        let explicit_id = &data[end + 1..ref_close];
        let id = if explicit_id.is_empty() { collapse_label(label_text) } else { explicit_id.to_vec() };
        let Some(r) = state.refs.lookup_ref(&id) else {
            return Ok(None);
        };
        link = r.link.clone();
        title = r.title.clone();
        end = ref_close + 1;
    } else {
        let id = collapse_label(label_text);
        let Some(r) = state.refs.lookup_ref(&id) else {
            return Ok(None);
        };
        link = r.link.clone();
        title = r.title.clone();
    }

    if is_image {
        output.truncate_last(1); // drop the already-emitted '!'
        let handled = renderer.image(output, &link, &title, label_text);
        return Ok(if handled { Some(end - offset) } else { None });
    }

    let was_in_link_body = state.in_link_body;
    state.in_link_body = true;
    let mut content = state.pools.span.acquire();
    let result = parse_inline(state, renderer, &mut content, label_text);
    state.in_link_body = was_in_link_body;
    result?;

    let handled = renderer.link(output, &link, &title, content.as_slice());
    state.pools.span.release(content);
    Ok(if handled { Some(end - offset) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::RenderOptions;
    use crate::render::html::Html;
    use crate::refs::RefTables;
    use crate::buffer::BufferPools;

    fn fresh_state(extensions: Extension) -> ParserState {
        ParserState {
            extensions,
            max_nesting: 16,
            pools: BufferPools::new(),
            refs: RefTables::default(),
            in_link_body: false,
        }
    }

    #[test]
    fn smoke_test_double_emphasis_renders_strong() {
        let mut state = fresh_state(Extension::empty());
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"**hello**").unwrap();
        assert_eq!(out.as_slice(), b"<strong>hello</strong>");
    }

    #[test]
    fn smoke_test_emphasis_renders_em() {
        let mut state = fresh_state(Extension::empty());
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"*hi*").unwrap();
        assert_eq!(out.as_slice(), b"<em>hi</em>");
    }

    #[test]
    fn smoke_test_code_span_trims_surrounding_space() {
        let mut state = fresh_state(Extension::empty());
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"` x `").unwrap();
        assert_eq!(out.as_slice(), b"<code>x</code>");
    }

    #[test]
    fn smoke_test_reference_link_resolves() {
        let mut state = fresh_state(Extension::empty());
        state.refs.refs.insert(
            "y".to_string(),
            crate::refs::LinkRef { link: b"http://e.com".to_vec(), title: b"t".to_vec() },
        );
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"[x][y]").unwrap();
        assert_eq!(out.as_slice(), br#"<a href="http://e.com" title="t">x</a>"#);
    }

    #[test]
    fn smoke_test_bare_url_autolink() {
        let mut state = fresh_state(Extension::AUTOLINK);
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"see http://example.com today").unwrap();
        assert!(String::from_utf8_lossy(out.as_slice()).contains(r#"<a href="http://example.com">http://example.com</a>"#));
    }

    #[test]
    fn smoke_test_footnote_reference_assigns_number() {
        let mut state = fresh_state(Extension::FOOTNOTES);
        state.refs.footnotes_found.insert(
            "1".to_string(),
            crate::refs::FootnoteRef { contents: b"note".to_vec(), used: false, num: 0 },
        );
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"see[^1]").unwrap();
        assert!(String::from_utf8_lossy(out.as_slice()).contains("fnref1"));
    }

    #[test]
    fn smoke_test_backslash_escapes_punctuation() {
        let mut state = fresh_state(Extension::empty());
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, br"\*not emphasis\*").unwrap();
        assert_eq!(out.as_slice(), b"*not emphasis*");
    }

    #[test]
    fn smoke_test_no_intra_emphasis_suppresses_mid_word() {
        let mut state = fresh_state(Extension::NO_INTRA_EMPHASIS);
        let mut renderer = Html::new(RenderOptions::empty());
        let mut out = Buffer::new(64);
        parse_inline(&mut state, &mut renderer, &mut out, b"foo_bar_baz").unwrap();
        assert_eq!(out.as_slice(), b"foo_bar_baz");
    }
}
