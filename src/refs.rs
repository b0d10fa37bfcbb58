//! Pass 1: the reference/footnote scanner (§4.4).
//!
//! Walks the raw document line by line, pulling link-reference and
//! footnote definitions out into lookup tables and copying everything
//! else -- tab-expanded, newline-normalised -- into an intermediate
//! document buffer for the block parser to consume.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::flags::Extension;
use log::{debug, trace, warn};
use std::collections::HashMap;

const TAB_WIDTH: usize = 4;

/// A resolved `[id]: url "title"` definition.
#[derive(Debug, Clone, Default)]
pub struct LinkRef {
    pub link: Vec<u8>,
    pub title: Vec<u8>,
}

/// A `[^id]: body…` footnote definition, plus use-tracking state.
#[derive(Debug, Clone, Default)]
pub struct FootnoteRef {
    pub contents: Vec<u8>,
    pub used: bool,
    /// 1-based, assigned on first use, in first-use order.
    pub num: usize,
}

/// Case-folded, whitespace-collapsed label used both as the hash key and
/// as the re-check that closes the collision hazard noted in the source
/// (§9): the historical table compares hashes alone.
fn normalize_label(label: &[u8]) -> String {
    let text = String::from_utf8_lossy(label);
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            in_space = true;
        } else {
            if in_space && !out.is_empty() {
                out.push(' ');
            }
            in_space = false;
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// The tables built by pass 1, plus the intermediate (tab-expanded,
/// newline-normalised) document the block parser consumes.
#[derive(Debug, Default)]
pub struct RefTables {
    pub refs: HashMap<String, LinkRef>,
    pub footnotes_found: HashMap<String, FootnoteRef>,
    /// Order in which footnotes were first referenced during block/inline
    /// parsing; populated later, not by the scanner itself.
    pub footnotes_used: Vec<String>,
    pub document: Buffer,
}

impl RefTables {
    pub fn lookup_ref(&self, label: &[u8]) -> Option<&LinkRef> {
        self.refs.get(&normalize_label(label))
    }

    pub fn lookup_footnote(&self, label: &[u8]) -> Option<&FootnoteRef> {
        self.footnotes_found.get(&normalize_label(label))
    }

    /// Marks a footnote used, assigning it the next sequential number on
    /// first use. Returns the assigned number, or `None` if the label is
    /// undefined.
    pub fn use_footnote(&mut self, label: &[u8]) -> Option<usize> {
        let key = normalize_label(label);
        let already_used = self.footnotes_found.get(&key).map(|f| f.used)?;
        if !already_used {
            let num = self.footnotes_used.len() + 1;
            self.footnotes_used.push(key.clone());
            if let Some(entry) = self.footnotes_found.get_mut(&key) {
                entry.used = true;
                entry.num = num;
            }
        }
        self.footnotes_found.get(&key).map(|f| f.num)
    }
}

fn strip_up_to_3_spaces(line: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < 3 && line.get(i) == Some(&b' ') {
        i += 1;
    }
    &line[i..]
}

/// Matches `[^id]:` at the start of a (lead-space-stripped) line, returning
/// the id and the rest of the line after any following whitespace.
fn match_footnote_marker(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let line = strip_up_to_3_spaces(line);
    if line.first() != Some(&b'[') || line.get(1) != Some(&b'^') {
        return None;
    }
    let close = line.iter().position(|&b| b == b']')?;
    if close < 3 {
        return None;
    }
    let id = &line[2..close];
    if id.is_empty() {
        return None;
    }
    let rest = &line[close + 1..];
    if rest.first() != Some(&b':') {
        return None;
    }
    let mut rest = &rest[1..];
    while rest.first().map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        rest = &rest[1..];
    }
    Some((id, rest))
}

/// Matches `[id]:` at the start of a (lead-space-stripped) line, returning
/// the id and the rest of the line after any following whitespace.
fn match_ref_marker(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let line = strip_up_to_3_spaces(line);
    if line.first() != Some(&b'[') {
        return None;
    }
    let close = line.iter().position(|&b| b == b']')?;
    if close < 1 {
        return None;
    }
    let id = &line[1..close];
    if id.is_empty() {
        return None;
    }
    let rest = &line[close + 1..];
    if rest.first() != Some(&b':') {
        return None;
    }
    let mut rest = &rest[1..];
    while rest.first().map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        rest = &rest[1..];
    }
    Some((id, rest))
}

/// Parses the `<url> "title"` portion of a link reference definition.
fn parse_ref_tail(rest: &[u8]) -> Option<LinkRef> {
    let mut i = 0;
    let angled = rest.first() == Some(&b'<');
    if angled {
        i += 1;
    }
    let url_start = i;
    if angled {
        while i < rest.len() && rest[i] != b'>' {
            i += 1;
        }
        if i >= rest.len() {
            return None;
        }
    } else {
        while i < rest.len() && !rest[i].is_ascii_whitespace() {
            i += 1;
        }
    }
    let link = rest[url_start..i].to_vec();
    if link.is_empty() {
        return None;
    }
    if angled {
        i += 1; // skip '>'
    }
    while i < rest.len() && rest[i].is_ascii_whitespace() {
        i += 1;
    }
    let title = match rest.get(i) {
        Some(&open @ (b'"' | b'\'')) => {
            let start = i + 1;
            let end = rest[start..].iter().position(|&b| b == open).map(|p| start + p);
            end.map(|end| rest[start..end].to_vec()).unwrap_or_default()
        }
        Some(&b'(') => {
            let start = i + 1;
            let end = rest[start..].iter().position(|&b| b == b')').map(|p| start + p);
            end.map(|end| rest[start..end].to_vec()).unwrap_or_default()
        }
        _ => Vec::new(),
    };
    Some(LinkRef { link, title })
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}

fn expand_tabs(line: &[u8], out: &mut Buffer) -> Result<()> {
    let mut col = 0usize;
    for &b in line {
        if b == b'\t' {
            let spaces = TAB_WIDTH - (col % TAB_WIDTH);
            out.put(&b" "[..].repeat(spaces))?;
            col += spaces;
        } else {
            out.put(&[b])?;
            col += 1;
        }
    }
    Ok(())
}

/// Splits `data` into logical lines, normalising CRLF/CR to LF and
/// stripping a leading UTF-8 BOM.
fn split_lines(data: &[u8]) -> Vec<Vec<u8>> {
    let data = if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    };
    let mut lines = Vec::new();
    let mut cur = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\r' => {
                lines.push(std::mem::take(&mut cur));
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {
                lines.push(std::mem::take(&mut cur));
            }
            b => cur.push(b),
        }
        i += 1;
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Runs the full reference scan (§4.4), returning the populated tables and
/// intermediate document.
pub fn scan(data: &[u8], extensions: Extension) -> Result<RefTables> {
    let lines = split_lines(data);
    let mut tables = RefTables::default();
    tables.document = Buffer::new(data.len().max(64));

    let footnotes_enabled = extensions.contains(Extension::FOOTNOTES);

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];

        if footnotes_enabled {
            if let Some((id, rest)) = match_footnote_marker(line) {
                let key = normalize_label(id);
                let mut body = rest.to_vec();
                let mut j = i + 1;
                while j < lines.len() {
                    let next = &lines[j];
                    if is_blank(next) {
                        break;
                    }
                    let indented = next.starts_with(b"    ") || next.starts_with(b"\t");
                    if !indented {
                        break;
                    }
                    body.push(b'\n');
                    body.extend_from_slice(strip_up_to_3_spaces(next));
                    j += 1;
                }
                debug!("pass1: footnote definition [^{}], {} bytes", key, body.len());
                tables.footnotes_found.insert(
                    key,
                    FootnoteRef {
                        contents: body,
                        used: false,
                        num: 0,
                    },
                );
                i = j;
                continue;
            }
        }

        if let Some((id, rest)) = match_ref_marker(line) {
            let rest = rest.to_vec();
            let primary = parse_ref_tail(&rest);
            // The title may be on the line after a successfully-parsed URL,
            // not just when the URL itself fails to parse.
            let needs_lookahead = primary.as_ref().map(|lr| lr.title.is_empty()).unwrap_or(true);
            let mut resolved = primary;
            let mut consumed_next = false;
            if needs_lookahead && i + 1 < lines.len() {
                let mut rest2 = rest.clone();
                rest2.push(b' ');
                rest2.extend_from_slice(&lines[i + 1]);
                if let Some(lr2) = parse_ref_tail(&rest2) {
                    if !lr2.title.is_empty() || resolved.is_none() {
                        resolved = Some(lr2);
                        consumed_next = true;
                    }
                }
            }
            if let Some(link_ref) = resolved {
                let key = normalize_label(id);
                trace!("pass1: link reference [{}] -> {:?}", key, link_ref.link);
                tables.refs.insert(key, link_ref);
                i += if consumed_next { 2 } else { 1 };
                continue;
            } else {
                warn!("pass1: malformed reference definition at line {}, skipping", i);
            }
        }

        expand_tabs(line, &mut tables.document)?;
        tables.document.put(b"\n")?;
        i += 1;
    }

    debug!(
        "pass1 complete: {} link refs, {} footnote defs",
        tables.refs.len(),
        tables.footnotes_found.len()
    );

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_scans_link_reference() {
        let tables = scan(b"[y]: http://e.com \"t\"\n", Extension::empty()).unwrap();
        let link_ref = tables.lookup_ref(b"y").unwrap();
        assert_eq!(link_ref.link, b"http://e.com");
        assert_eq!(link_ref.title, b"t");
    }

    #[test]
    fn smoke_test_ref_is_case_and_space_insensitive() {
        let tables = scan(b"[Some  Label]: /x\n", Extension::empty()).unwrap();
        assert!(tables.lookup_ref(b"some label").is_some());
    }

    #[test]
    fn smoke_test_scans_footnote_definition() {
        let tables = scan(b"[^1]: note\n", Extension::FOOTNOTES).unwrap();
        let fnote = tables.lookup_footnote(b"1").unwrap();
        assert_eq!(fnote.contents, b"note");
        assert!(!fnote.used);
    }

    #[test]
    fn smoke_test_footnotes_disabled_falls_through_as_text() {
        let tables = scan(b"[^1]: note\n", Extension::empty()).unwrap();
        assert!(tables.footnotes_found.is_empty());
        assert!(tables.document.as_slice().starts_with(b"[^1]: note"));
    }

    #[test]
    fn smoke_test_use_footnote_assigns_sequential_numbers() {
        let mut tables = scan(b"[^a]: x\n[^b]: y\n", Extension::FOOTNOTES).unwrap();
        assert_eq!(tables.use_footnote(b"b"), Some(1));
        assert_eq!(tables.use_footnote(b"a"), Some(2));
        // second use of the same label doesn't bump the number
        assert_eq!(tables.use_footnote(b"b"), Some(1));
    }

    #[test]
    fn smoke_test_tab_expansion_to_4_column_stops() {
        let tables = scan(b"a\tb\n", Extension::empty()).unwrap();
        assert_eq!(tables.document.as_slice(), b"a   b\n");
    }

    #[test]
    fn smoke_test_crlf_normalized_to_lf() {
        let tables = scan(b"one\r\ntwo\r\n", Extension::empty()).unwrap();
        assert_eq!(tables.document.as_slice(), b"one\ntwo\n");
    }

    #[test]
    fn smoke_test_bom_is_skipped() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"hi\n");
        let tables = scan(&data, Extension::empty()).unwrap();
        assert_eq!(tables.document.as_slice(), b"hi\n");
    }

    #[test]
    fn smoke_test_reference_scan_is_order_independent() {
        let before = scan(b"[y]: /x\nuse [t][y]\n", Extension::empty()).unwrap();
        let after = scan(b"use [t][y]\n\n[y]: /x\n", Extension::empty()).unwrap();
        assert_eq!(before.lookup_ref(b"y").unwrap().link, after.lookup_ref(b"y").unwrap().link);
    }
}
