//! Bare URL / `www.` / email autolink scanner (§4.2).
//!
//! Three entry points -- [`scan_url`], [`scan_www`], [`scan_email`] -- each
//! look at `data[offset..]` and report how many bytes make up the match and
//! how many bytes of *already emitted* text the caller must rewind because
//! they were the opening segment of the match (e.g. the `http` of a bare
//! `http://...` URL that the inline loop had already copied to the output
//! buffer one byte at a time before the `:` trigger fired).

const SCHEMES: &[&str] = &["http://", "https://", "ftp://", "mailto:"];

/// Result of a successful autolink scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutolinkMatch {
    /// Number of bytes consumed starting at the scan offset.
    pub len: usize,
    /// Number of already-emitted bytes the caller should remove from its
    /// output buffer (the matched text's opening segment).
    pub rewind: usize,
}

fn is_url_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && b != b'<' && b != b'>'
}

/// Trims trailing punctuation that is conventionally not part of a URL
/// (closing sentence punctuation, unmatched closing parens).
fn trim_trailing(data: &[u8], mut end: usize, start: usize) -> usize {
    while end > start {
        match data[end - 1] {
            b'.' | b',' | b';' | b':' | b'!' | b'?' | b'\'' | b'"' => end -= 1,
            b')' => {
                let opens = data[start..end].iter().filter(|&&b| b == b'(').count();
                let closes = data[start..end].iter().filter(|&&b| b == b')').count();
                if closes > opens {
                    end -= 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    end
}

/// Scans forward from `offset` for a `scheme://host/path`-shaped URL.
/// `offset` must point at the first byte the scheme can start no earlier
/// than; `rewind` is how far back the scheme itself already started being
/// emitted (the active-character dispatch fires on `:`, well after `http`
/// has already been copied as plain text).
pub fn scan_url(data: &[u8], offset: usize) -> Option<AutolinkMatch> {
    for scheme in SCHEMES {
        if *scheme == "mailto:" {
            continue; // handled by scan_email
        }
        let scheme_bytes = scheme.as_bytes();
        let scheme_start = offset.checked_sub(scheme_bytes.len() - 1)?;
        if data.len() < scheme_start + scheme_bytes.len() {
            continue;
        }
        if !data[scheme_start..].starts_with(scheme_bytes) {
            continue;
        }
        let host_start = scheme_start + scheme_bytes.len();
        let mut end = host_start;
        while end < data.len() && is_url_byte(data[end]) {
            end += 1;
        }
        if end == host_start {
            continue;
        }
        end = trim_trailing(data, end, host_start);
        if end <= host_start {
            continue;
        }
        return Some(AutolinkMatch {
            len: end - offset,
            rewind: offset - scheme_start,
        });
    }
    None
}

/// Scans a bare `www.host/path` reference, triggered on the leading `w`.
pub fn scan_www(data: &[u8], offset: usize) -> Option<AutolinkMatch> {
    if !data[offset..].starts_with(b"www.") {
        return None;
    }
    let mut end = offset + 4;
    if end >= data.len() || !data[end].is_ascii_alphanumeric() {
        return None;
    }
    while end < data.len() && is_url_byte(data[end]) {
        end += 1;
    }
    end = trim_trailing(data, end, offset);
    Some(AutolinkMatch {
        len: end - offset,
        rewind: 0,
    })
}

fn is_email_atext(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-/=?^_`{|}~.".contains(&b)
}

/// Scans backward and forward from an `@` trigger byte for a bare email
/// address, e.g. `name@example.com`.
pub fn scan_email(data: &[u8], at_offset: usize) -> Option<AutolinkMatch> {
    if data.get(at_offset) != Some(&b'@') {
        return None;
    }

    let mut start = at_offset;
    while start > 0 && is_email_atext(data[start - 1]) {
        start -= 1;
    }
    if start == at_offset {
        return None;
    }

    let mut end = at_offset + 1;
    let domain_start = end;
    while end < data.len() && (data[end].is_ascii_alphanumeric() || data[end] == b'-' || data[end] == b'.')
    {
        end += 1;
    }
    if end == domain_start || !data[domain_start..end].contains(&b'.') {
        return None;
    }
    end = trim_trailing(data, end, domain_start);

    Some(AutolinkMatch {
        len: end - start,
        rewind: at_offset - start,
    })
}

/// Whitelisted schemes for "safe" outbound links (§4.2): a known scheme, a
/// `mailto:` address, or a scheme-relative (`//host/path`) reference.
pub fn is_safe(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("//") {
        return true;
    }
    for scheme in SCHEMES {
        if lower.starts_with(scheme) {
            return true;
        }
    }
    // Relative references (no `scheme:` prefix at all) are safe; anything
    // else with a colon before the first slash is an unknown/unsafe scheme
    // (e.g. `javascript:`).
    match lower.find(':') {
        None => true,
        Some(colon) => lower[..colon].contains('/'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_scan_url_matches_http() {
        let data = b"see http://example.com/path. done";
        let colon = data.iter().position(|&b| b == b':').unwrap();
        let m = scan_url(data, colon).expect("expected a match");
        let matched = &data[colon - m.rewind..colon + m.len];
        assert_eq!(matched, b"http://example.com/path");
    }

    #[test]
    fn smoke_test_scan_url_trims_trailing_punctuation() {
        let data = b"http://example.com).";
        let colon = 4;
        let m = scan_url(data, colon).unwrap();
        let matched = &data[colon - m.rewind..colon + m.len];
        assert_eq!(matched, b"http://example.com");
    }

    #[test]
    fn smoke_test_scan_www() {
        let data = b"www.example.com/foo,";
        let m = scan_www(data, 0).unwrap();
        assert_eq!(&data[..m.len], b"www.example.com/foo");
    }

    #[test]
    fn smoke_test_scan_email() {
        let data = b"contact me@example.com today";
        let at = data.iter().position(|&b| b == b'@').unwrap();
        let m = scan_email(data, at).unwrap();
        let matched = &data[at - m.rewind..at + m.len];
        assert_eq!(matched, b"me@example.com");
    }

    #[test]
    fn smoke_test_scan_email_rejects_bare_at() {
        let data = b"@nobody";
        assert!(scan_email(data, 0).is_none());
    }

    #[test]
    fn smoke_test_is_safe() {
        assert!(is_safe("http://example.com"));
        assert!(is_safe("https://example.com"));
        assert!(is_safe("mailto:me@example.com"));
        assert!(is_safe("//example.com/protocol-relative"));
        assert!(is_safe("/relative/path"));
        assert!(!is_safe("javascript:alert(1)"));
    }
}
