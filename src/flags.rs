//! Extension and render-option bitsets.
//!
//! Mirrors the historical library's `MKDEXT_*` / `HTML_*` flag words one
//! for one; see the `Extension` and `html::Flags` definitions this crate
//! descends from.

use bitflags::bitflags;

bitflags! {
    /// Opt-in parser extensions. All default off, matching the historical
    /// library's conservative defaults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Extension: u32 {
        /// Don't parse emphasis inside of words, e.g. `foo_bar_baz` won't
        /// emphasize the `bar`.
        const NO_INTRA_EMPHASIS = 1 << 0;
        /// Process pipe-table syntax.
        const TABLES            = 1 << 1;
        /// Process fenced code blocks (``` or ~~~).
        const FENCED_CODE       = 1 << 2;
        /// Automatically link bare URLs and emails.
        const AUTOLINK          = 1 << 3;
        /// Enable strikethrough syntax, `~~struck~~`.
        const STRIKETHROUGH     = 1 << 4;
        /// Enable insertion syntax, `++inserted++`.
        const INS               = 1 << 5;
        /// Paragraphs may be interrupted by list/HTML/fence starts without
        /// a preceding blank line.
        const LAX_SPACING       = 1 << 6;
        /// Require a space after `#` in ATX headers.
        const SPACE_HEADERS     = 1 << 7;
        /// Process superscript syntax, `^x` and `^(x y)`.
        const SUPERSCRIPT       = 1 << 8;
        /// Process footnote definitions and references.
        const FOOTNOTES         = 1 << 9;
    }
}

bitflags! {
    /// Flags to control the behavior of the reference HTML renderer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RenderOptions: u32 {
        /// Ignore raw HTML blocks and spans entirely.
        const SKIP_HTML   = 1 << 0;
        /// Ignore `<style>` blocks.
        const SKIP_STYLE  = 1 << 1;
        /// Ignore links (render the link text only).
        const SKIP_LINKS  = 1 << 2;
        /// Ignore images.
        const SKIP_IMAGES = 1 << 3;
        /// Expand tabs in code blocks to 4-column stops.
        const EXPAND_TABS = 1 << 4;
        /// Gate link/image URLs through `autolink::is_safe`.
        const SAFELINK    = 1 << 5;
        /// Accumulate a table of contents from headers.
        const TOC         = 1 << 6;
        /// Insert `<br>` for every newline inside a paragraph.
        const HARD_WRAP   = 1 << 7;
        /// Emit self-closing XHTML tags instead of HTML.
        const USE_XHTML   = 1 << 8;
        /// Force-escape all raw HTML; overrides the SKIP_* flags.
        const ESCAPE      = 1 << 9;
        /// Wrap headers in `<section>`, closed by the final `outline` call.
        const OUTLINE     = 1 << 10;
    }
}

bitflags! {
    /// Flags describing a list or list item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ListFlags: u32 {
        /// An ordered list or list item (`1.` rather than `-`/`*`/`+`).
        const ORDERED = 1 << 0;
        /// A list item containing block-level content (set when any
        /// interior blank line was seen during parsing).
        const BLOCK   = 1 << 1;
    }
}

/// Column alignment for a pipe-table cell, derived from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableAlignment {
    #[default]
    Default,
    Left,
    Center,
    Right,
}

bitflags! {
    /// Per-cell table flags: alignment packed with the header bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TableFlags: u32 {
        const ALIGN_LEFT   = 1 << 0;
        const ALIGN_CENTER = 1 << 1;
        const ALIGN_RIGHT  = 1 << 2;
        const HEADER       = 1 << 3;
    }
}

impl TableFlags {
    pub fn alignment(self) -> TableAlignment {
        if self.contains(TableFlags::ALIGN_LEFT) {
            TableAlignment::Left
        } else if self.contains(TableFlags::ALIGN_CENTER) {
            TableAlignment::Center
        } else if self.contains(TableFlags::ALIGN_RIGHT) {
            TableAlignment::Right
        } else {
            TableAlignment::Default
        }
    }

    pub fn from_alignment(alignment: TableAlignment) -> Self {
        match alignment {
            TableAlignment::Default => TableFlags::empty(),
            TableAlignment::Left => TableFlags::ALIGN_LEFT,
            TableAlignment::Center => TableFlags::ALIGN_CENTER,
            TableAlignment::Right => TableFlags::ALIGN_RIGHT,
        }
    }
}

/// The kind of autolink a span of text resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    NotAutolink,
    Normal,
    Email,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_extension_defaults_to_empty() {
        assert_eq!(Extension::default(), Extension::empty());
    }

    #[test]
    fn smoke_test_table_flags_alignment_roundtrip() {
        for alignment in [
            TableAlignment::Default,
            TableAlignment::Left,
            TableAlignment::Center,
            TableAlignment::Right,
        ] {
            let flags = TableFlags::from_alignment(alignment) | TableFlags::HEADER;
            assert_eq!(flags.alignment(), alignment);
            assert!(flags.contains(TableFlags::HEADER));
        }
    }
}
