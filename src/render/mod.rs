//! The [`Render`] trait: the abstract renderer contract the parser drives
//! (§6). All methods have default implementations, split the same way the
//! historical library split "registered" from "unregistered" callbacks:
//!
//! | kind  | default action                         |
//! | ----- | --------------------------------------- |
//! | block | write "MISSING <NAME> HANDLER" to output |
//! | span  | return `false` (no match, emit literally) |
//! | misc  | pass content through verbatim          |
//!
//! Because the parser borrows `&mut dyn Render` for the span of one
//! `render` call rather than storing an opaque pointer, there is no
//! `opaque_user_data` parameter anywhere in this trait (§9).

pub mod html;

use crate::buffer::Buffer;
use crate::flags::{AutolinkKind, ListFlags, TableFlags};

/// Implementors convert the parser's block/inline/misc events into a
/// target serialization. See the module docs for the default-behavior
/// split between block, span, and misc callbacks.
#[allow(unused_variables)]
pub trait Render {
    // ---- block-level: default is a visible "missing handler" marker ----

    fn blockcode(&mut self, output: &mut Buffer, text: &[u8], lang: &[u8]) {
        let _ = output.write_str("MISSING BLOCKCODE HANDLER\n");
    }

    fn blockquote(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.write_str("MISSING BLOCKQUOTE HANDLER\n");
    }

    fn blockhtml(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.write_str("MISSING BLOCKHTML HANDLER\n");
    }

    fn header(&mut self, output: &mut Buffer, text: &[u8], level: u32) {
        let _ = output.write_str("MISSING HEADER HANDLER\n");
    }

    fn hrule(&mut self, output: &mut Buffer) {
        let _ = output.write_str("MISSING HRULE HANDLER\n");
    }

    fn list(&mut self, output: &mut Buffer, text: &[u8], flags: ListFlags) {
        let _ = output.write_str("MISSING LIST HANDLER\n");
    }

    fn listitem(&mut self, output: &mut Buffer, text: &[u8], flags: ListFlags) {
        let _ = output.write_str("MISSING LISTITEM HANDLER\n");
    }

    fn paragraph(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.write_str("MISSING PARAGRAPH HANDLER\n");
    }

    fn table(&mut self, output: &mut Buffer, content: &[u8]) {
        let _ = output.write_str("MISSING TABLE HANDLER\n");
    }

    fn table_row(&mut self, output: &mut Buffer, content: &[u8]) {
        let _ = output.write_str("MISSING TABLE_ROW HANDLER\n");
    }

    fn table_cell(&mut self, output: &mut Buffer, content: &[u8], flags: TableFlags) {
        let _ = output.write_str("MISSING TABLE_CELL HANDLER\n");
    }

    fn footnotes(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.write_str("MISSING FOOTNOTES HANDLER\n");
    }

    fn footnote_def(&mut self, output: &mut Buffer, text: &[u8], num: usize) {
        let _ = output.write_str("MISSING FOOTNOTE_DEF HANDLER\n");
    }

    // ---- inline: default is "no match", cursor backs up one byte ----

    fn autolink(&mut self, output: &mut Buffer, link: &[u8], kind: AutolinkKind) -> bool {
        false
    }

    fn codespan(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn double_emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn image(&mut self, output: &mut Buffer, link: &[u8], title: &[u8], alt: &[u8]) -> bool {
        false
    }

    fn linebreak(&mut self, output: &mut Buffer) -> bool {
        false
    }

    fn link(&mut self, output: &mut Buffer, link: &[u8], title: &[u8], content: &[u8]) -> bool {
        false
    }

    fn raw_html_tag(&mut self, output: &mut Buffer, tag: &[u8]) -> bool {
        false
    }

    fn triple_emphasis(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn ins(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn strikethrough(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn superscript(&mut self, output: &mut Buffer, text: &[u8]) -> bool {
        false
    }

    fn footnote_ref(&mut self, output: &mut Buffer, num: usize) -> bool {
        false
    }

    // ---- misc: default is pass-through ----

    fn entity(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(text);
    }

    fn normal_text(&mut self, output: &mut Buffer, text: &[u8]) {
        let _ = output.put(text);
    }

    fn doc_header(&mut self, output: &mut Buffer) {}

    fn doc_footer(&mut self, output: &mut Buffer) {}

    fn outline(&mut self, output: &mut Buffer) {}
}
