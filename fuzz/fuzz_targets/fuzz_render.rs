#![no_main]

//! Feeds arbitrary bytes and a random extension/option combination into
//! `render` and asserts only what §8's fuzz properties promise: no
//! panic, no allocation past the 32 MiB ceiling, and termination.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use marrow_core::{render, Buffer, Extension, Html, RenderOptions};

const ALLOC_CEILING: usize = 32 * 1024 * 1024;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    extensions: u32,
    options: u32,
    nesting: u8,
    document: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    if input.document.len() > 1024 * 1024 {
        return;
    }

    let extensions = Extension::from_bits_truncate(input.extensions);
    let options = RenderOptions::from_bits_truncate(input.options);
    let nesting = (input.nesting as usize).clamp(1, 64);

    let mut out = Buffer::new(input.document.len().max(64));
    let mut html = Html::new(options);
    let _ = render(&mut out, &input.document, &mut html, extensions, nesting);

    assert!(out.len() <= ALLOC_CEILING, "output exceeded the allocation ceiling");
});
