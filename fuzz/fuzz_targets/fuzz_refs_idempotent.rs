#![no_main]

//! Pass 1 should be idempotent: rerunning the reference scanner over its
//! own output document is a no-op (§8 round-trip property).

use libfuzzer_sys::fuzz_target;
use marrow_core::{refs, Extension};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(first) = refs::scan(data, Extension::FOOTNOTES) else {
        return;
    };
    let Ok(second) = refs::scan(first.document.as_slice(), Extension::FOOTNOTES) else {
        return;
    };
    assert_eq!(first.document.as_slice(), second.document.as_slice());
});
