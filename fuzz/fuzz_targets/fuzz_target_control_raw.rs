#![no_main]

use dpkg_engine::control::RawParagraph;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = RawParagraph::parse(data);
});
