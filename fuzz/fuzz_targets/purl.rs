#![no_main]

use libfuzzer_sys::fuzz_target;
use scanward_scanner::decoder::purl::Purl;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Some(purl) = Purl::parse(input) {
            assert!(!purl.name.is_empty());
        }
    }
});
