#![no_main]

use libfuzzer_sys::fuzz_target;
use scanward_scanner::{AutoDecoder, SbomDecoder};

fuzz_target!(|data: &[u8]| {
    let decoder = AutoDecoder::default();
    if let Ok(decoded) = decoder.decode(data) {
        // 디코딩된 패키지는 항상 이름을 가져야 함
        for package in &decoded.packages {
            assert!(!package.name.is_empty());
        }
    }
});
