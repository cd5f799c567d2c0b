#![no_main]

use std::cmp::Ordering;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scanward_scanner::matcher::version::compare;

#[derive(Arbitrary, Debug)]
struct VersionPair {
    a: String,
    b: String,
}

fuzz_target!(|input: VersionPair| {
    if input.a.len() > 64 || input.b.len() > 64 {
        return;
    }
    let (a, b) = (input.a.as_str(), input.b.as_str());

    assert_eq!(compare(a, a), Ordering::Equal);
    assert_eq!(compare(a, b), compare(b, a).reverse());
});
