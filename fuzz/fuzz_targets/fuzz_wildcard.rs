#![no_main]

use libfuzzer_sys::fuzz_target;
use nodex::fulltext::wildcard::{has_wildcard, to_regex};

fuzz_target!(|data: &str| {
    // Every translated pattern must compile, or be rejected without panicking
    let _ = has_wildcard(data);
    let _ = regex::Regex::new(&to_regex(data));
});
