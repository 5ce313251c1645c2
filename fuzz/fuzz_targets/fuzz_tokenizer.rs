#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nodex::fulltext::{FtMatches, FtOptions, TokenList, Tokenizer, WildcardCache};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    term: &'a [u8],
    text: &'a [u8],
    case_sensitive: bool,
    diacritics_sensitive: bool,
    stemming: bool,
    fast: bool,
}

fuzz_target!(|input: Input<'_>| {
    // Tokenizing and matching arbitrary bytes must not panic
    let opts = FtOptions {
        case_sensitive: input.case_sensitive,
        diacritics_sensitive: input.diacritics_sensitive,
        stemming: input.stemming,
        ..FtOptions::default()
    };
    let _ = Tokenizer::new(input.term, &opts, input.fast).count();

    let tokens = TokenList::new(input.text, &opts);
    let mut matches = FtMatches::new(1);
    let mut cache = WildcardCache::new();
    let _ = opts.contains(input.term, &tokens, &mut matches, input.fast, &mut cache);
});
