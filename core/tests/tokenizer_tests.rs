use docsearch_core::tokenizer::{tokenize, Tokenizer, TokenizerConfig};

#[test]
fn it_normalizes_compatibility_forms() {
    let words = tokenize("Ｎａｐａｒｉ ﬁlter ＳＰＯＴ");
    assert_eq!(words, vec!["napari", "filter", "spot"]);
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"quick".to_string()));
}

#[test]
fn it_keeps_digits_inside_terms() {
    assert_eq!(tokenize("2D/3D+t images"), vec!["2d", "3d", "images"]);
}

#[test]
fn empty_and_noise_inputs_yield_nothing() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   ,;--!! ").is_empty());
    assert!(tokenize("the a is to of and in it").is_empty());
    assert!(tokenize("x y z").is_empty());
}

#[test]
fn tokenization_is_idempotent() {
    let samples = [
        "Welcome to napari-stracking’s documentation!",
        "Step 1: run the DoG detector on 2D+t data, then (again) on 3D.",
        "İstanbul ÆSIR straße ﬁne-tuning",
        "",
    ];
    let tok = Tokenizer::default();
    for s in samples {
        let once = tok.tokenize(s);
        let twice = tok.tokenize(&once.join(" "));
        assert_eq!(once, twice, "input {s:?}");
    }
}

#[test]
fn min_length_is_configurable() {
    let tok = Tokenizer::new(TokenizerConfig { min_term_len: 4, ..Default::default() });
    assert_eq!(tok.tokenize("log dog detector 100"), vec!["detector", "100"]);
}
