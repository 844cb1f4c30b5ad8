//! Property tests for the recursive chunker.

use docrag::{Chunker, RecursiveChunker};
use proptest::prelude::*;

fn chars(s: &str) -> usize {
    s.chars().count()
}

/// Text built from the characters the separators care about, plus some
/// multi-byte letters so byte and character lengths diverge.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zé漢 .\n]{0,400}"
}

fn arb_chunker() -> impl Strategy<Value = RecursiveChunker> {
    (1usize..80, 0usize..40).prop_map(|(size, overlap)| RecursiveChunker::new(size, overlap))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn chunks_respect_size_limit(text in arb_text(), chunker in arb_chunker()) {
        for chunk in chunker.split(&text) {
            prop_assert!(chars(&chunk) <= chunker.chunk_size(), "chunk too long: {chunk:?}");
            prop_assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn each_chunk_starts_with_tail_of_previous(text in arb_text(), chunker in arb_chunker()) {
        let spans = chunker.split_spans(&text);
        for pair in spans.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            prop_assert!(next.start >= prev.start);
            prop_assert!(next.start <= prev.end);

            let shared = &text[next.start..prev.end];
            let expected = chunker.chunk_overlap().min(chars(&text[prev.clone()]));
            prop_assert_eq!(chars(shared), expected);
            prop_assert!(text[prev.clone()].ends_with(shared));
            prop_assert!(text[next.clone()].starts_with(shared));
        }
    }

    #[test]
    fn stripping_overlap_reconstructs_input(text in arb_text(), chunker in arb_chunker()) {
        prop_assume!(!text.trim().is_empty());
        let spans = chunker.split_spans(&text);
        prop_assert_eq!(spans.first().map(|s| s.start), Some(0));

        let mut rebuilt = String::new();
        let mut covered = 0;
        for span in &spans {
            rebuilt.push_str(&text[covered.max(span.start)..span.end]);
            covered = span.end;
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn blank_input_yields_no_chunks(text in "[ \n\t]{0,30}", chunker in arb_chunker()) {
        prop_assert!(chunker.split(&text).is_empty());
    }
}

#[test]
fn paragraphs_are_preferred_split_points() {
    let text = format!("{}\n\n{}", "a".repeat(300), "b".repeat(300));
    let chunks = RecursiveChunker::new(500, 50).split(&text);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], format!("{}\n\n", "a".repeat(300)));
    assert!(chunks[1].ends_with(&"b".repeat(300)));
    assert_eq!(chars(&chunks[1]), 350);
}

#[test]
fn unbroken_text_falls_back_to_characters() {
    let text = "x".repeat(1000);
    let chunks = RecursiveChunker::new(100, 10).split(&text);
    assert!(chunks.iter().all(|c| chars(c) <= 100));
    assert_eq!(chunks[0].len(), 90);
    assert_eq!(chunks.len(), 12);
}

#[test]
fn custom_separators_are_used() {
    let chunker = RecursiveChunker::new(6, 0).with_separators(["|", ""]);
    assert_eq!(chunker.split("abc|def|ghi"), vec!["abc|", "def|", "ghi"]);
}
