//! Property tests over the persisted search tree (P1, P2, P5, P6, P7).

use proptest::prelude::*;

use anacryptogram::node::{NodeRecord, Sentence};
use anacryptogram::oracle::LengthPenaltyOracle;
use anacryptogram::puzzle::PuzzleConfig;
use anacryptogram::search::{self, SearchConfig};
use anacryptogram::store::Store;
use anacryptogram_vocab::{LetterBank, Token, Vocabulary};

fn tiny_puzzle(bank_text: &str) -> PuzzleConfig {
    PuzzleConfig {
        name: "test".to_string(),
        bank: LetterBank::from_str(bank_text),
        required_first_token: None,
        required_punctuation: vec![],
        longest_word_len: None,
        second_longest_word_len: None,
        longest_words_adjacent: false,
        required_suffix: None,
        forbidden_tokens: vec![],
    }
}

fn tiny_vocab() -> Vocabulary {
    Vocabulary::from_tokens(["a", "b", "ab"].iter().map(|w| Token::new(*w).unwrap())).unwrap()
}

fn explored_store(seed: u64, iterations: u64) -> (Store, PuzzleConfig) {
    let mut store = Store::open_in_memory().unwrap();
    let puzzle = tiny_puzzle("ab");
    let vocabulary = tiny_vocab();
    let oracle = LengthPenaltyOracle;
    search::run(
        &mut store,
        &puzzle,
        &vocabulary,
        &oracle,
        SearchConfig {
            temperature: 1.0,
            max_iterations: iterations,
        },
        seed,
    )
    .unwrap();
    (store, puzzle)
}

fn all_sentences(store: &Store) -> Vec<NodeRecord> {
    // Every canonical sentence reachable from the tiny "ab" vocabulary, used as the candidate set
    // for a manual scan since `Store` has no "list everything" query.
    let candidates = ["", "a", "b", "ab", "a b", "b a"];
    candidates.iter().filter_map(|c| store.get(c).unwrap()).collect()
}

#[test]
fn p1_bank_equals_puzzle_bank_minus_token_multiset() {
    let (store, puzzle) = explored_store(7, 200);
    for record in all_sentences(&store) {
        let sentence = Sentence::parse(&record.sentence);
        let bank = sentence.bank(&puzzle.bank).expect("every stored sentence must be supportable");
        for (c, n) in bank.iter() {
            assert!(n <= puzzle.bank.count_of(c), "bank count for `{c}` exceeds the puzzle bank");
        }
        let mut expected = puzzle.bank.clone();
        for token in sentence.tokens() {
            expected = expected.subtract(token.as_str()).unwrap();
        }
        assert_eq!(bank, expected);
    }
}

#[test]
fn p2_cumulative_score_is_additive_along_the_path() {
    let (store, _puzzle) = explored_store(11, 200);
    for record in all_sentences(&store) {
        let sentence = Sentence::parse(&record.sentence);
        if sentence.is_root() {
            assert_eq!(record.cumulative_score, record.score);
            continue;
        }
        let parent = store.get(&sentence.parent().canonical()).unwrap().expect("parent persisted");
        assert!(
            (record.cumulative_score - (parent.cumulative_score + record.score)).abs() < 1e-9,
            "cumulative_score not additive for `{}`",
            record.sentence
        );
    }
}

#[test]
fn p5_hard_valid_terminal_has_empty_bank_and_full_token_multiset() {
    let (store, puzzle) = explored_store(3, 200);
    let vocabulary = tiny_vocab();
    let validator = anacryptogram::Validator::new(&puzzle, &vocabulary);
    for sentence_text in ["a b", "b a", "ab"] {
        let Some(_) = store.get(sentence_text).unwrap() else {
            continue;
        };
        let sentence = Sentence::parse(sentence_text);
        let outcome = validator.hard_validate(&sentence).unwrap();
        if matches!(outcome, anacryptogram::validator::Outcome::ValidTerminal) {
            let bank = sentence.bank(&puzzle.bank).unwrap();
            assert!(bank.is_empty());

            let mut rebuilt = LetterBank::from_str("");
            for token in sentence.tokens() {
                rebuilt = rebuilt.add(token.as_str());
            }
            assert_eq!(rebuilt, puzzle.bank);
        }
    }
}

#[test]
fn p6_trim_removes_only_strict_descendants() {
    let (mut store, _) = explored_store(5, 200);
    assert!(store.get("a b").unwrap().is_some());

    let deleted = store.trim("a", None).unwrap();
    assert!(deleted >= 1);
    assert!(store.get("a").unwrap().is_some(), "trim target itself must survive");
    assert!(store.get("").unwrap().is_some(), "ancestors of the trim target must survive");
    assert!(store.get("a b").unwrap().is_none(), "strict descendants must be gone");
    assert!(store.get("b").unwrap().is_some(), "unrelated siblings must survive");
    assert!(store.get("b a").unwrap().is_some(), "unrelated subtrees must survive");
}

#[test]
fn p7_replaying_the_same_seed_on_a_fresh_store_reproduces_identical_state() {
    let (first, _puzzle) = explored_store(99, 50);
    let (second, _) = explored_store(99, 50);

    for sentence_text in ["", "a", "b", "ab", "a b", "b a"] {
        let a = first.get(sentence_text).unwrap();
        let b = second.get(sentence_text).unwrap();
        assert_eq!(a.map(|r| r.status), b.as_ref().map(|r| r.status));
        if let (Some(a), Some(b)) = (first.get(sentence_text).unwrap(), second.get(sentence_text).unwrap()) {
            assert_eq!(a.score, b.score);
            assert_eq!(a.cumulative_score, b.cumulative_score);
            assert!((a.mean_descendant_score - b.mean_descendant_score).abs() < 1e-9);
            assert_eq!(a.visits, b.visits);
        }
    }
}

proptest! {
    // P3 restated against the crate's own LetterBank re-export, independent of the vocab crate's
    // own proptest coverage: subtract/add stay inverse for arbitrary ASCII words.
    #[test]
    fn p3_subtract_is_the_inverse_of_add(word in "[a-z]{1,10}", extra in "[a-z]{0,10}") {
        let bank = LetterBank::from_str(&format!("{word}{extra}"));
        let reduced = bank.subtract(&word).unwrap();
        prop_assert_eq!(reduced.add(&word), bank);
    }

    // P4: every token `playable` returns is a vocabulary member whose letters fit the bank.
    #[test]
    fn p4_playable_tokens_fit_the_bank(bank_text in "[a-z]{0,12}") {
        let vocabulary = tiny_vocab();
        let bank = LetterBank::from_str(&bank_text);
        for token in vocabulary.playable(&bank) {
            prop_assert!(vocabulary.contains(&token));
            prop_assert!(bank.contains(token.as_str()));
        }
    }
}

