//! The scoring oracle (C3): a pure function from sentence to real score.
//!
//! The search core never depends on any particular oracle's internals, only on the contract:
//! `score <= 0.0`, deterministic for a fixed configuration, and total (every sentence gets some
//! score, even a very bad one). A neural-network scorer is one conceivable implementation; this
//! crate ships a log-frequency model (`scoring::FrequencyOracle`) and a couple of stubs for
//! tests.

use crate::node::Sentence;

/// A pure scoring function over sentences.
///
/// Implementations MUST be deterministic: the same sentence, scored twice against the same
/// `Oracle` value, must return bit-identical results.
pub trait Oracle {
    /// Scores `sentence`. The result is `<= 0.0`; more negative means less likely.
    fn score(&self, sentence: &Sentence) -> f64;
}

/// A stub oracle that scores a sentence by its negative token count.
///
/// Used in the test suite and in the scenarios of the core specification (S1–S6): cheap, total,
/// and trivially deterministic, so tests can assert exact search-tree shapes without depending on
/// a real language model.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthPenaltyOracle;

impl Oracle for LengthPenaltyOracle {
    fn score(&self, sentence: &Sentence) -> f64 {
        -(sentence.tokens().len() as f64)
    }
}

/// A stub oracle returning the same score for every sentence. Used to test that
/// `mean_descendant_score` behaves as a plain running mean (S6).
#[derive(Clone, Copy, Debug)]
pub struct ConstantOracle(pub f64);

impl Oracle for ConstantOracle {
    fn score(&self, _sentence: &Sentence) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anacryptogram_vocab::Token;

    #[test]
    fn length_penalty_scores_by_token_count() {
        let oracle = LengthPenaltyOracle;
        let s = Sentence::from_tokens(vec![Token::new("I").unwrap(), Token::new("am").unwrap()]);
        assert_eq!(oracle.score(&s), -2.0);
    }

    #[test]
    fn constant_oracle_ignores_input() {
        let oracle = ConstantOracle(-3.5);
        let s = Sentence::root();
        let t = Sentence::from_tokens(vec![Token::new("hi").unwrap()]);
        assert_eq!(oracle.score(&s), -3.5);
        assert_eq!(oracle.score(&t), -3.5);
    }
}
