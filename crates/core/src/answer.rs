//! Answer checking: normalized equality, next-word hints and a positional
//! per-word diff.
//!
//! Normalization trims, lower-cases and strips commas and periods. Nothing
//! else is forgiven: internal whitespace and other punctuation still count.

use std::fmt;

/// Normalize an answer for comparison.
#[must_use]
pub fn clean(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ',' | '.'))
        .collect()
}

/// Guidance for an answer that did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// First expected word the learner has missing or wrong.
    NextWord(String),
    /// Every expected word is already there in order.
    Incomplete,
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hint::NextWord(word) => write!(f, "Hint: The next word is '{word}'"),
            Hint::Incomplete => {
                f.write_str("Your answer is correct, but incomplete. Try adding more words.")
            }
        }
    }
}

/// One submitted word and whether it sits at the right position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffToken {
    pub text: String,
    pub matches: bool,
}

/// Verdict for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    /// `None` when the answer is correct.
    pub hint: Option<Hint>,
    pub diff: Vec<DiffToken>,
}

/// Judge `submitted` against `expected`.
#[must_use]
pub fn evaluate(submitted: &str, expected: &str) -> Evaluation {
    let cleaned_submitted = clean(submitted);
    let cleaned_expected = clean(expected);
    let is_correct = cleaned_submitted == cleaned_expected;

    Evaluation {
        is_correct,
        hint: (!is_correct).then(|| hint(&cleaned_submitted, &cleaned_expected)),
        diff: diff(submitted, expected),
    }
}

/// Hint for two already cleaned answers.
#[must_use]
pub fn hint(cleaned_submitted: &str, cleaned_expected: &str) -> Hint {
    let submitted: Vec<&str> = cleaned_submitted.split_whitespace().collect();

    cleaned_expected
        .split_whitespace()
        .enumerate()
        .find(|(i, word)| submitted.get(*i) != Some(word))
        .map_or(Hint::Incomplete, |(_, word)| Hint::NextWord(word.to_owned()))
}

/// Positional diff: submitted word `i` matches when expected word `i` exists
/// and equals it after cleaning. No alignment is attempted, so one inserted
/// or missing word marks every later word as a mismatch.
#[must_use]
pub fn diff(submitted: &str, expected: &str) -> Vec<DiffToken> {
    let cleaned_expected = clean(expected);
    let expected: Vec<&str> = cleaned_expected.split_whitespace().collect();

    submitted
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| DiffToken {
            text: word.to_owned(),
            matches: expected.get(i).is_some_and(|exp| clean(word) == *exp),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(tokens: &[DiffToken]) -> Vec<bool> {
        tokens.iter().map(|t| t.matches).collect()
    }

    #[test]
    fn casing_whitespace_and_punctuation_are_ignored() {
        let eval = evaluate("Der Hund.", "der hund");
        assert!(eval.is_correct);
        assert!(eval.hint.is_none());

        assert!(evaluate("  ich, gehe.  ", "Ich gehe").is_correct);
    }

    #[test]
    fn internal_spacing_still_counts() {
        assert!(!evaluate("der  hund", "der hund").is_correct);
    }

    #[test]
    fn hint_is_first_missing_word() {
        let eval = evaluate("ich gehe", "ich gehe nach hause");
        assert!(!eval.is_correct);
        assert_eq!(eval.hint, Some(Hint::NextWord("nach".into())));
    }

    #[test]
    fn hint_is_first_wrong_word() {
        assert_eq!(
            hint("ich laufe nach hause", "ich gehe nach hause"),
            Hint::NextWord("gehe".into())
        );
    }

    #[test]
    fn hint_for_surplus_words_is_incomplete() {
        assert_eq!(hint("der hund bellt", "der hund"), Hint::Incomplete);
    }

    #[test]
    fn hint_messages() {
        assert_eq!(
            Hint::NextWord("nach".into()).to_string(),
            "Hint: The next word is 'nach'"
        );
        assert!(Hint::Incomplete.to_string().contains("incomplete"));
    }

    #[test]
    fn diff_marks_positions() {
        let tokens = diff("Ich laufe nach Hause.", "ich gehe nach hause");
        assert_eq!(flags(&tokens), vec![true, false, true, true]);
        assert_eq!(tokens[3].text, "Hause.");
    }

    #[test]
    fn diff_is_positional_not_aligned() {
        let tokens = diff("ich gehe heute nach hause", "ich gehe nach hause");
        assert_eq!(flags(&tokens), vec![true, true, false, false, false]);
    }

    #[test]
    fn diff_of_empty_submission_is_empty() {
        assert!(diff("   ", "der hund").is_empty());
        assert_eq!(evaluate("", "der hund").hint, Some(Hint::NextWord("der".into())));
    }
}
