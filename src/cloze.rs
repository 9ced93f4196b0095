//! Cloze deletion over free text.
//!
//! [`transform`] blanks every whole-word occurrence of a target word and
//! returns the blanked text together with the answers, numbered in the order
//! they appear. A word is a maximal run of ASCII letters, so "don't" is the two
//! words "don" and "t", and "cat" never matches inside "category".

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("valid word regex"));
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"___\[(\d+)\]___").expect("valid placeholder regex"));

/// Case-folded set of words to blank out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetWordSet {
    words: HashSet<String>,
}

impl TargetWordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TargetWordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One occurrence of a target word, as found during a single scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClozeMatch {
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub idx: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub idx: usize,
    pub word: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClozeResult {
    pub question: String,
    pub ans: Vec<AnswerEntry>,
}

impl ClozeResult {
    pub fn answer(&self, idx: usize) -> Option<&AnswerEntry> {
        // idx is 1-based and gapless, so it doubles as a position
        self.ans
            .get(idx.wrapping_sub(1))
            .filter(|entry| entry.idx == idx)
            .or_else(|| self.ans.iter().find(|entry| entry.idx == idx))
    }

    pub fn blank_count(&self) -> usize {
        self.ans.len()
    }

    /// Puts the answers back into the question.
    ///
    /// For a result produced by [`transform`] this returns the original text,
    /// unless that text already contained `___[N]___` tokens of its own.
    pub fn restore(&self) -> String {
        let mut out = String::with_capacity(self.question.len());
        let mut pos = 0;
        for span in find_placeholders(&self.question) {
            out.push_str(&self.question[pos..span.start]);
            match self.answer(span.idx) {
                Some(entry) => out.push_str(&entry.word),
                None => out.push_str(&self.question[span.start..span.end]),
            }
            pos = span.end;
        }
        out.push_str(&self.question[pos..]);
        out
    }
}

/// A `___[idx]___` token inside a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderSpan {
    pub start: usize,
    pub end: usize,
    pub idx: usize,
}

pub fn placeholder(idx: usize) -> String {
    format!("___[{idx}]___")
}

pub fn find_matches(text: &str, words: &TargetWordSet) -> Vec<ClozeMatch> {
    if words.is_empty() {
        return Vec::new();
    }

    WORD_RE
        .find_iter(text)
        .filter(|token| words.contains(token.as_str()))
        .enumerate()
        .map(|(i, token)| ClozeMatch {
            start: token.start(),
            end: token.end(),
            surface: token.as_str().to_string(),
            idx: i + 1,
        })
        .collect()
}

pub fn transform(text: &str, words: &TargetWordSet) -> ClozeResult {
    let matches = find_matches(text, words);

    let mut question = String::with_capacity(text.len());
    let mut ans = Vec::with_capacity(matches.len());
    let mut pos = 0;

    for m in matches {
        question.push_str(&text[pos..m.start]);
        question.push_str(&placeholder(m.idx));
        pos = m.end;
        ans.push(AnswerEntry {
            idx: m.idx,
            word: m.surface,
        });
    }
    question.push_str(&text[pos..]);

    ClozeResult { question, ans }
}

pub fn find_placeholders(question: &str) -> Vec<PlaceholderSpan> {
    PLACEHOLDER_RE
        .captures_iter(question)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let idx = caps.get(1)?.as_str().parse().ok()?;
            Some(PlaceholderSpan {
                start: whole.start(),
                end: whole.end(),
                idx,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(list: &[&str]) -> TargetWordSet {
        TargetWordSet::new(list.iter().copied())
    }

    fn entry(idx: usize, word: &str) -> AnswerEntry {
        AnswerEntry {
            idx,
            word: word.to_string(),
        }
    }

    #[test]
    fn only_whole_words_are_blanked() {
        let result = transform("category cat catalog", &words(&["cat"]));
        assert_eq!(result.question, "category ___[1]___ catalog");
        assert_eq!(result.ans, vec![entry(1, "cat")]);
    }

    #[test]
    fn matching_ignores_case_but_answers_keep_it() {
        let result = transform("The Cat sat. A cat ran.", &words(&["cat"]));
        assert_eq!(result.question, "The ___[1]___ sat. A ___[2]___ ran.");
        assert_eq!(result.ans, vec![entry(1, "Cat"), entry(2, "cat")]);
    }

    #[test]
    fn target_set_is_case_folded() {
        let result = transform("the cat", &words(&["CAT", "Cat", "cat"]));
        assert_eq!(result.question, "the ___[1]___");
        assert_eq!(words(&["CAT", "Cat", "cat"]).len(), 1);
    }

    #[test]
    fn empty_word_set_leaves_text_alone() {
        let text = "Nothing to see here, 42 times.";
        let result = transform(text, &TargetWordSet::default());
        assert_eq!(result.question, text);
        assert!(result.ans.is_empty());
    }

    #[test]
    fn empty_text_gives_empty_result() {
        let result = transform("", &words(&["cat"]));
        assert_eq!(result, ClozeResult::default());
    }

    #[test]
    fn numbering_follows_the_text_not_the_word_set() {
        let result = transform("fox jumps over dog", &words(&["dog", "fox"]));
        assert_eq!(result.question, "___[1]___ jumps over ___[2]___");
        assert_eq!(result.ans, vec![entry(1, "fox"), entry(2, "dog")]);
    }

    #[test]
    fn adjacent_matches_keep_their_separators() {
        let result = transform("cat,dog\ncat", &words(&["cat", "dog"]));
        assert_eq!(result.question, "___[1]___,___[2]___\n___[3]___");
        assert_eq!(result.restore(), "cat,dog\ncat");
    }

    #[test]
    fn digits_and_non_ascii_letters_split_tokens() {
        let result = transform("cat9 café über", &words(&["cat", "caf", "ber"]));
        assert_eq!(result.question, "___[1]___9 ___[2]___é ü___[3]___");
        assert_eq!(result.restore(), "cat9 café über");
    }

    #[test]
    fn apostrophes_and_hyphens_split_words() {
        let result = transform("I don't know a well-known fact", &words(&["don't", "well"]));
        assert_eq!(result.question, "I don't know a ___[1]___-known fact");

        let result = transform("I don't know", &words(&["don", "t"]));
        assert_eq!(result.question, "I ___[1]___'___[2]___ know");
    }

    #[test]
    fn find_matches_reports_offsets() {
        let found = find_matches("a Dog and a dog", &words(&["dog"]));
        assert_eq!(
            found,
            vec![
                ClozeMatch {
                    start: 2,
                    end: 5,
                    surface: "Dog".to_string(),
                    idx: 1
                },
                ClozeMatch {
                    start: 12,
                    end: 15,
                    surface: "dog".to_string(),
                    idx: 2
                },
            ]
        );
    }

    #[test]
    fn placeholders_are_found_with_their_index() {
        let spans = find_placeholders("x ___[1]___ y ___[12]___ ___[z]___");
        let idxs: Vec<_> = spans.iter().map(|s| s.idx).collect();
        assert_eq!(idxs, vec![1, 12]);
        assert_eq!(spans[0].start, 2);
        assert_eq!(spans[0].end, 11);
    }

    #[test]
    fn answer_lookup_works_for_out_of_order_lists() {
        let result = ClozeResult {
            question: "___[2]___ ___[1]___".to_string(),
            ans: vec![entry(2, "b"), entry(1, "a")],
        };
        assert_eq!(result.answer(1).map(|e| e.word.as_str()), Some("a"));
        assert_eq!(result.answer(3), None);
        assert_eq!(result.answer(0), None);
        assert_eq!(result.restore(), "b a");
    }

    #[test]
    fn result_serializes_to_the_documented_shape() {
        let result = transform("fox", &words(&["fox"]));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "question": "___[1]___",
                "ans": [{ "idx": 1, "word": "fox" }]
            })
        );
    }

    proptest! {
        #[test]
        fn restore_gives_back_the_source(
            text in "[a-zA-Z ,.'\\-0-9\\n]{0,80}",
            targets in proptest::collection::vec("[a-zA-Z]{1,4}", 0..5),
        ) {
            let result = transform(&text, &TargetWordSet::new(&targets));
            prop_assert_eq!(result.restore(), text);
        }

        #[test]
        fn placeholders_and_answers_are_a_bijection(
            text in "[^_\\p{C}]{0,80}",
            targets in proptest::collection::vec("[a-z]{1,3}", 0..6),
        ) {
            let result = transform(&text, &TargetWordSet::new(&targets));
            let in_question: Vec<usize> =
                find_placeholders(&result.question).iter().map(|s| s.idx).collect();
            let in_answers: Vec<usize> = result.ans.iter().map(|a| a.idx).collect();
            let expected: Vec<usize> = (1..=result.ans.len()).collect();
            prop_assert_eq!(&in_answers, &expected);
            prop_assert_eq!(in_question, expected);
        }

        #[test]
        fn answers_are_members_of_the_target_set(
            text in "[a-zA-Z ]{0,60}",
            targets in proptest::collection::vec("[a-zA-Z]{1,3}", 1..5),
        ) {
            let set = TargetWordSet::new(&targets);
            let result = transform(&text, &set);
            for entry in &result.ans {
                prop_assert!(set.contains(&entry.word));
                prop_assert!(entry.word.chars().all(|c| c.is_ascii_alphabetic()));
            }
        }
    }
}
