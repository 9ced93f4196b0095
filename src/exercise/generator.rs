use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::GeneratorError;
use super::prompts::{
    SYSTEM_PROMPT, cloze_passage_prompt, hangman_hint_prompt, mind_map_prompt,
    reading_quiz_prompt, usage_prompt, vocabulary_prompt,
};
use super::types::{MindMapNode, QuizQuestion, UsageVerdict, VocabularyEntry};
use crate::cloze::{TargetWordSet, find_placeholders, transform};
use crate::config::Cefr;
use crate::llm::{TextModel, extract_json};

pub const READING_QUIZ_QUESTIONS: usize = 5;
const HIDDEN_WORD: &str = "____";

pub struct Generator<M> {
    model: M,
}

impl<M: TextModel> Generator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn vocabulary(
        &self,
        article: &str,
        cefr: Cefr,
        count: usize,
    ) -> Result<Vec<VocabularyEntry>, GeneratorError> {
        let article = non_empty(article, "article")?;
        if count == 0 {
            return Err(GeneratorError::EmptyInput("word count"));
        }

        let mut entries: Vec<VocabularyEntry> = self
            .structured("vocabulary", vocabulary_prompt(article, cefr, count))
            .await?;
        entries.retain(|e| !e.word.trim().is_empty());
        if entries.is_empty() {
            return Err(invalid("vocabulary", "no words returned"));
        }
        if entries.len() != count {
            warn!(
                asked = count,
                got = entries.len(),
                "model returned a different number of words"
            );
            entries.truncate(count);
        }
        Ok(entries)
    }

    pub async fn check_usage(
        &self,
        words: &[String],
        sentences: &[String],
    ) -> Result<Vec<UsageVerdict>, GeneratorError> {
        if words.is_empty() || sentences.is_empty() {
            return Err(GeneratorError::EmptyInput("word list or sentence list"));
        }
        if words.len() != sentences.len() {
            return Err(GeneratorError::LengthMismatch {
                words: words.len(),
                sentences: sentences.len(),
            });
        }

        let verdicts: Vec<UsageVerdict> = self
            .structured("usage check", usage_prompt(words, sentences))
            .await?;
        if verdicts.is_empty() {
            return Err(invalid("usage check", "no verdicts returned"));
        }
        Ok(verdicts)
    }

    /// Asks for a passage that uses every word, as the source of a cloze test.
    pub async fn cloze_passage(&self, words: &[String], cefr: Cefr) -> Result<String, GeneratorError> {
        if words.iter().all(|w| w.trim().is_empty()) {
            return Err(GeneratorError::EmptyInput("word list"));
        }
        let passage = self.plain(cloze_passage_prompt(words, cefr)).await?;
        non_empty(&passage, "cloze passage").map(str::to_string)
    }

    /// A description of `word` for hangman; any slip of the word is blanked.
    pub async fn hangman_hint(&self, word: &str, cefr: Cefr) -> Result<String, GeneratorError> {
        let word = non_empty(word, "word")?;
        let hint = self.plain(hangman_hint_prompt(word, cefr)).await?;
        let hint = non_empty(&hint, "hangman hint")?;
        redact_word(hint, word)
    }

    pub async fn mind_map(&self, article: &str) -> Result<MindMapNode, GeneratorError> {
        let article = non_empty(article, "article")?;
        let map: MindMapNode = self.structured("mind map", mind_map_prompt(article)).await?;
        map.validate().map_err(|reason| invalid("mind map", reason))?;
        Ok(map)
    }

    pub async fn reading_quiz(&self, article: &str) -> Result<Vec<QuizQuestion>, GeneratorError> {
        let article = non_empty(article, "article")?;
        let questions: Vec<QuizQuestion> = self
            .structured(
                "reading quiz",
                reading_quiz_prompt(article, READING_QUIZ_QUESTIONS),
            )
            .await?;
        if questions.is_empty() {
            return Err(invalid("reading quiz", "no questions returned"));
        }
        for question in &questions {
            question
                .validate()
                .map_err(|reason| invalid("reading quiz", reason))?;
        }
        Ok(questions)
    }

    async fn plain(&self, prompt: String) -> Result<String, GeneratorError> {
        let reply = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(reply.trim().to_string())
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        what: &'static str,
        prompt: String,
    ) -> Result<T, GeneratorError> {
        let reply = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        let value = extract_json(&reply)?;
        let parsed = serde_json::from_value(value)
            .map_err(|source| GeneratorError::Shape { what, source })?;
        info!(what, "parsed model reply");
        Ok(parsed)
    }
}

fn non_empty<'a>(text: &'a str, what: &'static str) -> Result<&'a str, GeneratorError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(GeneratorError::EmptyInput(what))
    } else {
        Ok(trimmed)
    }
}

fn invalid(what: &'static str, reason: impl Into<String>) -> GeneratorError {
    GeneratorError::Invalid {
        what,
        reason: reason.into(),
    }
}

/// Replaces whole-word occurrences of `word` in `text` with a blank.
///
/// Plain words go through the cloze scanner. Hyphenated words and phrases
/// are matched case-insensitively as a whole, with any run of whitespace
/// standing in for a space.
pub fn redact_word(text: &str, word: &str) -> Result<String, GeneratorError> {
    let redacted = if word.chars().all(|c| c.is_ascii_alphabetic()) {
        redact_token(text, word)
    } else {
        redact_phrase(text, word)?
    };
    if redacted != text {
        warn!(word, "hint mentioned the hidden word");
    }
    Ok(redacted)
}

fn redact_token(text: &str, word: &str) -> String {
    let blanked = transform(text, &TargetWordSet::new([word]));
    if blanked.ans.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(blanked.question.len());
    let mut pos = 0;
    for span in find_placeholders(&blanked.question) {
        out.push_str(&blanked.question[pos..span.start]);
        out.push_str(HIDDEN_WORD);
        pos = span.end;
    }
    out.push_str(&blanked.question[pos..]);
    out
}

fn redact_phrase(text: &str, phrase: &str) -> Result<String, GeneratorError> {
    let phrase = phrase.trim();
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if phrase.starts_with(is_word_char) { r"\b" } else { "" };
    let tail = if phrase.ends_with(is_word_char) { r"\b" } else { "" };

    let pattern = Regex::new(&format!("(?i){lead}{body}{tail}"))
        .map_err(|err| invalid("hangman hint", format!("cannot match {phrase:?}: {err}")))?;
    Ok(pattern.replace_all(text, HIDDEN_WORD).into_owned())
}
