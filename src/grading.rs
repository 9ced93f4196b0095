use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cloze::{ClozeResult, find_placeholders};
use crate::palette::Palette;

const FORM_FIELD_PREFIX: &str = "blank_";

/// Answers typed by the learner, keyed by placeholder index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    answers: BTreeMap<usize, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, idx: usize, value: impl Into<String>) {
        self.answers.insert(idx, value.into());
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.answers.get(&idx).map(String::as_str)
    }

    /// Builds a submission from form-style pairs.
    ///
    /// Keys may be `blank_3` or a bare `3`; anything else is ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let raw_idx = key.strip_prefix(FORM_FIELD_PREFIX).unwrap_or(key);
            if let Ok(idx) = raw_idx.parse::<usize>() {
                submission.insert(idx, value);
            }
        }
        submission
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedBlank {
    pub idx: usize,
    pub user: Option<String>,
    pub correct: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub blanks: Vec<GradedBlank>,
}

impl GradeReport {
    pub fn score(&self) -> usize {
        self.blanks.iter().filter(|b| b.is_correct).count()
    }

    pub fn total(&self) -> usize {
        self.blanks.len()
    }

    pub fn blank(&self, idx: usize) -> Option<&GradedBlank> {
        self.blanks.iter().find(|b| b.idx == idx)
    }

    /// Words the learner has already placed correctly, lower-cased.
    pub fn used_words(&self) -> BTreeSet<String> {
        self.blanks
            .iter()
            .filter(|b| b.is_correct)
            .map(|b| b.correct.to_lowercase())
            .collect()
    }

    pub fn is_perfect(&self) -> bool {
        self.score() == self.total()
    }
}

pub fn is_correct_answer(user: &str, correct: &str) -> bool {
    let user = user.trim();
    !user.is_empty() && user.eq_ignore_ascii_case(correct.trim())
}

pub fn grade(result: &ClozeResult, submission: &Submission) -> GradeReport {
    let blanks = result
        .ans
        .iter()
        .map(|entry| {
            let user = submission.get(entry.idx).map(|v| v.trim().to_string());
            let is_correct = user
                .as_deref()
                .is_some_and(|u| is_correct_answer(u, &entry.word));
            GradedBlank {
                idx: entry.idx,
                user,
                correct: entry.word.clone(),
                is_correct,
            }
        })
        .collect();

    GradeReport { blanks }
}

/// Renders a question for the terminal, with coloured answers once graded.
pub fn render_text(question: &str, report: Option<&GradeReport>) -> String {
    render_with(question, |idx| {
        let graded = report.and_then(|r| r.blank(idx));
        match graded {
            Some(GradedBlank {
                user: Some(user),
                is_correct: true,
                ..
            }) => Palette::paint(Palette::SUCCESS, format!("[{idx}: {user}]")),
            Some(GradedBlank {
                user: Some(user),
                is_correct: false,
                ..
            }) if !user.is_empty() => Palette::paint(Palette::DANGER, format!("[{idx}: {user}]")),
            _ => Palette::paint(Palette::WARNING, format!("[{idx}: ____]")),
        }
    })
}

/// Renders a question as an HTML fragment with one text input per blank.
pub fn render_html(question: &str, report: Option<&GradeReport>) -> String {
    let mut out = String::with_capacity(question.len() * 2);
    let mut pos = 0;
    for span in find_placeholders(question) {
        out.push_str(&html_escape::encode_text(&question[pos..span.start]));
        out.push_str(&html_input(span.idx, report.and_then(|r| r.blank(span.idx))));
        pos = span.end;
    }
    out.push_str(&html_escape::encode_text(&question[pos..]));
    out
}

fn html_input(idx: usize, graded: Option<&GradedBlank>) -> String {
    let Some(graded) = graded.filter(|g| g.user.is_some()) else {
        return format!(
            r#"<input type="text" name="{FORM_FIELD_PREFIX}{idx}" style="width:120px;">"#
        );
    };
    let user = graded.user.as_deref().unwrap_or_default();
    let (color, readonly) = if graded.is_correct {
        ("#c8f7c5", " readonly")
    } else {
        ("#f7c5c5", "")
    };
    format!(
        r#"<input type="text" name="{FORM_FIELD_PREFIX}{idx}" value="{value}"{readonly} style="width:120px; background-color:{color};">"#,
        value = html_escape::encode_double_quoted_attribute(user),
    )
}

fn render_with<F>(question: &str, mut blank: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut out = String::with_capacity(question.len());
    let mut pos = 0;
    for span in find_placeholders(question) {
        out.push_str(&question[pos..span.start]);
        out.push_str(&blank(span.idx));
        pos = span.end;
    }
    out.push_str(&question[pos..]);
    out
}
