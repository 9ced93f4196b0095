use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub word: String,
    pub part_of_speech: String,
    #[serde(rename = "zh-Hant_definition")]
    pub definition: String,
    pub example_sentence: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageVerdict {
    pub word: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::depth).max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("node without id".to_string());
        }
        if self.text.trim().is_empty() {
            return Err(format!("node {} has no text", self.id));
        }
        self.children.iter().try_for_each(MindMapNode::validate)
    }

    /// Draws the map as an indented tree.
    pub fn render_tree(&self) -> String {
        let mut out = format!("{}\n", self.text);
        render_children(&self.children, "", &mut out);
        out
    }
}

fn render_children(children: &[MindMapNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&child.text);
        out.push('\n');
        render_children(&child.children, &format!("{prefix}{indent}"), out);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub kind: QuizKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuizKind {
    #[serde(rename = "Multiple_Answer")]
    MultipleAnswer {
        choices: Vec<String>,
        correct_choices: Vec<usize>,
    },
    #[serde(rename = "True_Or_False")]
    TrueOrFalse { answer: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizAnswer {
    Choices(BTreeSet<usize>),
    TrueOrFalse(bool),
}

impl QuizQuestion {
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question without text".to_string());
        }
        match &self.kind {
            QuizKind::MultipleAnswer {
                choices,
                correct_choices,
            } => {
                if choices.len() < 2 {
                    return Err(format!("{:?} has fewer than 2 choices", self.question));
                }
                if correct_choices.is_empty() {
                    return Err(format!("{:?} has no correct choice", self.question));
                }
                if let Some(bad) = correct_choices.iter().find(|&&c| c >= choices.len()) {
                    return Err(format!(
                        "{:?} marks choice {bad} correct but only has {} choices",
                        self.question,
                        choices.len()
                    ));
                }
                Ok(())
            }
            QuizKind::TrueOrFalse { .. } => Ok(()),
        }
    }

    /// Multiple-answer questions need exactly the correct set of choices.
    pub fn is_correct(&self, answer: &QuizAnswer) -> bool {
        match (&self.kind, answer) {
            (QuizKind::MultipleAnswer { correct_choices, .. }, QuizAnswer::Choices(picked)) => {
                let correct: BTreeSet<usize> = correct_choices.iter().copied().collect();
                &correct == picked
            }
            (QuizKind::TrueOrFalse { answer }, QuizAnswer::TrueOrFalse(picked)) => answer == picked,
            _ => false,
        }
    }
}
