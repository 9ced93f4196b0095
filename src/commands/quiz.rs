use std::collections::BTreeSet;

use anyhow::Result;

use super::{App, ArticleArgs};
use crate::exercise::{QuizAnswer, QuizKind, QuizQuestion};
use crate::palette::Palette;
use crate::utils::{ask_line, ask_yn};

pub async fn run(app: &App, article: &ArticleArgs) -> Result<()> {
    let text = article.resolve(app).await?;
    let questions = app.reading_quiz(&text).await?;

    let mut correct = 0;
    for (n, question) in questions.iter().enumerate() {
        println!("\n{} {}", Palette::bold(format!("Q{}.", n + 1)), question.question);
        let answer = ask(question)?;
        if question.is_correct(&answer) {
            correct += 1;
            println!("{}", Palette::paint(Palette::SUCCESS, "Correct"));
        } else {
            println!(
                "{} {}",
                Palette::paint(Palette::DANGER, "Wrong. Answer:"),
                expected(question)
            );
        }
        if let Some(explanation) = &question.explanation {
            println!("{}", Palette::dim(explanation));
        }
    }

    println!("\nScore: {}", Palette::bold(format!("{correct}/{}", questions.len())));
    Ok(())
}

fn ask(question: &QuizQuestion) -> Result<QuizAnswer> {
    match &question.kind {
        QuizKind::MultipleAnswer { choices, .. } => {
            for (i, choice) in choices.iter().enumerate() {
                println!("  {}) {choice}", i + 1);
            }
            let raw = ask_line("Choices (e.g. 1,3)")?;
            Ok(QuizAnswer::Choices(parse_choices(&raw, choices.len())))
        }
        QuizKind::TrueOrFalse { .. } => Ok(QuizAnswer::TrueOrFalse(ask_yn("True?")?)),
    }
}

/// One-based choice numbers to zero-based indices; out-of-range numbers are dropped.
fn parse_choices(raw: &str, count: usize) -> BTreeSet<usize> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|part| part.trim().parse::<usize>().ok())
        .filter(|&n| (1..=count).contains(&n))
        .map(|n| n - 1)
        .collect()
}

fn expected(question: &QuizQuestion) -> String {
    match &question.kind {
        QuizKind::MultipleAnswer {
            choices,
            correct_choices,
        } => correct_choices
            .iter()
            .filter_map(|&i| choices.get(i).map(|c| format!("{}) {c}", i + 1)))
            .collect::<Vec<_>>()
            .join(", "),
        QuizKind::TrueOrFalse { answer } => answer.to_string(),
    }
}
