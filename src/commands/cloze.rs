use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use super::App;
use crate::cloze::ClozeResult;
use crate::config::Cefr;
use crate::grading::{GradeReport, Submission, render_html, render_text};
use crate::palette::Palette;
use crate::utils::{ask_line, pluralize, split_word_list};

pub async fn generate(app: &App, words: Vec<String>, sample: Option<usize>, cefr: Cefr) -> Result<()> {
    let words = match sample {
        Some(n) => app.sample_cloze_words(n).await?,
        None => words.iter().flat_map(|w| split_word_list(w)).collect(),
    };
    let result = app
        .generate_cloze_test(&words, cefr)
        .await
        .context("Failed to build a cloze test")?;
    print_question(&result);
    Ok(())
}

pub async fn blank(
    app: &App,
    text: Option<String>,
    file: Option<PathBuf>,
    words: Vec<String>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Pass the passage with --text or --file."),
    };
    let words: Vec<String> = if words.is_empty() {
        app.cloze_selection().await?
    } else {
        words.iter().flat_map(|w| split_word_list(w)).collect()
    };

    let result = app.cloze_from_text(&text, &words).await?;
    print_question(&result);
    Ok(())
}

pub async fn show(app: &App, html: bool, answers: bool) -> Result<()> {
    let result = app.current_cloze().await?;
    if html {
        println!("{}", render_html(&result.question, None));
    } else {
        println!("{}", render_text(&result.question, None));
    }
    if answers {
        println!();
        for entry in &result.ans {
            println!("{:>3}. {}", entry.idx, entry.word);
        }
    }
    Ok(())
}

/// Fills in the current test blank by blank, then grades it.
pub async fn play(app: &App) -> Result<()> {
    let result = app.current_cloze().await?;
    print_question(&result);

    let mut submission = Submission::new();
    for entry in &result.ans {
        let answer = ask_line(&format!("[{}]", entry.idx))?;
        submission.insert(entry.idx, answer);
    }

    let report = app.grade_cloze(&submission).await?;
    println!("\n{}\n", render_text(&result.question, Some(&report)));
    print_report(&report);
    Ok(())
}

fn print_question(result: &ClozeResult) {
    println!("{}\n", render_text(&result.question, None));
    println!(
        "{}",
        Palette::dim(format!(
            "{}. Play it with `newsdrill cloze play`.",
            pluralize("blank", result.blank_count())
        ))
    );
}

fn print_report(report: &GradeReport) {
    let score = format!("{}/{}", report.score(), report.total());
    if report.is_perfect() {
        println!("{}", Palette::paint(Palette::SUCCESS, format!("Perfect! {score}")));
        return;
    }
    println!("Score: {}", Palette::bold(score));
    for blank in report.blanks.iter().filter(|b| !b.is_correct) {
        println!(
            "{:>3}. {} {}",
            blank.idx,
            Palette::paint(Palette::SUCCESS, &blank.correct),
            Palette::dim(format!(
                "(you wrote {})",
                blank.user.as_deref().filter(|u| !u.is_empty()).unwrap_or("nothing")
            ))
        );
    }
}
