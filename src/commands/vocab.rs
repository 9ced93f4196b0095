use anyhow::{Result, bail};

use super::{App, ArticleArgs};
use crate::config::Cefr;
use crate::exercise::{UsageVerdict, VocabularyEntry};
use crate::palette::Palette;
use crate::utils::{ask_line, pluralize, split_word_list};

pub async fn run(app: &App, article: &ArticleArgs, cefr: Cefr, count: usize) -> Result<()> {
    let text = article.resolve(app).await?;
    let entries = app.vocabulary_from_article(&text, cefr, count).await?;
    println!(
        "{}\n",
        Palette::bold(format!("{} at {cefr}", pluralize("word", entries.len())))
    );
    print_entries(&entries);
    Ok(())
}

pub async fn show(app: &App) -> Result<()> {
    let entries = app.active_vocabulary().await?;
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[VocabularyEntry]) {
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{:>2}. {} {}  {}",
            i + 1,
            Palette::paint(Palette::ACCENT, &entry.word),
            Palette::dim(format!("({})", entry.part_of_speech)),
            entry.definition
        );
        println!("    {}", Palette::dim(&entry.example_sentence));
    }
}

/// Asks for one sentence per word and has the model check them.
pub async fn usage(app: &App, words: Option<String>) -> Result<()> {
    let words = match words {
        Some(raw) => split_word_list(&raw),
        None => app
            .active_vocabulary()
            .await?
            .into_iter()
            .map(|entry| entry.word)
            .collect(),
    };
    if words.is_empty() {
        bail!("No words to practise.");
    }

    println!("Write a sentence for each word. Leave it blank to skip the word.\n");
    let mut used = Vec::new();
    let mut sentences = Vec::new();
    for word in words {
        let sentence = ask_line(&Palette::paint(Palette::ACCENT, &word))?;
        if !sentence.is_empty() {
            used.push(word);
            sentences.push(sentence);
        }
    }
    if used.is_empty() {
        println!("No sentences written.");
        return Ok(());
    }

    let verdicts = app.check_vocabulary_usage(&used, &sentences).await?;
    print_verdicts(&verdicts);
    Ok(())
}

fn print_verdicts(verdicts: &[UsageVerdict]) {
    for verdict in verdicts {
        println!(
            "{} {}  {}",
            Palette::mark(verdict.is_correct),
            Palette::bold(&verdict.word),
            verdict.explanation
        );
    }
    let correct = verdicts.iter().filter(|v| v.is_correct).count();
    println!("\n{correct}/{} used correctly", verdicts.len());
}
