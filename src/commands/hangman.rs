use anyhow::{Result, bail};
use rand::seq::IndexedRandom;

use super::App;
use crate::config::Cefr;
use crate::hangman::{GameStatus, GuessOutcome, HangmanGame};
use crate::palette::Palette;
use crate::utils::ask_line;

pub async fn run(app: &App, word: Option<String>, cefr: Cefr, max_misses: usize) -> Result<()> {
    let word = match word {
        Some(word) => word.trim().to_string(),
        None => random_vocabulary_word(app).await?,
    };
    let Some(mut game) = HangmanGame::new(&word, max_misses) else {
        bail!("{word:?} has no letters to guess.");
    };

    let hint = app.hangman_hint(&word, cefr).await?;
    println!("{} {}\n", Palette::bold("Hint:"), hint);

    while game.status() == GameStatus::Playing {
        println!("{game}");
        let input = ask_line("Letter")?;
        let Some(ch) = input.chars().next() else {
            continue;
        };
        match game.guess(ch) {
            GuessOutcome::Hit(n) => println!("{}", Palette::paint(Palette::SUCCESS, format!("{ch} x{n}"))),
            GuessOutcome::Miss => println!("{}", Palette::paint(Palette::DANGER, format!("No {ch}"))),
            GuessOutcome::AlreadyGuessed => println!("{}", Palette::dim(format!("{ch} was already guessed"))),
            GuessOutcome::Invalid => println!("{}", Palette::dim("Guess a letter from a to z")),
            GuessOutcome::Finished => break,
        }
    }

    match game.status() {
        GameStatus::Won => println!(
            "\n{} {}",
            Palette::paint(Palette::SUCCESS, "You got it:"),
            Palette::bold(game.word())
        ),
        _ => println!(
            "\n{} {}",
            Palette::paint(Palette::DANGER, "Out of guesses. The word was"),
            Palette::bold(game.word())
        ),
    }
    Ok(())
}

async fn random_vocabulary_word(app: &App) -> Result<String> {
    let vocabulary = app.active_vocabulary().await?;
    match vocabulary.choose(&mut rand::rng()) {
        Some(entry) => Ok(entry.word.clone()),
        None => bail!("The vocabulary list is empty. Run `newsdrill vocab` first."),
    }
}
