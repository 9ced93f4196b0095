//! Letter-guessing game over a vocabulary word.

use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_MAX_MISSES: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Number of positions revealed.
    Hit(usize),
    Miss,
    AlreadyGuessed,
    Invalid,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Debug)]
pub struct HangmanGame {
    word: String,
    guessed: BTreeSet<char>,
    misses: usize,
    max_misses: usize,
}

impl HangmanGame {
    /// `None` when `word` has no letter to guess.
    pub fn new(word: &str, max_misses: usize) -> Option<Self> {
        let word = word.trim();
        if !word.chars().any(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self {
            word: word.to_string(),
            guessed: BTreeSet::new(),
            misses: 0,
            max_misses: max_misses.max(1),
        })
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn guessed(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed.iter().copied()
    }

    pub fn guess(&mut self, ch: char) -> GuessOutcome {
        if self.status() != GameStatus::Playing {
            return GuessOutcome::Finished;
        }
        if !ch.is_ascii_alphabetic() {
            return GuessOutcome::Invalid;
        }
        let ch = ch.to_ascii_lowercase();
        if !self.guessed.insert(ch) {
            return GuessOutcome::AlreadyGuessed;
        }

        let hits = self
            .word
            .chars()
            .filter(|c| c.to_ascii_lowercase() == ch)
            .count();
        if hits == 0 {
            self.misses += 1;
            GuessOutcome::Miss
        } else {
            GuessOutcome::Hit(hits)
        }
    }

    /// The word with unguessed letters shown as `_`.
    pub fn masked(&self) -> String {
        self.word
            .chars()
            .map(|c| {
                if c.is_ascii_alphabetic() && !self.guessed.contains(&c.to_ascii_lowercase()) {
                    '_'
                } else {
                    c
                }
            })
            .collect()
    }

    pub fn is_won(&self) -> bool {
        self.word
            .chars()
            .filter(char::is_ascii_alphabetic)
            .all(|c| self.guessed.contains(&c.to_ascii_lowercase()))
    }

    pub fn is_lost(&self) -> bool {
        !self.is_won() && self.misses >= self.max_misses
    }

    pub fn remaining_misses(&self) -> usize {
        self.max_misses.saturating_sub(self.misses)
    }

    pub fn status(&self) -> GameStatus {
        if self.is_won() {
            GameStatus::Won
        } else if self.is_lost() {
            GameStatus::Lost
        } else {
            GameStatus::Playing
        }
    }
}

impl fmt::Display for HangmanGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spaced: Vec<String> = self.masked().chars().map(String::from).collect();
        write!(
            f,
            "{}  ({} {} left)",
            spaced.join(" "),
            self.remaining_misses(),
            if self.remaining_misses() == 1 { "miss" } else { "misses" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guessing_reveals_letters_case_insensitively() {
        let mut game = HangmanGame::new("Well-known", 3).unwrap();
        assert_eq!(game.masked(), "____-_____");

        assert_eq!(game.guess('W'), GuessOutcome::Hit(2));
        assert_eq!(game.guess('l'), GuessOutcome::Hit(2));
        assert_eq!(game.masked(), "W_ll-___w_");
        assert_eq!(game.guess('w'), GuessOutcome::AlreadyGuessed);
        assert_eq!(game.guess('3'), GuessOutcome::Invalid);
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn game_is_won_when_all_letters_are_found() {
        let mut game = HangmanGame::new("tax", DEFAULT_MAX_MISSES).unwrap();
        for ch in ['t', 'a', 'x'] {
            assert!(matches!(game.guess(ch), GuessOutcome::Hit(1)));
        }
        assert!(game.is_won());
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.guess('z'), GuessOutcome::Finished);
    }

    #[test]
    fn game_is_lost_after_max_misses() {
        let mut game = HangmanGame::new("tax", 2).unwrap();
        assert_eq!(game.guess('q'), GuessOutcome::Miss);
        assert_eq!(game.remaining_misses(), 1);
        assert_eq!(game.to_string(), "_ _ _  (1 miss left)");
        assert_eq!(game.guess('z'), GuessOutcome::Miss);
        assert!(game.is_lost());
        assert_eq!(game.remaining_misses(), 0);
        assert_eq!(game.guess('t'), GuessOutcome::Finished);
    }

    #[test]
    fn words_without_letters_cannot_be_played() {
        assert!(HangmanGame::new("123", DEFAULT_MAX_MISSES).is_none());
        assert!(HangmanGame::new(" - ", DEFAULT_MAX_MISSES).is_none());
        assert!(HangmanGame::new("", DEFAULT_MAX_MISSES).is_none());

        let game = HangmanGame::new("4x4", DEFAULT_MAX_MISSES).unwrap();
        assert!(!game.is_won());
        assert_eq!(game.masked(), "4_4");
    }

    #[test]
    fn repeated_misses_do_not_count_twice() {
        let mut game = HangmanGame::new("tax", 2).unwrap();
        game.guess('q');
        assert_eq!(game.guess('Q'), GuessOutcome::AlreadyGuessed);
        assert_eq!(game.remaining_misses(), 1);
    }
}
