//! Cache fingerprints for generated exercises.
//!
//! A fingerprint names one model request: the exercise kind, the parameters
//! it was generated with and the article it was generated from. Articles are
//! compared word by word, case-folded, so re-wrapped copies of the same story
//! share a fingerprint. Each field is length-prefixed before hashing.

use std::fmt::Display;

use blake3::Hasher;

const DIGEST_HEX_LEN: usize = 16;

pub struct Fingerprint {
    hasher: Hasher,
    words: usize,
}

impl Fingerprint {
    pub fn new(kind: &str) -> Self {
        let mut fingerprint = Self {
            hasher: Hasher::new(),
            words: 0,
        };
        fingerprint.field(kind.as_bytes());
        fingerprint
    }

    /// Folds in one generation parameter, such as a CEFR level or a count.
    pub fn param(mut self, value: impl Display) -> Self {
        self.field(value.to_string().as_bytes());
        self
    }

    pub fn article(mut self, text: &str) -> Self {
        self.field(b"article");
        for word in text.split_whitespace() {
            self.field(word.to_lowercase().as_bytes());
            self.words += 1;
        }
        self
    }

    /// `None` when no article words were folded in.
    pub fn finish(self) -> Option<String> {
        if self.words == 0 {
            return None;
        }
        let hex = self.hasher.finalize().to_hex();
        Some(hex[..DIGEST_HEX_LEN].to_string())
    }

    fn field(&mut self, bytes: &[u8]) {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }
}
