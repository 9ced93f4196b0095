use std::env;
use std::fmt;
use std::io::{self, IsTerminal};

use once_cell::sync::Lazy;

/// Colours are off when `NO_COLOR` is set or stdout is not a terminal.
static COLOR_ENABLED: Lazy<bool> = Lazy::new(|| {
    env::var_os("NO_COLOR").is_none_or(|value| value.is_empty()) && io::stdout().is_terminal()
});

#[derive(Clone, Copy, Debug)]
pub struct PaletteColor {
    ansi: &'static str,
}

impl PaletteColor {
    pub const fn new(ansi: &'static str) -> Self {
        Self { ansi }
    }

    pub const fn ansi(self) -> &'static str {
        self.ansi
    }
}

pub struct Palette;

impl Palette {
    pub const RESET: &'static str = "\x1b[0m";
    pub const DIM: &'static str = "\x1b[2m";
    pub const BOLD: &'static str = "\x1b[1m";

    pub const ACCENT: PaletteColor = PaletteColor::new("\x1b[34m");
    pub const SUCCESS: PaletteColor = PaletteColor::new("\x1b[32m");
    pub const WARNING: PaletteColor = PaletteColor::new("\x1b[33m");
    pub const DANGER: PaletteColor = PaletteColor::new("\x1b[31m");

    pub fn paint(color: PaletteColor, value: impl fmt::Display) -> String {
        Self::wrap(color.ansi(), value)
    }

    pub fn dim(value: impl fmt::Display) -> String {
        Self::wrap(Self::DIM, value)
    }

    pub fn bold(value: impl fmt::Display) -> String {
        Self::wrap(Self::BOLD, value)
    }

    /// A green tick or a red cross.
    pub fn mark(ok: bool) -> String {
        if ok {
            Self::paint(Self::SUCCESS, "✓")
        } else {
            Self::paint(Self::DANGER, "✗")
        }
    }

    fn wrap(code: &str, value: impl fmt::Display) -> String {
        if *COLOR_ENABLED {
            format!("{code}{value}{}", Self::RESET)
        } else {
            value.to_string()
        }
    }
}
