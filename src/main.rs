use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

use newsdrill::commands::{self, ArticleArgs, cloze, hangman, mindmap, news, quiz, vocab};
use newsdrill::config::{Cefr, Settings};
use newsdrill::hangman::DEFAULT_MAX_MISSES;
use newsdrill::llm;
use newsdrill::news::NewsCategory;

#[derive(Parser, Debug)]
#[command(
    name = "newsdrill",
    version,
    about = "English practice built from today's news.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Show progress logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List BBC articles of a category, or the stored categories
    News {
        #[arg(value_enum)]
        category: Option<NewsCategory>,
        /// Fetch again instead of using the stored list
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Print a stored article
    Read {
        #[arg(value_enum)]
        category: NewsCategory,
        id: usize,
        /// Also open the article in the browser
        #[arg(long, default_value_t = false)]
        open: bool,
    },
    /// Pick vocabulary from an article, or show the current list
    Vocab {
        #[command(flatten)]
        article: ArticleArgs,
        /// Number of words to pick
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Target level (defaults to NEWSDRILL_CEFR)
        #[arg(long, value_enum, ignore_case = true)]
        cefr: Option<Cefr>,
    },
    /// Write sentences with vocabulary words and have them checked
    Usage {
        /// Comma separated words (defaults to the current vocabulary)
        #[arg(long, value_name = "WORDS")]
        words: Option<String>,
    },
    /// Cloze tests
    Cloze {
        #[command(subcommand)]
        command: ClozeCommand,
    },
    /// Guess a vocabulary word letter by letter
    Hangman {
        /// Word to guess (defaults to a random vocabulary word)
        word: Option<String>,
        #[arg(long, value_enum, ignore_case = true)]
        cefr: Option<Cefr>,
        #[arg(long, default_value_t = DEFAULT_MAX_MISSES)]
        max_misses: usize,
    },
    /// Draw a mind map of an article
    Mindmap {
        #[command(flatten)]
        article: ArticleArgs,
        /// Print the map as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Reading comprehension quiz on an article
    Quiz {
        #[command(flatten)]
        article: ArticleArgs,
    },
    /// Manage LLM helper settings
    Llm {
        /// Store a new API key in the local auth file
        #[arg(long, value_name = "KEY", conflicts_with = "clear")]
        set: Option<String>,
        /// Remove the stored API key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured API key by calling the API
        #[arg(long, conflicts_with = "clear")]
        test: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ClozeCommand {
    /// Have the model write a passage with the words and blank them
    Generate {
        /// Words to blank, comma or space separated (defaults to the stored selection)
        #[arg(value_name = "WORDS", num_args = 0..)]
        words: Vec<String>,
        /// Use N random words from the current vocabulary instead
        #[arg(long, value_name = "N", conflicts_with = "words")]
        sample: Option<usize>,
        #[arg(long, value_enum, ignore_case = true)]
        cefr: Option<Cefr>,
    },
    /// Blank the words in your own passage
    Blank {
        #[arg(value_name = "WORDS", num_args = 0..)]
        words: Vec<String>,
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    /// Fill in the current test and grade it
    Play,
    /// Print the current test
    Show {
        /// Print an HTML form instead of text
        #[arg(long, default_value_t = false)]
        html: bool,
        /// Also print the answers
        #[arg(long, default_value_t = false)]
        answers: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run_cli(cli).await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_cli(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    let app = commands::open_app(&settings).await?;
    let level = |cefr: Option<Cefr>| cefr.unwrap_or(settings.cefr);

    match cli.command {
        Command::News { category, refresh } => news::run(&app, category, refresh).await?,
        Command::Read { category, id, open } => news::read(&app, category, id, open).await?,
        Command::Vocab {
            article,
            count,
            cefr,
        } => {
            if article.file.is_none() && article.category.is_none() {
                vocab::show(&app).await?;
            } else {
                vocab::run(&app, &article, level(cefr), count).await?;
            }
        }
        Command::Usage { words } => vocab::usage(&app, words).await?,
        Command::Cloze { command } => match command {
            ClozeCommand::Generate {
                words,
                sample,
                cefr,
            } => cloze::generate(&app, words, sample, level(cefr)).await?,
            ClozeCommand::Blank { words, text, file } => {
                cloze::blank(&app, text, file, words).await?
            }
            ClozeCommand::Play => cloze::play(&app).await?,
            ClozeCommand::Show { html, answers } => cloze::show(&app, html, answers).await?,
        },
        Command::Hangman {
            word,
            cefr,
            max_misses,
        } => hangman::run(&app, word, level(cefr), max_misses).await?,
        Command::Mindmap { article, json } => mindmap::run(&app, &article, json).await?,
        Command::Quiz { article } => quiz::run(&app, &article).await?,
        Command::Llm { set, clear, test } => {
            handle_llm_command(&settings, set, clear, test).await?
        }
    }

    Ok(())
}

async fn handle_llm_command(
    settings: &Settings,
    set: Option<String>,
    clear: bool,
    test: bool,
) -> Result<()> {
    let auth_path = settings.auth_path();
    let mut action_taken = false;

    if let Some(key) = set {
        llm::store_api_key(&auth_path, &key)?;
        println!("Stored API key in {}.", auth_path.display());
        action_taken = true;
    }

    if clear {
        let removed = llm::clear_api_key(&auth_path)?;
        if removed {
            println!("Removed the stored API key.");
        } else {
            println!("No API key found in the auth file.");
        }
        action_taken = true;
    }

    if test {
        let source = llm::test_configured_api_key(settings).await?;
        println!("API key from the {} is valid.", source.description());
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}
