pub mod cloze;
pub mod hangman;
pub mod mindmap;
pub mod news;
pub mod quiz;
pub mod vocab;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueHint};

use crate::config::Settings;
use crate::llm::LazyOpenAiModel;
use crate::news::{BbcCrawler, NewsCategory, crawler::DEFAULT_TIMEOUT};
use crate::service::LearningService;
use crate::store::DB;

pub type App = LearningService<LazyOpenAiModel, BbcCrawler, DB>;

pub async fn open_app(settings: &Settings) -> Result<App> {
    let db = DB::open(&settings.database_path())
        .await
        .with_context(|| format!("Failed to open {}", settings.database_path().display()))?;
    let crawler = BbcCrawler::new(DEFAULT_TIMEOUT)?;
    Ok(LearningService::new(
        LazyOpenAiModel::new(settings.clone()),
        crawler,
        db,
    ))
}

/// Where an exercise takes its article text from.
#[derive(Args, Debug, Clone)]
pub struct ArticleArgs {
    /// Category of a stored article
    #[arg(long, value_enum, requires = "id", conflicts_with = "file")]
    pub category: Option<NewsCategory>,
    /// Id of the article, as listed by `newsdrill news`
    #[arg(long, requires = "category")]
    pub id: Option<usize>,
    /// Read the article from a text file instead
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}

impl ArticleArgs {
    pub async fn resolve(&self, app: &App) -> Result<String> {
        match (&self.file, self.category, self.id) {
            (Some(path), _, _) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if text.trim().is_empty() {
                    bail!("{} is empty", path.display());
                }
                Ok(text)
            }
            (None, Some(category), Some(id)) => {
                let article = app.article(category, id).await.with_context(|| {
                    format!("Run `newsdrill news {category}` to fetch articles first")
                })?;
                Ok(format!("{}\n\n{}", article.title, article.content))
            }
            _ => bail!("Pass --category and --id, or --file."),
        }
    }
}
