//! BBC news as a source of reading material.
//!
//! - `parser.rs`: link, title and paragraph extraction with scraper
//! - `crawler.rs`: HTTP fetching of category pages and articles

pub mod crawler;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crawler::BbcCrawler;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    News,
    Business,
    Innovation,
    Culture,
    Arts,
    Travel,
    Earth,
    Sport,
}

/// How a category page lays out its article links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStyle {
    /// Links inside a `div[data-testid=..]` section.
    Grid { section_testid: &'static str },
    Sport,
}

const NEWS_SECTION: &str = "virginia-section-8";
const CULTURE_SECTION: &str = "alaska-grid";

impl NewsCategory {
    pub const ALL: [NewsCategory; 8] = [
        NewsCategory::News,
        NewsCategory::Business,
        NewsCategory::Innovation,
        NewsCategory::Culture,
        NewsCategory::Arts,
        NewsCategory::Travel,
        NewsCategory::Earth,
        NewsCategory::Sport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NewsCategory::News => "news",
            NewsCategory::Business => "business",
            NewsCategory::Innovation => "innovation",
            NewsCategory::Culture => "culture",
            NewsCategory::Arts => "arts",
            NewsCategory::Travel => "travel",
            NewsCategory::Earth => "earth",
            NewsCategory::Sport => "sport",
        }
    }

    /// Path of the category page under the site root.
    pub fn path(self) -> &'static str {
        match self {
            NewsCategory::Earth => "future-planet",
            other => other.as_str(),
        }
    }

    pub fn style(self) -> PageStyle {
        match self {
            NewsCategory::News | NewsCategory::Business | NewsCategory::Innovation => {
                PageStyle::Grid {
                    section_testid: NEWS_SECTION,
                }
            }
            NewsCategory::Culture
            | NewsCategory::Arts
            | NewsCategory::Travel
            | NewsCategory::Earth => PageStyle::Grid {
                section_testid: CULTURE_SECTION,
            },
            NewsCategory::Sport => PageStyle::Sport,
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: usize,
    pub title: String,
    pub link: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBatch {
    pub category: NewsCategory,
    pub articles: Vec<Article>,
}

impl NewsBatch {
    pub fn article(&self, id: usize) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid CSS selector {0:?}")]
    Selector(String),

    #[error("no article links found for {0}")]
    NoLinks(NewsCategory),

    #[error("no readable articles found for {0}")]
    NoArticles(NewsCategory),
}

/// Where articles come from.
#[allow(async_fn_in_trait)]
pub trait NewsSource {
    async fn fetch_category(&self, category: NewsCategory) -> Result<NewsBatch, CrawlError>;
}
