use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use url::Url;

use super::parser::{extract_grid_links, extract_paragraphs, extract_sport_links, extract_title};
use super::{Article, CrawlError, NewsBatch, NewsCategory, NewsSource, PageStyle};

pub const BBC_BASE_URL: &str = "https://www.bbc.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_CONCURRENT_FETCHES: usize = 4;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct BbcCrawler {
    client: reqwest::Client,
    base_url: Url,
}

impl BbcCrawler {
    pub fn new(timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| CrawlError::Request {
                url: BBC_BASE_URL.to_string(),
                source,
            })?;
        let base_url =
            Url::parse(BBC_BASE_URL).map_err(|e| CrawlError::InvalidUrl(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, CrawlError> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(self)
    }

    pub fn category_url(&self, category: NewsCategory) -> Result<Url, CrawlError> {
        self.base_url
            .join(category.path())
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {e}", category.path())))
    }

    async fn get_html(&self, url: &Url) -> Result<String, CrawlError> {
        let request_error = |source: reqwest::Error| CrawlError::Request {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url.as_str())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?
            .text()
            .await
            .map_err(request_error)
    }

    pub async fn category_links(&self, category: NewsCategory) -> Result<Vec<Url>, CrawlError> {
        let url = self.category_url(category)?;
        let html = self.get_html(&url).await?;
        match category.style() {
            PageStyle::Grid { section_testid } => {
                extract_grid_links(&html, section_testid, &self.base_url)
            }
            PageStyle::Sport => extract_sport_links(&html, &self.base_url),
        }
    }

    /// Fetches one article; `None` when it cannot be read or has no body.
    async fn fetch_article(&self, category: NewsCategory, link: &Url) -> Option<(String, String)> {
        let html = match self.get_html(link).await {
            Ok(html) => html,
            Err(err) => {
                warn!(%category, %err, "failed to fetch article");
                return None;
            }
        };

        let parsed = extract_title(&html).and_then(|title| Ok((title, extract_paragraphs(&html)?)));
        match parsed {
            Ok((_, content)) if content.trim().is_empty() => {
                warn!(%category, %link, "article has no body text");
                None
            }
            Ok(article) => Some(article),
            Err(err) => {
                warn!(%category, %link, %err, "failed to parse article");
                None
            }
        }
    }
}

impl NewsSource for BbcCrawler {
    async fn fetch_category(&self, category: NewsCategory) -> Result<NewsBatch, CrawlError> {
        let links = self.category_links(category).await?;
        info!(%category, links = links.len(), "found article links");
        if links.is_empty() {
            return Err(CrawlError::NoLinks(category));
        }

        let fetched: Vec<_> = stream::iter(links)
            .map(|link| async move {
                let article = self.fetch_article(category, &link).await;
                (link, article)
            })
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let articles: Vec<Article> = fetched
            .into_iter()
            .filter_map(|(link, article)| article.map(|(title, content)| (link, title, content)))
            .enumerate()
            .map(|(i, (link, title, content))| Article {
                id: i + 1,
                title,
                link: link.to_string(),
                content,
            })
            .collect();

        if articles.is_empty() {
            return Err(CrawlError::NoArticles(category));
        }
        info!(%category, articles = articles.len(), "crawled category");

        Ok(NewsBatch { category, articles })
    }
}
