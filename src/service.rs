//! Application operations behind the CLI.
//!
//! [`LearningService`] combines a language model, a news source and an
//! artifact store. Everything it produces is persisted, and generated content
//! is cached under a fingerprint of the request that produced it.

use std::collections::HashSet;

use rand::seq::IndexedRandom;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cloze::{ClozeResult, TargetWordSet, transform};
use crate::config::Cefr;
use crate::digest::Fingerprint;
use crate::exercise::{
    Generator, GeneratorError, MindMapNode, QuizQuestion, UsageVerdict, VocabularyEntry,
};
use crate::grading::{GradeReport, Submission, grade};
use crate::llm::TextModel;
use crate::news::{Article, CrawlError, NewsBatch, NewsCategory, NewsSource};
use crate::store::{ArtifactKey, ArtifactStore, StoreError, load, save};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("none of the words appear in the passage, so there is nothing to blank")]
    NoBlanks,

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LearningService<M, N, S> {
    generator: Generator<M>,
    news: N,
    store: S,
}

impl<M, N, S> LearningService<M, N, S>
where
    M: TextModel,
    N: NewsSource,
    S: ArtifactStore,
{
    pub fn new(model: M, news: N, store: S) -> Self {
        Self {
            generator: Generator::new(model),
            news,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn news_by_category(
        &self,
        category: NewsCategory,
        refresh: bool,
    ) -> Result<NewsBatch, ServiceError> {
        let key = ArtifactKey::News(category);
        if !refresh && let Some(batch) = load::<_, NewsBatch>(&self.store, &key).await? {
            debug!(%category, "using stored news");
            return Ok(batch);
        }

        let batch = self.news.fetch_category(category).await?;
        save(&self.store, &key, &batch).await?;
        info!(%category, articles = batch.articles.len(), "stored news");
        Ok(batch)
    }

    /// Looks up an article from the last stored batch of `category`.
    pub async fn article(&self, category: NewsCategory, id: usize) -> Result<Article, ServiceError> {
        let batch: NewsBatch = load(&self.store, &ArtifactKey::News(category))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{category} news")))?;
        batch
            .article(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("article {id} in {category}")))
    }

    pub async fn vocabulary_from_article(
        &self,
        article: &str,
        cefr: Cefr,
        count: usize,
    ) -> Result<Vec<VocabularyEntry>, ServiceError> {
        if count == 0 {
            return Err(ServiceError::InvalidInput("word count must be at least 1".into()));
        }
        let digest = article_digest(
            Fingerprint::new("vocabulary").param(cefr).param(count),
            article,
        )?;
        let entries = self
            .cached(ArtifactKey::Vocabulary(digest), || {
                self.generator.vocabulary(article, cefr, count)
            })
            .await?;
        save(&self.store, &ArtifactKey::ActiveVocabulary, &entries).await?;
        Ok(entries)
    }

    pub async fn active_vocabulary(&self) -> Result<Vec<VocabularyEntry>, ServiceError> {
        load(&self.store, &ArtifactKey::ActiveVocabulary)
            .await?
            .ok_or_else(|| ServiceError::NotFound("vocabulary list".into()))
    }

    pub async fn check_vocabulary_usage(
        &self,
        words: &[String],
        sentences: &[String],
    ) -> Result<Vec<UsageVerdict>, ServiceError> {
        let words = clean_list(words);
        let sentences = clean_list(sentences);
        if words.is_empty() || sentences.is_empty() {
            return Err(ServiceError::InvalidInput(
                "words and sentences must not be empty".into(),
            ));
        }
        if words.len() != sentences.len() {
            return Err(ServiceError::InvalidInput(format!(
                "got {} words but {} sentences",
                words.len(),
                sentences.len()
            )));
        }

        let verdicts = self.generator.check_usage(&words, &sentences).await?;
        save(&self.store, &ArtifactKey::LatestUsage, &verdicts).await?;
        Ok(verdicts)
    }

    /// Stores the words of the next cloze test, dropping blanks and repeats.
    pub async fn select_cloze_words(&self, words: &[String]) -> Result<Vec<String>, ServiceError> {
        let mut seen = HashSet::new();
        let selection: Vec<String> = clean_list(words)
            .into_iter()
            .filter(|word| seen.insert(word.to_lowercase()))
            .collect();
        if selection.is_empty() {
            return Err(ServiceError::InvalidInput("no words selected".into()));
        }

        save(&self.store, &ArtifactKey::ClozeSelection, &selection).await?;
        Ok(selection)
    }

    /// Picks up to `n` random words from the active vocabulary.
    pub async fn sample_cloze_words(&self, n: usize) -> Result<Vec<String>, ServiceError> {
        if n == 0 {
            return Err(ServiceError::InvalidInput("sample size must be at least 1".into()));
        }
        let vocabulary = self.active_vocabulary().await?;
        let words: Vec<String> = vocabulary.iter().map(|entry| entry.word.clone()).collect();
        let sample: Vec<String> = words
            .choose_multiple(&mut rand::rng(), n)
            .cloned()
            .collect();
        self.select_cloze_words(&sample).await
    }

    pub async fn cloze_selection(&self) -> Result<Vec<String>, ServiceError> {
        load(&self.store, &ArtifactKey::ClozeSelection)
            .await?
            .ok_or_else(|| ServiceError::NotFound("cloze word selection".into()))
    }

    /// Has the model write a passage with `words` and blanks them out.
    ///
    /// An empty `words` uses the stored selection.
    pub async fn generate_cloze_test(
        &self,
        words: &[String],
        cefr: Cefr,
    ) -> Result<ClozeResult, ServiceError> {
        let words = if clean_list(words).is_empty() {
            self.cloze_selection().await?
        } else {
            self.select_cloze_words(words).await?
        };

        let passage = self.generator.cloze_passage(&words, cefr).await?;
        self.store_cloze_test(&passage, &words).await
    }

    /// Blanks `words` in a user-supplied text without calling the model.
    pub async fn cloze_from_text(
        &self,
        text: &str,
        words: &[String],
    ) -> Result<ClozeResult, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("text is empty".into()));
        }
        self.store_cloze_test(text, &clean_list(words)).await
    }

    async fn store_cloze_test(
        &self,
        text: &str,
        words: &[String],
    ) -> Result<ClozeResult, ServiceError> {
        let result = transform(text, &TargetWordSet::new(words));
        if result.blank_count() == 0 {
            warn!(
                words = words.len(),
                chars = text.len(),
                "cloze passage contains none of the target words"
            );
            return Err(ServiceError::NoBlanks);
        }
        if result.blank_count() < words.len() {
            debug!(
                blanks = result.blank_count(),
                words = words.len(),
                "some target words are missing from the passage"
            );
        }

        save(&self.store, &ArtifactKey::ClozeTest, &result).await?;
        info!(blanks = result.blank_count(), "stored cloze test");
        Ok(result)
    }

    pub async fn current_cloze(&self) -> Result<ClozeResult, ServiceError> {
        load(&self.store, &ArtifactKey::ClozeTest)
            .await?
            .ok_or_else(|| ServiceError::NotFound("cloze test".into()))
    }

    pub async fn grade_cloze(&self, submission: &Submission) -> Result<GradeReport, ServiceError> {
        let result = self.current_cloze().await?;
        let report = grade(&result, submission);
        info!(score = report.score(), total = report.total(), "graded cloze test");
        Ok(report)
    }

    pub async fn hangman_hint(&self, word: &str, cefr: Cefr) -> Result<String, ServiceError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(ServiceError::InvalidInput("word is empty".into()));
        }
        let key = ArtifactKey::Hangman {
            word: word.to_string(),
            cefr,
        };
        self.cached(key, || self.generator.hangman_hint(word, cefr))
            .await
    }

    pub async fn mind_map(&self, article: &str) -> Result<MindMapNode, ServiceError> {
        let digest = article_digest(Fingerprint::new("mindmap"), article)?;
        self.cached(ArtifactKey::MindMap(digest), || self.generator.mind_map(article))
            .await
    }

    pub async fn reading_quiz(&self, article: &str) -> Result<Vec<QuizQuestion>, ServiceError> {
        let digest = article_digest(Fingerprint::new("quiz"), article)?;
        self.cached(ArtifactKey::Quiz(digest), || self.generator.reading_quiz(article))
            .await
    }

    /// Returns the stored artifact under `key`, generating and storing it on a miss.
    async fn cached<T, F, Fut>(&self, key: ArtifactKey, generate: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GeneratorError>>,
    {
        if let Some(value) = load(&self.store, &key).await? {
            debug!(%key, "cache hit");
            return Ok(value);
        }
        let value = generate().await?;
        save(&self.store, &key, &value).await?;
        debug!(%key, "cached generated artifact");
        Ok(value)
    }
}

fn article_digest(request: Fingerprint, article: &str) -> Result<String, ServiceError> {
    request
        .article(article)
        .finish()
        .ok_or_else(|| ServiceError::InvalidInput("article is empty".into()))
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::exercise::generator::tests::ScriptedModel;
    use crate::store::{DB, MemoryStore};

    #[derive(Default)]
    struct FakeNews {
        calls: AtomicUsize,
    }

    impl NewsSource for FakeNews {
        async fn fetch_category(&self, category: NewsCategory) -> Result<NewsBatch, CrawlError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(NewsBatch {
                category,
                articles: vec![Article {
                    id: 1,
                    title: format!("Headline {n}"),
                    link: "https://www.bbc.com/news/articles/a1".into(),
                    content: "Shares rose.\nInvestors cheered.".into(),
                }],
            })
        }
    }

    fn service<I, R>(replies: I) -> LearningService<ScriptedModel, FakeNews, MemoryStore>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        LearningService::new(
            ScriptedModel::new(replies),
            FakeNews::default(),
            MemoryStore::default(),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const VOCAB_REPLY: &str = r#"```json
[
  {"word": "tariff", "part_of_speech": "noun", "zh-Hant_definition": "關稅", "example_sentence": "A new tariff."},
  {"word": "surge", "part_of_speech": "verb", "zh-Hant_definition": "激增", "example_sentence": "Prices surge."}
]
```"#;

    #[tokio::test]
    async fn news_is_cached_until_refresh() {
        let service = service(Vec::<String>::new());

        let first = service.news_by_category(NewsCategory::Business, false).await.unwrap();
        let again = service.news_by_category(NewsCategory::Business, false).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(service.news.calls.load(Ordering::SeqCst), 1);

        let fresh = service.news_by_category(NewsCategory::Business, true).await.unwrap();
        assert_eq!(fresh.articles[0].title, "Headline 2");

        let article = service.article(NewsCategory::Business, 1).await.unwrap();
        assert_eq!(article.title, "Headline 2");
        assert!(matches!(
            service.article(NewsCategory::Business, 9).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.article(NewsCategory::Sport, 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn vocabulary_is_cached_by_article_digest() {
        let service = service([VOCAB_REPLY]);

        let words = service
            .vocabulary_from_article("Tariffs  surge.", Cefr::B2, 2)
            .await
            .unwrap();
        assert_eq!(words.len(), 2);

        // same text modulo case and spacing hits the cache
        let cached = service
            .vocabulary_from_article("tariffs surge.\n", Cefr::B2, 2)
            .await
            .unwrap();
        assert_eq!(cached, words);
        assert_eq!(service.generator.model().prompt_count(), 1);

        assert_eq!(service.active_vocabulary().await.unwrap(), words);
    }

    #[tokio::test]
    async fn vocabulary_is_regenerated_for_another_level_or_count() {
        let one = r#"[{"word": "cat", "part_of_speech": "noun", "zh-Hant_definition": "貓", "example_sentence": "A cat."}]"#;
        let service = service([one, VOCAB_REPLY, VOCAB_REPLY]);
        let text = "The cat saw tariffs surge.";

        let easy = service.vocabulary_from_article(text, Cefr::A1, 1).await.unwrap();
        assert_eq!(easy.len(), 1);

        let hard = service.vocabulary_from_article(text, Cefr::C1, 2).await.unwrap();
        assert_eq!(hard.len(), 2);
        assert_eq!(service.active_vocabulary().await.unwrap(), hard);

        service.vocabulary_from_article(text, Cefr::A1, 2).await.unwrap();
        assert_eq!(service.generator.model().prompt_count(), 3);

        let again = service.vocabulary_from_article(text, Cefr::A1, 1).await.unwrap();
        assert_eq!(again, easy);
        assert_eq!(service.generator.model().prompt_count(), 3);
        assert_eq!(service.active_vocabulary().await.unwrap(), easy);
    }

    #[tokio::test]
    async fn hangman_hints_are_cached_per_level() {
        let service = service(["A place where boats shelter.", "A sheltered anchorage for vessels."]);

        let easy = service.hangman_hint("harbour", Cefr::A1).await.unwrap();
        let hard = service.hangman_hint("harbour", Cefr::C2).await.unwrap();
        assert_eq!(easy, "A place where boats shelter.");
        assert_eq!(hard, "A sheltered anchorage for vessels.");
        assert_eq!(service.hangman_hint("Harbour", Cefr::A1).await.unwrap(), easy);
        assert_eq!(service.generator.model().prompt_count(), 2);
    }

    #[tokio::test]
    async fn empty_article_is_rejected() {
        let service = service(Vec::<String>::new());
        assert!(matches!(
            service.mind_map("  \n ").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            service.active_vocabulary().await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn usage_check_validates_before_asking() {
        let service = service([r#"[{"word": "surge", "is_correct": true, "explanation": "正確"}]"#]);

        let mismatch = service
            .check_vocabulary_usage(&strings(&["surge", "tariff"]), &strings(&["Prices surge."]))
            .await;
        assert!(matches!(mismatch, Err(ServiceError::InvalidInput(_))));
        assert_eq!(service.generator.model().prompt_count(), 0);

        let verdicts = service
            .check_vocabulary_usage(&strings(&["surge", " "]), &strings(&["Prices surge."]))
            .await
            .unwrap();
        assert!(verdicts[0].is_correct);
        let stored: Option<Vec<UsageVerdict>> =
            load(service.store(), &ArtifactKey::LatestUsage).await.unwrap();
        assert_eq!(stored, Some(verdicts));
    }

    #[tokio::test]
    async fn cloze_test_is_generated_stored_and_graded() {
        let service = service(["The fox met a Dog. The fox ran."]);

        let result = service
            .generate_cloze_test(&strings(&["fox", "dog", "FOX"]), Cefr::A2)
            .await
            .unwrap();
        assert_eq!(result.question, "The ___[1]___ met a ___[2]___. The ___[3]___ ran.");
        assert_eq!(service.cloze_selection().await.unwrap(), strings(&["fox", "dog"]));
        assert_eq!(service.current_cloze().await.unwrap(), result);

        let mut submission = Submission::new();
        submission.insert(1, "Fox ");
        submission.insert(2, "cat");
        let report = service.grade_cloze(&submission).await.unwrap();
        assert_eq!(report.score(), 1);
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn zero_blank_passages_are_refused_and_not_stored() {
        let service = service(["A passage about something else entirely."]);

        let refused = service.generate_cloze_test(&strings(&["fox"]), Cefr::B1).await;
        assert!(matches!(refused, Err(ServiceError::NoBlanks)));
        assert!(matches!(
            service.current_cloze().await,
            Err(ServiceError::NotFound(_))
        ));

        let local = service.cloze_from_text("foxes everywhere", &strings(&["fox"])).await;
        assert!(matches!(local, Err(ServiceError::NoBlanks)));
    }

    #[tokio::test]
    async fn stored_selection_feeds_the_next_test() {
        let service = service(["A dog barked."]);

        assert!(matches!(
            service.generate_cloze_test(&[], Cefr::B2).await,
            Err(ServiceError::NotFound(_))
        ));
        service.select_cloze_words(&strings(&["dog"])).await.unwrap();
        let result = service.generate_cloze_test(&[], Cefr::B2).await.unwrap();
        assert_eq!(result.ans[0].word, "dog");
    }

    #[tokio::test]
    async fn sampling_draws_from_active_vocabulary() {
        let service = service([VOCAB_REPLY]);
        service
            .vocabulary_from_article("Tariffs surge.", Cefr::B2, 2)
            .await
            .unwrap();

        let sample = service.sample_cloze_words(5).await.unwrap();
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|w| w == "tariff" || w == "surge"));

        let one = service.sample_cloze_words(1).await.unwrap();
        assert_eq!(one.len(), 1);
        assert!(matches!(
            service.sample_cloze_words(0).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn cloze_from_text_needs_no_model() {
        let service = service(Vec::<String>::new());
        let result = service
            .cloze_from_text("Stocks surge; tariffs bite.", &strings(&["surge", "tariffs"]))
            .await
            .unwrap();
        assert_eq!(result.blank_count(), 2);
        assert_eq!(service.generator.model().prompt_count(), 0);
    }

    #[tokio::test]
    async fn hints_and_quizzes_are_cached_in_sqlite() {
        let quiz = r#"[{"type": "True_Or_False", "question": "Shares rose.", "answer": true}]"#;
        let service = LearningService::new(
            ScriptedModel::new(["A tax on imported goods.", quiz]),
            FakeNews::default(),
            DB::new_in_memory().await.unwrap(),
        );

        let hint = service.hangman_hint("Tariff", Cefr::B2).await.unwrap();
        assert_eq!(service.hangman_hint("tariff ", Cefr::B2).await.unwrap(), hint);

        let questions = service.reading_quiz("Shares rose.").await.unwrap();
        assert_eq!(service.reading_quiz("shares rose.").await.unwrap(), questions);
        assert_eq!(service.generator.model().prompt_count(), 2);
    }
}
