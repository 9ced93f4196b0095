//! Key-value persistence for generated artifacts.
//!
//! Every artifact is stored as a JSON document under an [`ArtifactKey`].
//! The same store serves as the cache for model output, so repeated requests
//! for the same article never call the model twice.

pub mod db;
pub mod memory;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::Cefr;
use crate::news::NewsCategory;

pub use db::DB;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("artifact {key} is not valid JSON for its type")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode artifact {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where an artifact lives. Generated artifacts are keyed by a
/// [`Fingerprint`](crate::digest::Fingerprint) of their request, or by every
/// input the model saw.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    News(NewsCategory),
    Vocabulary(String),
    ActiveVocabulary,
    LatestUsage,
    ClozeSelection,
    ClozeTest,
    Hangman { word: String, cefr: Cefr },
    MindMap(String),
    Quiz(String),
}

impl ArtifactKey {
    pub fn as_key(&self) -> String {
        match self {
            ArtifactKey::News(category) => format!("news/{category}"),
            ArtifactKey::Vocabulary(digest) => format!("vocabulary/{digest}"),
            ArtifactKey::ActiveVocabulary => "vocabulary/active".to_string(),
            ArtifactKey::LatestUsage => "usage/latest".to_string(),
            ArtifactKey::ClozeSelection => "cloze/selection".to_string(),
            ArtifactKey::ClozeTest => "cloze/test".to_string(),
            ArtifactKey::Hangman { word, cefr } => {
                format!("hangman/{}/{cefr}", word.to_lowercase())
            }
            ArtifactKey::MindMap(digest) => format!("mindmap/{digest}"),
            ArtifactKey::Quiz(digest) => format!("quiz/{digest}"),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    async fn put(&self, key: &ArtifactKey, value: &Value) -> Result<(), StoreError>;
    async fn get(&self, key: &ArtifactKey) -> Result<Option<Value>, StoreError>;
    /// Returns whether something was removed.
    async fn remove(&self, key: &ArtifactKey) -> Result<bool, StoreError>;
}

pub async fn save<S, T>(store: &S, key: &ArtifactKey, value: &T) -> Result<(), StoreError>
where
    S: ArtifactStore,
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.as_key(),
        source,
    })?;
    store.put(key, &value).await
}

pub async fn load<S, T>(store: &S, key: &ArtifactKey) -> Result<Option<T>, StoreError>
where
    S: ArtifactStore,
    T: DeserializeOwned,
{
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            key: key.as_key(),
            source,
        })
}
