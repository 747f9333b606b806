use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{IdentityRecord, Persona, QuestionDefinition};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only question definitions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: HashMap<u32, QuestionDefinition>,
}

impl QuestionCatalog {
    pub fn from_records(records: Vec<QuestionDefinition>) -> Self {
        let questions = records
            .into_iter()
            .filter(|question| question.id != 0)
            .filter(|question| {
                // Scores only move within the non-negative range.
                let valid = question.score >= 0 && question.penalty >= 0;
                if !valid {
                    tracing::warn!(
                        "Skipping question {}: negative score ({}) or penalty ({})",
                        question.id,
                        question.score,
                        question.penalty
                    );
                }
                valid
            })
            .map(|question| (question.id, question))
            .collect();
        Self { questions }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let records = read_json_list(path.as_ref()).await?;
        Ok(Self::from_records(records))
    }

    pub fn get(&self, id: u32) -> Option<&QuestionDefinition> {
        self.questions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Read-only login credentials keyed by username.
#[derive(Debug, Clone, Default)]
pub struct IdentityCatalog {
    identities: HashMap<String, IdentityRecord>,
}

impl IdentityCatalog {
    pub fn from_records(records: Vec<IdentityRecord>) -> Self {
        let identities = records
            .into_iter()
            .filter(|identity| !identity.username.is_empty())
            .map(|identity| (identity.username.clone(), identity))
            .collect();
        Self { identities }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let records = read_json_list(path.as_ref()).await?;
        Ok(Self::from_records(records))
    }

    /// `true` only for a known username whose secret matches.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.identities
            .get(username)
            .map(|identity| identity.verify_password(password))
            .unwrap_or(false)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.identities.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Assistant personas keyed by system prompt id.
#[derive(Debug, Clone, Default)]
pub struct PersonaCatalog {
    personas: HashMap<u32, Persona>,
}

impl PersonaCatalog {
    pub fn from_records(records: Vec<Persona>) -> Self {
        let personas = records
            .into_iter()
            .filter(|persona| persona.id != 0 && !persona.prompt.trim().is_empty())
            .map(|persona| (persona.id, persona))
            .collect();
        Self { personas }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let records = read_json_list(path.as_ref()).await?;
        Ok(Self::from_records(records))
    }

    pub fn prompt(&self, id: u32) -> Option<&str> {
        self.personas.get(&id).map(|persona| persona.prompt.as_str())
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

async fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let path_str = path.display().to_string();
    let raw = tokio::fs::read(path).await.map_err(|source| CatalogError::Io {
        path: path_str.clone(),
        source,
    })?;
    let records: Vec<T> = serde_json::from_slice(&raw).map_err(|source| CatalogError::Parse {
        path: path_str.clone(),
        source,
    })?;
    tracing::info!("Loaded {} records from {}", records.len(), path_str);
    Ok(records)
}
