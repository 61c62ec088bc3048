//! Core domain types for the article pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{ArticleSmithError, Result};

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// An audience archetype loaded from the persona file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRecord {
    /// Category label (join key with [`KeywordRecord::category`]).
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Persona_Detail")]
    pub persona_detail: String,
    #[serde(rename = "Worry_Description")]
    pub worry_description: String,
    #[serde(rename = "Tone_Instruction")]
    pub tone_instruction: String,
    #[serde(rename = "Context_Scenario")]
    pub context_scenario: String,
}

/// A target SEO keyword loaded from the keyword file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    #[serde(rename = "ID")]
    pub id: String,
    /// Category label (join key with [`PersonaRecord::category`]).
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Main_Keyword")]
    pub main_keyword: String,
    #[serde(rename = "Sub_Keywords")]
    pub sub_keywords: String,
    #[serde(rename = "User_Intent")]
    pub user_intent: String,
    #[serde(rename = "Title_Idea")]
    pub title_idea: String,
}

/// A persona paired with one keyword; one article is generated per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedTask {
    pub persona: PersonaRecord,
    pub keyword: KeywordRecord,
}

// ---------------------------------------------------------------------------
// ArticleStatus
// ---------------------------------------------------------------------------

/// Publication status carried in the article file and the publish payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = ArticleSmithError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(ArticleSmithError::validation(format!(
                "invalid article status '{trimmed}' (expected draft or published)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CategoryId
// ---------------------------------------------------------------------------

/// Category of an article: either a resolved catalog id or a persona
/// category label that still has to go through the category resolver.
///
/// The article file stores both variants in one untyped cell, so a label made
/// only of digits cannot round-trip: [`CategoryId::parse`] reads it back as
/// `Id`. The store refuses to write such labels
/// (see [`CategoryId::is_numeric_label`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Id(u32),
    Label(String),
}

impl CategoryId {
    /// Parse a stored cell: unsigned integers become `Id`, anything else `Label`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u32>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Label(trimmed.to_string()),
        }
    }

    /// Whether this is a `Label` that [`CategoryId::parse`] would read as an `Id`.
    pub fn is_numeric_label(&self) -> bool {
        match self {
            Self::Id(_) => false,
            Self::Label(label) => label.trim().parse::<u32>().is_ok(),
        }
    }

    /// The numeric id, if already resolved.
    pub fn as_id(&self) -> Option<u32> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Label(_) => None,
        }
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::Label(String::new())
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleRecord
// ---------------------------------------------------------------------------

/// A finished article as stored in the article file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Assigned by the store on first append; stable afterwards.
    pub id: Option<u64>,
    pub category_id: CategoryId,
    pub title: String,
    pub body: String,
    pub slug: String,
    pub status: ArticleStatus,
    pub meta_title: String,
    pub meta_description: String,
    /// Whether the article has been accepted by the publishing API.
    #[serde(default)]
    pub api_posted: bool,
}

/// Partial field set merged over a stored [`ArticleRecord`].
///
/// Carries no `id`: updates never change identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleUpdate {
    pub category_id: Option<CategoryId>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub slug: Option<String>,
    pub status: Option<ArticleStatus>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub api_posted: Option<bool>,
}

impl ArticleUpdate {
    /// Update that only marks the article as accepted by the publishing API.
    pub fn posted() -> Self {
        Self {
            api_posted: Some(true),
            ..Default::default()
        }
    }

    /// Merge the set fields over `record`.
    pub fn apply_to(self, record: &mut ArticleRecord) {
        if let Some(v) = self.category_id {
            record.category_id = v;
        }
        if let Some(v) = self.title {
            record.title = v;
        }
        if let Some(v) = self.body {
            record.body = v;
        }
        if let Some(v) = self.slug {
            record.slug = v;
        }
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = self.meta_title {
            record.meta_title = v;
        }
        if let Some(v) = self.meta_description {
            record.meta_description = v;
        }
        if let Some(v) = self.api_posted {
            record.api_posted = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One entry of the external category catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}
