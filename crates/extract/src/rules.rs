// ABOUTME: Site extraction rules: ordered selector lists per job field plus listing selectors.
// ABOUTME: Rules are plain data, deserialized from embedded JSON or a user-supplied file.

//! Site rule definitions.
//!
//! A [`SiteRules`] value describes where every job field lives on one job
//! board. Each field carries an ordered list of selectors; the record
//! builder evaluates them in priority order and stops at the first one that
//! produces a non-empty normalized value.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::normalize::{NormalizedJoin, DEFAULT_SEPARATOR};

/// Embedded rules for the default job board.
const BUILTIN_RULES_JSON: &str = include_str!("../data/simplylawjobs.json");

/// Specifies how to pull raw fragments out of the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSpec {
    /// Direct child text nodes of every matched element.
    Text(String),
    /// Every descendant text node of every matched element.
    DeepText(String),
    /// An attribute of every matched element, e.g. `["a.apply", "href"]`.
    Attr(Vec<String>),
}

impl Default for SelectorSpec {
    fn default() -> Self {
        SelectorSpec::Text(String::new())
    }
}

/// Ordered extraction rules for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Selectors to try in order
    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
    /// Join separator; a single space when unset
    #[serde(default)]
    pub separator: Option<String>,
}

impl FieldRules {
    /// Rules with a single selector.
    pub fn single(spec: SelectorSpec) -> Self {
        Self {
            selectors: vec![spec],
            separator: None,
        }
    }

    /// Rules trying each selector in turn.
    pub fn ordered(specs: impl IntoIterator<Item = SelectorSpec>) -> Self {
        Self {
            selectors: specs.into_iter().collect(),
            separator: None,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn joiner(&self) -> NormalizedJoin {
        NormalizedJoin::new(self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR))
    }
}

/// Selectors used to walk listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRules {
    /// Container whose numeric link texts enumerate the result pages
    pub pagination: String,
    /// Anchor of each posting on a listing page (its `href` is followed)
    pub job_link: String,
    /// Relative reference a page number is appended to
    pub page_query: String,
}

impl Default for ListingRules {
    fn default() -> Self {
        Self {
            pagination: "div#pagination".to_string(),
            job_link: r#"div[class="info font-size-small"] > a:nth-of-type(1)"#.to_string(),
            page_query: "jobs?page=".to_string(),
        }
    }
}

/// Complete extraction rules for one job board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRules {
    /// Primary host of the board
    pub domain: String,
    /// Other hosts serving the same board
    #[serde(default)]
    pub supported_domains: Vec<String>,
    #[serde(default)]
    pub listing: ListingRules,
    pub title: FieldRules,
    pub company: FieldRules,
    pub location: FieldRules,
    pub description: FieldRules,
    #[serde(default)]
    pub apply_url: Option<FieldRules>,
    #[serde(default)]
    pub industry: Option<FieldRules>,
    #[serde(default)]
    pub base_salary: Option<FieldRules>,
    #[serde(default)]
    pub benefits: Option<FieldRules>,
    #[serde(default)]
    pub requirements: Option<FieldRules>,
    #[serde(default)]
    pub skills: Option<FieldRules>,
    #[serde(default)]
    pub work_hours: Option<FieldRules>,
}

impl SiteRules {
    /// Parses rules from JSON.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(json)
            .map_err(|e| ExtractError::config("LoadRules", Some(anyhow::Error::new(e))))
    }

    /// Hosts the rules apply to: the primary domain followed by any aliases.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.domain.as_str())
            .chain(self.supported_domains.iter().map(String::as_str))
            .filter(|d| !d.is_empty())
    }
}

/// Loads the rules for the builtin job board.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn load_builtin_rules() -> SiteRules {
    SiteRules::from_json(BUILTIN_RULES_JSON).expect("failed to parse builtin site rules")
}
