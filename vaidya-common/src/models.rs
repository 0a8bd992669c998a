//! Domain models
//!
//! All documents serialize with camelCase field names; this is the shape
//! the web client stores and expects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id prefix of the seeded example remedies shipped with the catalog
pub const SEEDED_REMEDY_PREFIX: &str = "initial-";

/// Sentinel returned by the translation service when no name is known
pub const NOT_AVAILABLE: &str = "Not Available";

/// Lowest accepted effectiveness rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted effectiveness rating
pub const MAX_RATING: u8 = 5;

/// A community-contributed remedy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remedy {
    pub id: String,
    pub plant_name: String,
    #[serde(rename = "remedyDescription")]
    pub description: String,
    pub language: String,
    /// 1..=5
    pub effectiveness_rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data_uri: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub upvotes: u32,
    pub downvotes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_plausible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
}

impl Remedy {
    /// Seeded examples are displayed but never mutated
    pub fn is_seeded(&self) -> bool {
        is_seeded_id(&self.id)
    }

    /// Upvotes minus downvotes
    pub fn net_score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }
}

/// True for ids of the seeded example remedies
pub fn is_seeded_id(id: &str) -> bool {
    id.starts_with(SEEDED_REMEDY_PREFIX)
}

/// Direction of a vote on a remedy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

/// Per-plant pronunciation test record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageTestRecord {
    pub attempts: u32,
    pub best_score: u32,
}

/// Accumulated progress of one profile
///
/// Only ever grows: there are no operations that subtract points or
/// forget identified plants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub points: u64,
    /// Plant identifiers in discovery order, without duplicates
    pub identified_plants: Vec<String>,
    pub remedies_contributed: u32,
    /// Keyed by plant id
    pub language_tests: BTreeMap<String, LanguageTestRecord>,
}

impl UserProgress {
    pub fn has_identified(&self, plant_key: &str) -> bool {
        self.identified_plants.iter().any(|p| p == plant_key)
    }

    pub fn add_points(&mut self, points: u64) {
        self.points = self.points.saturating_add(points);
    }
}

/// Badge identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeId {
    #[serde(rename = "first_plant")]
    FirstPlant,
    #[serde(rename = "five_plants")]
    FivePlants,
    #[serde(rename = "first_remedy")]
    FirstRemedy,
    #[serde(rename = "first_word")]
    FirstWord,
    #[serde(rename = "100_points")]
    HundredPoints,
}

impl BadgeId {
    pub const ALL: [BadgeId; 5] = [
        BadgeId::FirstPlant,
        BadgeId::FivePlants,
        BadgeId::FirstRemedy,
        BadgeId::FirstWord,
        BadgeId::HundredPoints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeId::FirstPlant => "first_plant",
            BadgeId::FivePlants => "five_plants",
            BadgeId::FirstRemedy => "first_remedy",
            BadgeId::FirstWord => "first_word",
            BadgeId::HundredPoints => "100_points",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BadgeId::FirstPlant => "Plant Novice",
            BadgeId::FivePlants => "Budding Botanist",
            BadgeId::FirstRemedy => "Community Scribe",
            BadgeId::FirstWord => "Language Learner",
            BadgeId::HundredPoints => "Point Collector",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeId::FirstPlant => "Identify your first plant.",
            BadgeId::FivePlants => "Identify 5 different plants.",
            BadgeId::FirstRemedy => "Contribute your first remedy.",
            BadgeId::FirstWord => "Pass your first language test.",
            BadgeId::HundredPoints => "Earn 100 points.",
        }
    }
}

/// Derived achievement, never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
}

/// Translated plant name for one game round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_name: String,
    pub pronunciation: String,
}

impl TranslationResult {
    pub fn not_available() -> Self {
        Self {
            translated_name: NOT_AVAILABLE.to_string(),
            pronunciation: String::new(),
        }
    }

    /// False for the "Not Available" sentinel and for blank names
    pub fn is_available(&self) -> bool {
        let name = self.translated_name.trim();
        !name.is_empty() && !name.eq_ignore_ascii_case(NOT_AVAILABLE)
    }
}

/// Name of a plant in a tribal language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribalName {
    pub language: String,
    pub name: String,
    pub pronunciation: String,
}

/// Catalog entry for a medicinal plant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: u32,
    pub english_name: String,
    pub hindi_name: String,
    pub scientific_name: String,
    pub family: String,
    pub is_medicinal: bool,
    pub is_endangered: bool,
    pub tribal_names: Vec<TribalName>,
    pub medicinal_uses: Vec<String>,
    pub preparation_methods: Vec<String>,
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribalLanguage {
    pub id: u32,
    pub name: String,
    pub region: String,
}

/// Structured answer of the identification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    pub is_plant: bool,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub other_names: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_medicinal: bool,
    #[serde(default)]
    pub is_poisonous: bool,
    #[serde(default)]
    pub medicinal_uses: String,
    #[serde(default)]
    pub warnings: String,
}
