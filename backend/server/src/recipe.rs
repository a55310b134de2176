use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FIELD_BASE: &str = "base";
pub const FIELD_FLAVOR: &str = "flavor";
pub const FIELD_NUTRITION: &str = "nutrition";
pub const FIELD_TEXTURE: &str = "texture";
pub const FIELD_NAME: &str = "name";
pub const FIELD_CREATED_AT: &str = "created_at";

/// The five free-text fields, in wizard order.
pub const TEXT_FIELDS: [&str; 5] = [
    FIELD_BASE,
    FIELD_FLAVOR,
    FIELD_NUTRITION,
    FIELD_TEXTURE,
    FIELD_NAME,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(Uuid);

impl RecipeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecipeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl FromStr for RecipeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub base: String,
    pub flavor: String,
    pub nutrition: String,
    pub texture: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_BASE => Some(&self.base),
            FIELD_FLAVOR => Some(&self.flavor),
            FIELD_NUTRITION => Some(&self.nutrition),
            FIELD_TEXTURE => Some(&self.texture),
            FIELD_NAME => Some(&self.name),
            _ => None,
        }
    }
}

/// A recipe as it sits in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: RecipeId,
    #[serde(flatten)]
    pub recipe: Recipe,
}
