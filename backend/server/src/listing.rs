use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::warn;

use crate::recipe::{
    FIELD_BASE, FIELD_CREATED_AT, FIELD_FLAVOR, FIELD_NAME, FIELD_NUTRITION, FIELD_TEXTURE,
    RecipeRecord,
};

const SEARCH_SIZE_LIMIT: usize = 1 << 16;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Base,
    Flavor,
    Nutrition,
    Texture,
    Name,
    CreatedAt,
}

impl SortField {
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or(FIELD_CREATED_AT) {
            FIELD_BASE => SortField::Base,
            FIELD_FLAVOR => SortField::Flavor,
            FIELD_NUTRITION => SortField::Nutrition,
            FIELD_TEXTURE => SortField::Texture,
            FIELD_NAME => SortField::Name,
            FIELD_CREATED_AT => SortField::CreatedAt,
            other => {
                warn!("Unknown sort field {other}, using {FIELD_CREATED_AT}");
                SortField::CreatedAt
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Base => FIELD_BASE,
            SortField::Flavor => FIELD_FLAVOR,
            SortField::Nutrition => FIELD_NUTRITION,
            SortField::Texture => FIELD_TEXTURE,
            SortField::Name => FIELD_NAME,
            SortField::CreatedAt => FIELD_CREATED_AT,
        }
    }

    fn compare(&self, a: &RecipeRecord, b: &RecipeRecord) -> Ordering {
        let (a, b) = (&a.recipe, &b.recipe);

        match self {
            SortField::Base => a.base.cmp(&b.base),
            SortField::Flavor => a.flavor.cmp(&b.flavor),
            SortField::Nutrition => a.nutrition.cmp(&b.nutrition),
            SortField::Texture => a.texture.cmp(&b.texture),
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Defaults to descending; anything other than `desc` sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("desc") {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn inverse(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug)]
pub struct ListQuery {
    pub sort: SortField,
    pub order: SortOrder,
    pub search: String,
}

impl ListQuery {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            sort: SortField::parse(params.sort.as_deref()),
            order: SortOrder::parse(params.order.as_deref()),
            search: params.search.clone().unwrap_or_default(),
        }
    }

    /// Order for the "flip direction" links.
    pub fn next_order(&self) -> SortOrder {
        self.order.inverse()
    }

    fn matcher(&self) -> Result<Option<Regex>, regex::Error> {
        if self.search.is_empty() {
            return Ok(None);
        }

        // escaped, so this is a plain substring test
        RegexBuilder::new(&regex::escape(&self.search))
            .case_insensitive(true)
            .size_limit(SEARCH_SIZE_LIMIT)
            .build()
            .map(Some)
    }

    /// Filters and sorts; a search that cannot be compiled matches nothing.
    pub fn apply(&self, mut records: Vec<RecipeRecord>) -> Vec<RecipeRecord> {
        match self.matcher() {
            Ok(Some(matcher)) => records.retain(|record| matcher.is_match(&record.recipe.name)),
            Ok(None) => {}
            Err(e) => {
                warn!("Search for {} chars rejected: {e}", self.search.len());
                return Vec::new();
            }
        }

        records.sort_by(|a, b| {
            let ordering = self.sort.compare(a, b).then_with(|| a.id.cmp(&b.id));

            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        records
    }
}
