//! # Wizard
//!
//! Five pages, one field each, shared by create and edit.
//!
//! | step | field       |
//! |------|-------------|
//! | 1    | `base`      |
//! | 2    | `flavor`    |
//! | 3    | `nutrition` |
//! | 4    | `texture`   |
//! | 5    | `name`      |
//! | 6    | completion  |
//!
//! The step number travels with the request; the field values live in the
//! [`Session`] until completion, which clears it.
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppError,
    recipe::{
        FIELD_BASE, FIELD_FLAVOR, FIELD_NAME, FIELD_NUTRITION, FIELD_TEXTURE, Recipe, RecipeId,
        TEXT_FIELDS,
    },
    session::Session,
};

pub const FINAL_STEP: i64 = 6;

pub struct StepPage {
    pub number: i64,
    pub field: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const PAGES: [StepPage; 5] = [
    StepPage {
        number: 1,
        field: FIELD_BASE,
        label: "Base",
        prompt: "What goes in first? Milk, juice, yogurt, water...",
    },
    StepPage {
        number: 2,
        field: FIELD_FLAVOR,
        label: "Flavor",
        prompt: "Pick the main flavor.",
    },
    StepPage {
        number: 3,
        field: FIELD_NUTRITION,
        label: "Nutrition",
        prompt: "Any boosts? Protein, fiber, greens...",
    },
    StepPage {
        number: 4,
        field: FIELD_TEXTURE,
        label: "Texture",
        prompt: "How should it feel?",
    },
    StepPage {
        number: 5,
        field: FIELD_NAME,
        label: "Name",
        prompt: "Give the recipe a name.",
    },
];

/// Which wizard a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Create,
    Edit(RecipeId),
}

impl Flow {
    pub fn path(&self) -> String {
        match self {
            Flow::Create => "/create".to_string(),
            Flow::Edit(id) => format!("/edit/{id}"),
        }
    }

    pub fn step_url(&self, step: i64) -> String {
        format!("{}?step={step}", self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Prev,
}

impl Navigation {
    /// Missing means forward; any value other than `next` goes back.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("next") => Navigation::Next,
            Some(_) => Navigation::Prev,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WizardForm {
    pub navigation: Option<String>,
    pub step: Option<String>,
    pub base: Option<String>,
    pub flavor: Option<String>,
    pub nutrition: Option<String>,
    pub texture: Option<String>,
    pub name: Option<String>,
}

impl WizardForm {
    fn field(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_BASE => self.base.as_deref(),
            FIELD_FLAVOR => self.flavor.as_deref(),
            FIELD_NUTRITION => self.nutrition.as_deref(),
            FIELD_TEXTURE => self.texture.as_deref(),
            FIELD_NAME => self.name.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    /// Redirect to this step.
    Goto(i64),
    /// All steps done; the session has been cleared.
    Complete(Recipe),
}

pub fn parse_step(step: Option<&str>) -> Result<i64, AppError> {
    let step = step.unwrap_or("1");

    step.trim()
        .parse()
        .map_err(|_| AppError::MalformedForm(format!("step={step}")))
}

/// Page for a GET of `step`; anything outside 1..=5 has no page.
pub fn page(step: Option<&str>) -> Result<&'static StepPage, AppError> {
    let raw = step.unwrap_or("1");

    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|number| PAGES.iter().find(|page| page.number == number))
        .ok_or_else(|| AppError::UnknownStep(raw.to_string()))
}

/// Applies one POST of the wizard to the session.
///
/// Only fields present in the form are written, so an edit keeps falling back
/// to `stored` for every field the user has not submitted yet.
pub fn submit(
    session: &mut Session,
    form: &WizardForm,
    stored: Option<&Recipe>,
) -> Result<Transition, AppError> {
    let navigation = Navigation::parse(form.navigation.as_deref());
    let raw = form.step.as_deref().unwrap_or("1");
    let step = parse_step(Some(raw))?;

    let step = match navigation {
        Navigation::Next => step.checked_add(1),
        Navigation::Prev => step.checked_sub(1),
    }
    .ok_or_else(|| AppError::MalformedForm(format!("step={raw}")))?;

    if navigation == Navigation::Next {
        for field in TEXT_FIELDS {
            if let Some(value) = form.field(field) {
                session.insert(field, value);
            }
        }
    }

    if step != FINAL_STEP {
        return Ok(Transition::Goto(step));
    }

    let recipe = assemble(session, stored);
    session.clear();

    Ok(Transition::Complete(recipe))
}

/// Session value, then the stored one, then empty.
pub fn current_value<'a>(
    session: &'a Session,
    stored: Option<&'a Recipe>,
    field: &str,
) -> &'a str {
    session
        .get(field)
        .or_else(|| stored.and_then(|recipe| recipe.field(field)))
        .unwrap_or_default()
}

fn assemble(session: &Session, stored: Option<&Recipe>) -> Recipe {
    let value = |field: &str| current_value(session, stored, field).to_string();

    Recipe {
        base: value(FIELD_BASE),
        flavor: value(FIELD_FLAVOR),
        nutrition: value(FIELD_NUTRITION),
        texture: value(FIELD_TEXTURE),
        name: value(FIELD_NAME),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(step: &str) -> WizardForm {
        WizardForm {
            navigation: Some("next".into()),
            step: Some(step.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_next_moves_forward_and_keeps_field() {
        let mut session = Session::default();
        let form = WizardForm {
            base: Some("oat".into()),
            ..next("1")
        };

        assert_eq!(submit(&mut session, &form, None).unwrap(), Transition::Goto(2));
        assert_eq!(session.get("base"), Some("oat"));
        assert_eq!(session.get("name"), None);
    }

    #[test]
    fn test_prev_does_not_touch_session() {
        let mut session = Session::default();
        session.insert("flavor", "mango");

        let form = WizardForm {
            navigation: Some("prev".into()),
            step: Some("3".into()),
            flavor: Some("banana".into()),
            ..Default::default()
        };

        assert_eq!(submit(&mut session, &form, None).unwrap(), Transition::Goto(2));
        assert_eq!(session.get("flavor"), Some("mango"));
    }

    #[test]
    fn test_absent_field_falls_back_to_session() {
        let mut session = Session::default();
        session.insert("base", "oat");

        submit(&mut session, &next("2"), None).unwrap();
        assert_eq!(session.get("base"), Some("oat"));
    }

    #[test]
    fn test_completion_uses_last_submitted_values() {
        let mut session = Session::default();
        let values = [
            ("1", "base", "milk"),
            ("2", "flavor", "cocoa"),
            ("3", "nutrition", "protein"),
            ("4", "texture", "thick"),
        ];

        for (step, field, value) in values {
            let mut form = next(step);
            match field {
                "base" => form.base = Some(value.into()),
                "flavor" => form.flavor = Some(value.into()),
                "nutrition" => form.nutrition = Some(value.into()),
                _ => form.texture = Some(value.into()),
            }
            submit(&mut session, &form, None).unwrap();
        }

        // go back and change the base before finishing
        let back = WizardForm {
            navigation: Some("prev".into()),
            ..next("5")
        };
        assert_eq!(submit(&mut session, &back, None).unwrap(), Transition::Goto(4));
        let rebase = WizardForm {
            base: Some("oat".into()),
            ..next("4")
        };
        submit(&mut session, &rebase, None).unwrap();

        let before = Utc::now();
        let last = WizardForm {
            name: Some("Test".into()),
            ..next("5")
        };
        let Transition::Complete(recipe) = submit(&mut session, &last, None).unwrap() else {
            panic!("expected completion");
        };

        assert_eq!(recipe.base, "oat");
        assert_eq!(recipe.flavor, "cocoa");
        assert_eq!(recipe.nutrition, "protein");
        assert_eq!(recipe.texture, "thick");
        assert_eq!(recipe.name, "Test");
        assert!(recipe.created_at >= before);
        assert!(session.is_empty());
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let mut session = Session::default();
        let Transition::Complete(recipe) = submit(&mut session, &next("5"), None).unwrap() else {
            panic!("expected completion");
        };

        assert_eq!(recipe.base, "");
        assert_eq!(recipe.name, "");
    }

    #[test]
    fn test_defaults_and_bad_steps() {
        let mut session = Session::default();
        assert_eq!(
            submit(&mut session, &WizardForm::default(), None).unwrap(),
            Transition::Goto(2)
        );

        assert!(matches!(
            submit(&mut session, &next("two"), None),
            Err(AppError::MalformedForm(_))
        ));

        assert_eq!(page(None).unwrap().field, "base");
        assert_eq!(page(Some("5")).unwrap().field, "name");
        assert!(matches!(page(Some("0")), Err(AppError::UnknownStep(_))));
        assert!(matches!(page(Some("6")), Err(AppError::UnknownStep(_))));
        assert!(matches!(page(Some("x")), Err(AppError::UnknownStep(_))));
    }

    #[test]
    fn test_step_overflow_is_malformed() {
        let mut session = Session::default();

        assert!(matches!(
            submit(&mut session, &next("9223372036854775807"), None),
            Err(AppError::MalformedForm(_))
        ));

        let back = WizardForm {
            navigation: Some("prev".into()),
            ..next("-9223372036854775808")
        };
        assert!(matches!(
            submit(&mut session, &back, None),
            Err(AppError::MalformedForm(_))
        ));
    }

    #[test]
    fn test_edit_falls_back_to_stored_recipe() {
        let stored = Recipe {
            base: "milk".into(),
            flavor: "mango".into(),
            nutrition: "fiber".into(),
            texture: "smooth".into(),
            name: "Sunrise".into(),
            created_at: Utc::now(),
        };
        let mut session = Session::default();

        let rebase = WizardForm {
            base: Some("oat".into()),
            ..next("1")
        };
        submit(&mut session, &rebase, Some(&stored)).unwrap();
        assert_eq!(session.get("flavor"), None);
        assert_eq!(current_value(&session, Some(&stored), "flavor"), "mango");

        for step in ["2", "3", "4"] {
            submit(&mut session, &next(step), Some(&stored)).unwrap();
        }
        let Transition::Complete(recipe) = submit(&mut session, &next("5"), Some(&stored)).unwrap()
        else {
            panic!("expected completion");
        };

        assert_eq!(recipe.base, "oat");
        assert_eq!(recipe.flavor, "mango");
        assert_eq!(recipe.nutrition, "fiber");
        assert_eq!(recipe.texture, "smooth");
        assert_eq!(recipe.name, "Sunrise");
    }

    #[test]
    fn test_flow_urls() {
        let id = RecipeId::new();

        assert_eq!(Flow::Create.step_url(2), "/create?step=2");
        assert_eq!(Flow::Edit(id).step_url(0), format!("/edit/{id}?step=0"));
    }

    #[test]
    fn test_navigation_parsing() {
        assert_eq!(Navigation::parse(None), Navigation::Next);
        assert_eq!(Navigation::parse(Some("next")), Navigation::Next);
        assert_eq!(Navigation::parse(Some("prev")), Navigation::Prev);
        assert_eq!(Navigation::parse(Some("back")), Navigation::Prev);
    }
}
