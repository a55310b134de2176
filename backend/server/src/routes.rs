use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, header::SET_COOKIE},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::AppError,
    extract::{Form, Path, Query},
    listing::{ListParams, ListQuery},
    recipe::{Recipe, RecipeId},
    state::State,
    views,
    wizard::{self, Flow, Transition, WizardForm},
};

type AppState = AxumState<Arc<State>>;

#[derive(Deserialize)]
pub struct StepParams {
    step: Option<String>,
}

fn parse_id(raw: &str) -> Result<RecipeId, AppError> {
    raw.parse()
        .map_err(|_| AppError::MalformedId(raw.to_string()))
}

pub async fn home_handler() -> Html<String> {
    Html(views::index())
}

pub async fn read_handler(
    AxumState(state): AppState,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, AppError> {
    let query = ListQuery::from_params(&params);
    let records = query.apply(state.store.list().await?);

    Ok(Html(views::recipe_list(&records, &query)))
}

pub async fn create_form_handler(
    AxumState(state): AppState,
    headers: HeaderMap,
    Query(params): Query<StepParams>,
) -> Result<Html<String>, AppError> {
    let page = wizard::page(params.step.as_deref())?;
    let session = state.sessions.load(&headers);

    Ok(Html(views::step_form(
        Flow::Create,
        page,
        session.get(page.field).unwrap_or_default(),
    )))
}

pub async fn create_submit_handler(
    AxumState(state): AppState,
    headers: HeaderMap,
    Form(form): Form<WizardForm>,
) -> Result<Response, AppError> {
    submit(&state, &headers, Flow::Create, &form, None).await
}

pub async fn edit_form_handler(
    AxumState(state): AppState,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<StepParams>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&raw_id)?;
    let page = wizard::page(params.step.as_deref())?;
    let stored = state.store.get(&id).await?.ok_or(AppError::RecipeNotFound)?;
    let session = state.sessions.load(&headers);

    // what the user typed this session wins over the stored value
    let value = wizard::current_value(&session, Some(&stored.recipe), page.field);

    Ok(Html(views::step_form(Flow::Edit(id), page, value)))
}

pub async fn edit_submit_handler(
    AxumState(state): AppState,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<WizardForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id)?;
    let stored = state.store.get(&id).await?;

    submit(
        &state,
        &headers,
        Flow::Edit(id),
        &form,
        stored.as_ref().map(|record| &record.recipe),
    )
    .await
}

async fn submit(
    state: &State,
    headers: &HeaderMap,
    flow: Flow,
    form: &WizardForm,
    stored: Option<&Recipe>,
) -> Result<Response, AppError> {
    let mut session = state.sessions.load(headers);

    let location = match wizard::submit(&mut session, form, stored)? {
        Transition::Goto(step) => flow.step_url(step),
        Transition::Complete(recipe) => {
            match flow {
                Flow::Create => {
                    let id = state.store.insert(recipe).await?;
                    info!("Created recipe {id}");
                }
                Flow::Edit(id) => {
                    if state.store.replace(&id, recipe).await? {
                        info!("Replaced recipe {id}");
                    } else {
                        warn!("Edit finished for missing recipe {id}");
                    }
                }
            }
            "/read".to_string()
        }
    };

    let cookie = state.sessions.save(&session)?;

    Ok(([(SET_COOKIE, cookie)], Redirect::to(&location)).into_response())
}

pub async fn delete_handler(
    AxumState(state): AppState,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&raw_id)?;

    if state.store.delete(&id).await? {
        info!("Deleted recipe {id}");
    }

    Ok(Redirect::to("/read"))
}

pub async fn webhook_handler(
    AxumState(state): AppState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    state.deployer.authorize(&headers, &body)?;

    info!("Webhook accepted, deploying");
    let output = state.deployer.run().await?;

    Ok(format!("output: {output}").into_response())
}

pub async fn not_found_handler() -> AppError {
    AppError::PageNotFound
}
