//! CRUD handlers, generic over the entity type.
//!
//! Each collection is mounted under `/api/v1/<name>`:
//!
//! | method   | path          | result                          |
//! |----------|---------------|---------------------------------|
//! | `GET`    | `/`           | every document                  |
//! | `GET`    | `/count`      | `{"count": n}`                  |
//! | `GET`    | `/{id}`       | the document or 404             |
//! | `GET`    | `/key/{key}`  | first match or 404 (keyed only) |
//! | `POST`   | `/`           | 201 with the stored document    |
//! | `PUT`    | `/`           | 204, full replace by `_id`      |
//! | `DELETE` | `/{id}`       | 204                             |
//!
//! Logs are mounted read-only: entries are only written by the server
//! through `LoggerService`, which stamps their time. `count` is not
//! accepted as a caller-supplied `_id` since `/count` would shadow it.

use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestCancel;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use docapi::{Doujin, Log, Services, Setting, Stats, User};
use serde_json::json;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use store::{Document, EntityService, Keyed};

/// Route names of every mounted collection.
pub const COLLECTIONS: [&str; 5] = [
    User::NAME,
    Log::NAME,
    Setting::NAME,
    Stats::NAME,
    Doujin::NAME,
];

/// Path segment of the count route, unusable as a document id.
const RESERVED_ID: &str = "count";

/// An entity served over HTTP: its route name and where its service lives.
pub trait Resource: Document {
    const NAME: &'static str;

    fn service(services: &Services) -> &EntityService<Self>;
}

impl Resource for User {
    const NAME: &'static str = "users";

    fn service(services: &Services) -> &EntityService<Self> {
        &services.users
    }
}

impl Resource for Log {
    const NAME: &'static str = "logs";

    fn service(services: &Services) -> &EntityService<Self> {
        &services.logs
    }
}

impl Resource for Setting {
    const NAME: &'static str = "settings";

    fn service(services: &Services) -> &EntityService<Self> {
        &services.settings
    }
}

impl Resource for Stats {
    const NAME: &'static str = "stats";

    fn service(services: &Services) -> &EntityService<Self> {
        &services.stats
    }
}

impl Resource for Doujin {
    const NAME: &'static str = "doujins";

    fn service(services: &Services) -> &EntityService<Self> {
        &services.doujins
    }
}

/// Mount every collection on `router`.
pub fn mount(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let router = keyed_collection::<User>(router);
    let router = read_only_collection::<Log>(router);
    let router = keyed_collection::<Setting>(router);
    let router = keyed_collection::<Stats>(router);
    keyed_collection::<Doujin>(router)
}

/// Mount the identity-based routes for `T`.
pub fn collection<T: Resource>(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let base = format!("/api/v1/{}", T::NAME);
    read_only_collection::<T>(router).route(&base, post(create::<T>).put(update::<T>))
}

/// Mount list, count, lookup and delete for `T`; no create or replace.
pub fn read_only_collection<T: Resource>(
    router: Router<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    let base = format!("/api/v1/{}", T::NAME);
    router
        .route(&base, get(list::<T>))
        .route(&format!("{base}/count"), get(count::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(get_by_id::<T>).delete(delete::<T>),
        )
}

/// Mount the identity-based routes plus `/key/{key}` for `T`.
pub fn keyed_collection<T>(router: Router<Arc<AppState>>) -> Router<Arc<AppState>>
where
    T: Resource + Keyed,
    T::Key: FromStr,
    <T::Key as FromStr>::Err: Display,
{
    let path = format!("/api/v1/{}/key/{{key}}", T::NAME);
    collection::<T>(router).route(&path, get(get_by_key::<T>))
}

pub async fn list<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
) -> ServerResult<Json<Vec<T>>> {
    let documents = T::service(&state.services).list(&cancel).await?;
    Ok(Json(documents))
}

pub async fn count<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
) -> ServerResult<impl IntoResponse> {
    let count = T::service(&state.services).count(&cancel).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn get_by_id<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
    Path(id): Path<String>,
) -> ServerResult<Json<T>> {
    T::service(&state.services)
        .find_by_id(&id, &cancel)
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

pub async fn get_by_key<T>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
    Path(raw): Path<String>,
) -> ServerResult<Json<T>>
where
    T: Resource + Keyed,
    T::Key: FromStr,
    <T::Key as FromStr>::Err: Display,
{
    let key = raw
        .parse::<T::Key>()
        .map_err(|e| ServerError::BadRequest(format!("invalid key {raw:?}: {e}")))?;

    T::service(&state.services)
        .find_by_key(key, &cancel)
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

pub async fn create<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
    body: Result<Json<T>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(document) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    if document.id() == Some(RESERVED_ID) {
        return Err(ServerError::BadRequest(format!(
            "`{RESERVED_ID}` is reserved and cannot be used as an _id"
        )));
    }
    let stored = T::service(&state.services).create(document, &cancel).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
    body: Result<Json<T>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(document) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    T::service(&state.services).update(document, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete<T: Resource>(
    State(state): State<Arc<AppState>>,
    RequestCancel(cancel): RequestCancel,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    T::service(&state.services).delete(&id, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}
