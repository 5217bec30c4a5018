//! Tasks service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use common::{identity::Caller, users::UserDirectory};
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    filter::TaskFilter,
    middleware::auth_middleware,
    models::{
        AssigneeParam, NewComment, NewTask, PageParams, PageRequest, PriorityParam, Sort,
        StatusParam, TaskQuery, TaskUpdate,
    },
    repositories::TaskStore,
    settings::Settings,
    state::AppState,
};

/// Create the router for the tasks service
pub fn create_router<S, U>(state: AppState<S, U>) -> Router
where
    S: TaskStore + Clone + 'static,
    U: UserDirectory + Clone + 'static,
{
    let protected_routes = Router::new()
        .route("/tasks", post(create_task::<S, U>).get(list_tasks::<S, U>))
        .route(
            "/tasks/:id",
            get(get_task::<S, U>)
                .put(update_task::<S, U>)
                .delete(delete_task::<S, U>),
        )
        .route("/tasks/:id/status", put(update_status::<S, U>))
        .route("/tasks/:id/priority", put(update_priority::<S, U>))
        .route("/tasks/:id/assignee", put(assign_task::<S, U>))
        .route(
            "/tasks/:id/comments",
            post(add_comment::<S, U>).get(get_comments::<S, U>),
        )
        .route("/tasks/:id/status/user", put(update_status_as_assignee::<S, U>))
        .route("/tasks/:id/comments/user", post(add_comment_as_assignee::<S, U>))
        .route("/tasks/author/:author_id", get(tasks_by_author::<S, U>))
        .route("/tasks/assignee/:assignee_id", get(tasks_by_assignee::<S, U>))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tasks-service"
    }))
}

/// Resolve listing parameters against the configured page sizes
fn page_request(params: &PageParams, settings: &Settings) -> ApiResult<PageRequest> {
    let size = params
        .size
        .unwrap_or(settings.default_page_size)
        .clamp(1, settings.max_page_size);

    let sort = match params.sort.as_deref() {
        Some(sort) => sort.parse::<Sort>().map_err(ApiError::BadRequest)?,
        None => Sort::default(),
    };

    Ok(PageRequest::new(params.page.unwrap_or(0), size).with_sort(sort))
}

async fn create_task<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    let task = state.task_service.create_task(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskUpdate>,
) -> ApiResult<impl IntoResponse> {
    let task = state.task_service.update_task(&caller, id, payload).await?;
    Ok(Json(task))
}

async fn delete_task<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.task_service.delete_task(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Query(param): Query<StatusParam>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .task_service
        .update_status(&caller, id, param.status)
        .await?;
    Ok(Json(task))
}

async fn update_priority<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Query(param): Query<PriorityParam>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .task_service
        .update_priority(&caller, id, param.priority)
        .await?;
    Ok(Json(task))
}

async fn assign_task<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Query(param): Query<AssigneeParam>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .task_service
        .assign(&caller, id, param.assignee_id)
        .await?;
    Ok(Json(task))
}

/// Admin comment; a missing or malformed body is reported as a blank comment
async fn add_comment<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    payload: Option<Json<NewComment>>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .task_service
        .add_comment(&caller, id, payload.map(|Json(comment)| comment))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_status_as_assignee<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Query(param): Query<StatusParam>,
) -> ApiResult<impl IntoResponse> {
    let task = state
        .task_service
        .update_status_as_assignee(&caller, id, param.status)
        .await?;
    Ok(Json(task))
}

async fn add_comment_as_assignee<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    payload: Option<Json<NewComment>>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .task_service
        .add_comment_as_assignee(&caller, id, payload.map(|Json(comment)| comment))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_task<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let task = state.task_service.get_by_id(id).await?;
    Ok(Json(task))
}

async fn get_comments<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let comments = state.task_service.get_comments(id).await?;
    Ok(Json(comments))
}

async fn tasks_by_author<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Path(author_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = page_request(&params, &state.settings)?;
    let tasks = state.task_service.get_by_author(author_id, page).await?;
    Ok(Json(tasks))
}

async fn tasks_by_assignee<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Path(assignee_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = page_request(&params, &state.settings)?;
    let tasks = state.task_service.get_by_assignee(assignee_id, page).await?;
    Ok(Json(tasks))
}

async fn list_tasks<S: TaskStore, U: UserDirectory>(
    State(state): State<AppState<S, U>>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_request(&query.paging(), &state.settings)?;
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        author_id: query.author_id,
        assignee_id: query.assignee_id,
    };

    let tasks = state.task_service.get_all(filter, page).await?;
    Ok(Json(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, SortField};

    fn settings() -> Settings {
        Settings {
            default_page_size: 20,
            max_page_size: 50,
            ..Settings::default()
        }
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        let defaulted = page_request(&PageParams::default(), &settings()).unwrap();
        assert_eq!((defaulted.page, defaulted.size), (0, 20));

        let params = PageParams {
            page: Some(2),
            size: Some(500),
            sort: None,
        };
        assert_eq!(page_request(&params, &settings()).unwrap().size, 50);
    }

    #[test]
    fn sort_parameter_is_parsed_or_rejected() {
        let params = PageParams {
            sort: Some("priority,desc".to_string()),
            ..PageParams::default()
        };
        assert_eq!(
            page_request(&params, &settings()).unwrap().sort,
            Sort::new(SortField::Priority, SortDirection::Desc)
        );

        let bad = PageParams {
            sort: Some("password".to_string()),
            ..PageParams::default()
        };
        assert!(matches!(
            page_request(&bad, &settings()),
            Err(ApiError::BadRequest(_))
        ));
    }
}
