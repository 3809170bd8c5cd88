// HTTP surface. Handlers stay thin: parse ids, pull the principal, call a
// service, wrap the outcome in a tagged JSON body. Wire encoding is the
// only concern at this layer.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{CommentType, Principal, Role},
    services::srt::DEFAULT_SUBTITLE_SECONDS,
};

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid id format: {}", raw)))
}

fn ok(payload: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": payload }))
}

// Request bodies are explicit shapes; unknown fields are rejected before
// anything touches storage.

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub workspace_id: Uuid,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassAccessRequest {
    pub class_id: Uuid,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateClassRequest {
    pub title: String,
    pub workspace_id: Uuid,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub class_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub project_id: Uuid,
    pub content: String,
    pub time_stamp: Option<String>,
    pub comment_type: CommentType,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
    pub is_checked: Option<bool>,
    pub time_stamp: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReplyRequest {
    pub comment_id: Uuid,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReplyRequest {
    pub content: Option<String>,
    pub is_checked: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInvitationRequest {
    pub workspace_id: Uuid,
    pub allowed_role: Role,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SrtQuery {
    pub duration: Option<f64>,
}

// Users

async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .catalog
        .create_user(req.name, req.email, req.password_hash, req.role)
        .await?;
    Ok(ok(json!({ "id": user.id, "name": user.name, "email": user.email, "role": user.role })))
}

async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.viewer.get_user(parse_id(&id)?).await?))
}

async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .catalog
        .update_user(parse_id(&id)?, principal, req.name, req.profile_image)
        .await?;
    Ok(ok(json!({ "id": user.id, "name": user.name, "profile_image": user.profile_image })))
}

async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    state.integrity.delete_user(id).await?;
    Ok(ok(json!({ "deleted_user": id })))
}

// Workspaces

async fn create_workspace_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<Json<Value>, AppError> {
    let workspace = state.catalog.create_workspace(req.name, principal).await?;
    Ok(ok(json!({ "id": workspace.id, "name": workspace.name })))
}

async fn get_workspace_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.viewer.get_workspace(parse_id(&id)?).await?))
}

async fn delete_workspace_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let workspace = state.integrity.delete_workspace(parse_id(&id)?).await?;
    Ok(ok(json!({ "deleted_workspace": workspace.id })))
}

// Teams

async fn create_team_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateTeamRequest>,
) -> Result<Json<Value>, AppError> {
    let team = state
        .catalog
        .create_team(req.team_name, req.workspace_id, principal)
        .await?;
    Ok(ok(json!({ "id": team.id, "team_name": team.team_name, "workspace_id": team.workspace_id })))
}

async fn assign_teacher_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<Value>, AppError> {
    let team = state.catalog.assign_teacher(parse_id(&id)?, req.user_id).await?;
    Ok(ok(json!({ "id": team.id, "assigned_teachers": team.assigned_teachers })))
}

async fn assign_student_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<Value>, AppError> {
    let team = state.catalog.assign_student(parse_id(&id)?, req.user_id).await?;
    Ok(ok(json!({ "id": team.id, "assigned_students": team.assigned_students })))
}

async fn grant_class_access_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ClassAccessRequest>,
) -> Result<Json<Value>, AppError> {
    let team = state.catalog.grant_class_access(parse_id(&id)?, req.class_id).await?;
    Ok(ok(json!({ "id": team.id, "access_to": team.access_to })))
}

async fn remove_team_member_handler(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state
        .integrity
        .remove_team_member(parse_id(&team_id)?, parse_id(&user_id)?)
        .await?;
    Ok(ok(json!({ "removed": true })))
}

// Classes

async fn create_class_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateClassRequest>,
) -> Result<Json<Value>, AppError> {
    let class = state.catalog.create_class(req.title, req.workspace_id).await?;
    Ok(ok(json!({ "id": class.id, "title": class.title })))
}

async fn get_class_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.viewer.get_class(parse_id(&id)?).await?))
}

async fn delete_class_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let class = state.integrity.delete_class(parse_id(&id)?).await?;
    Ok(ok(json!({ "deleted_class": class.id, "title": class.title })))
}

// Projects

async fn create_project_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<Value>, AppError> {
    let project = state
        .catalog
        .create_project(req.class_id, req.name, req.description, req.video, req.thumbnail, principal)
        .await?;
    Ok(ok(json!({ "id": project.id, "name": project.name, "class_id": project.class_id })))
}

async fn get_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.viewer.get_project(parse_id(&id)?).await?))
}

async fn update_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Value>, AppError> {
    let project = state
        .catalog
        .update_project(parse_id(&id)?, req.name, req.description, req.video, req.thumbnail)
        .await?;
    Ok(ok(json!({ "id": project.id, "name": project.name })))
}

async fn delete_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let project = state.integrity.delete_project(parse_id(&id)?).await?;
    Ok(ok(json!({ "deleted_project": project.id, "name": project.name })))
}

async fn export_srt_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SrtQuery>,
) -> Result<Response, AppError> {
    let duration = query.duration.unwrap_or(DEFAULT_SUBTITLE_SECONDS);
    let track = state.srt.export(parse_id(&id)?, duration).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        track,
    )
        .into_response())
}

// Comments

async fn create_comment_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let comment = state
        .catalog
        .create_comment(req.project_id, req.content, req.time_stamp, req.comment_type, principal)
        .await?;
    Ok(ok(json!({ "id": comment.id, "project_id": comment.project_id })))
}

async fn update_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<Value>, AppError> {
    let comment = state
        .catalog
        .update_comment(parse_id(&id)?, req.content, req.is_checked, req.time_stamp)
        .await?;
    Ok(ok(json!({ "id": comment.id, "is_checked": comment.is_checked })))
}

async fn delete_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let comment = state.integrity.delete_comment(parse_id(&id)?, principal).await?;
    Ok(ok(json!({ "deleted_comment": comment.id })))
}

async fn toggle_comment_like_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let outcome = state.likes.toggle_comment_like(parse_id(&id)?, principal).await?;
    Ok(ok(json!({ "liked": outcome.liked, "total_likes": outcome.total_likes })))
}

// Replies

async fn create_reply_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateReplyRequest>,
) -> Result<Json<Value>, AppError> {
    let reply = state.catalog.create_reply(req.comment_id, req.content, principal).await?;
    Ok(ok(json!({ "id": reply.id, "comment_id": reply.comment_id })))
}

async fn update_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReplyRequest>,
) -> Result<Json<Value>, AppError> {
    let reply = state
        .catalog
        .update_reply(parse_id(&id)?, req.content, req.is_checked)
        .await?;
    Ok(ok(json!({ "id": reply.id, "is_checked": reply.is_checked })))
}

async fn delete_reply_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let reply = state.integrity.delete_reply(parse_id(&id)?).await?;
    Ok(ok(json!({ "deleted_reply": reply.id })))
}

async fn toggle_reply_like_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    let outcome = state.likes.toggle_reply_like(parse_id(&id)?, principal).await?;
    Ok(ok(json!({ "liked": outcome.liked, "total_likes": outcome.total_likes })))
}

// Invitations

async fn create_invitation_handler(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<Json<Value>, AppError> {
    let created = state
        .invitations
        .create(req.workspace_id, req.allowed_role, principal)
        .await?;
    Ok(ok(json!({ "signup_link": created.signup_link, "expires_at": created.expires_at })))
}

async fn validate_invitation_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (workspace, expires_at) = state.invitations.validate(&token).await?;
    Ok(ok(json!({
        "workspace": { "id": workspace.id, "name": workspace.name },
        "expires_at": expires_at,
    })))
}

async fn use_invitation_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    state.invitations.use_invitation(&token, principal).await?;
    Ok(ok(json!({ "joined": true })))
}

async fn deactivate_invitation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    state.invitations.deactivate(parse_id(&id)?, principal).await?;
    Ok(ok(json!({ "deactivated": true })))
}

async fn delete_invitation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    state.invitations.delete(parse_id(&id)?, principal).await?;
    Ok(ok(json!({ "deleted": true })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Users
        .route("/users", post(create_user_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/users/{id}", patch(update_user_handler))
        .route("/users/{id}", delete(delete_user_handler))
        // Workspaces
        .route("/workspaces", post(create_workspace_handler))
        .route("/workspaces/{id}", get(get_workspace_handler))
        .route("/workspaces/{id}", delete(delete_workspace_handler))
        // Teams
        .route("/teams", post(create_team_handler))
        .route("/teams/{id}/teachers", post(assign_teacher_handler))
        .route("/teams/{id}/students", post(assign_student_handler))
        .route("/teams/{id}/classes", post(grant_class_access_handler))
        .route("/teams/{team_id}/members/{user_id}", delete(remove_team_member_handler))
        // Classes
        .route("/classes", post(create_class_handler))
        .route("/classes/{id}", get(get_class_handler))
        .route("/classes/{id}", delete(delete_class_handler))
        // Projects
        .route("/projects", post(create_project_handler))
        .route("/projects/{id}", get(get_project_handler))
        .route("/projects/{id}", patch(update_project_handler))
        .route("/projects/{id}", delete(delete_project_handler))
        .route("/projects/{id}/export/srt", get(export_srt_handler))
        // Comments
        .route("/comments", post(create_comment_handler))
        .route("/comments/{id}", patch(update_comment_handler))
        .route("/comments/{id}", delete(delete_comment_handler))
        .route("/comments/{id}/like", post(toggle_comment_like_handler))
        // Replies
        .route("/replies", post(create_reply_handler))
        .route("/replies/{id}", patch(update_reply_handler))
        .route("/replies/{id}", delete(delete_reply_handler))
        .route("/replies/{id}/like", post(toggle_reply_like_handler))
        // Invitations
        .route("/invitations", post(create_invitation_handler))
        .route("/invitations/validate/{token}", get(validate_invitation_handler))
        .route("/invitations/use/{token}", post(use_invitation_handler))
        .route("/invitations/{id}/deactivate", post(deactivate_invitation_handler))
        .route("/invitations/{id}", delete(delete_invitation_handler))
        .with_state(state)
}
