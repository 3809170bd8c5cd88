// Read-time population. Reference fields are replaced with the referenced
// entity's data (or a projection of it) when a view is assembled; nothing
// here is ever persisted.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Class, Comment, Project, Reply, Team, User, Workspace};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct ViewerService {
    store: EntityStore,
}

impl ViewerService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Safe projection of a user: no credential hash, no access token.
    pub async fn user_projection(&self, user_id: Uuid) -> AppResult<Value> {
        match self.store.find_by_id::<User>(user_id).await? {
            Some(user) => Ok(project_user(&user)),
            // A dangling author reference should never happen (deletion
            // reassigns to the sentinel), but a view must not 500 on one.
            None => Ok(json!({ "id": user_id, "name": "Unknown", "role": null })),
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Value> {
        let user: User = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "profile_image": user.profile_image,
            "liked_comments": user.liked_comments,
            "liked_replies": user.liked_replies,
            "workspaces": user.workspaces,
            "teams": user.teams,
        }))
    }

    pub async fn get_workspace(&self, workspace_id: Uuid) -> AppResult<Value> {
        let workspace: Workspace = self
            .store
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workspace {} not found", workspace_id)))?;

        let mut teams = Vec::new();
        for team_id in &workspace.teams {
            if let Some(team) = self.store.find_by_id::<Team>(*team_id).await? {
                teams.push(json!({
                    "id": team.id,
                    "team_name": team.team_name,
                    "assigned_teachers": team.assigned_teachers,
                    "assigned_students": team.assigned_students,
                    "access_to": team.access_to,
                }));
            }
        }

        Ok(json!({
            "id": workspace.id,
            "name": workspace.name,
            "created_by": workspace.created_by,
            "teams": teams,
        }))
    }

    pub async fn get_class(&self, class_id: Uuid) -> AppResult<Value> {
        let class: Class = self
            .store
            .find_by_id(class_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))?;

        let mut projects = Vec::new();
        for project_id in &class.projects {
            if let Some(project) = self.store.find_by_id::<Project>(*project_id).await? {
                projects.push(json!({
                    "id": project.id,
                    "name": project.name,
                    "description": project.description,
                    "thumbnail": project.thumbnail,
                    "comment_count": project.comments.len(),
                }));
            }
        }

        Ok(json!({
            "id": class.id,
            "title": class.title,
            "workspace_id": class.workspace_id,
            "projects": projects,
        }))
    }

    /// Full project view: comments with their authors and replies attached.
    pub async fn get_project(&self, project_id: Uuid) -> AppResult<Value> {
        let project: Project = self
            .store
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        let mut comments: Vec<Comment> = self
            .store
            .find_many(|c: &Comment| c.project_id == project_id)
            .await?;
        comments.sort_by_key(|c| c.created_at);

        let mut comment_views = Vec::new();
        for comment in &comments {
            comment_views.push(self.populate_comment(comment).await?);
        }

        Ok(json!({
            "id": project.id,
            "class_id": project.class_id,
            "name": project.name,
            "description": project.description,
            "video": project.video,
            "thumbnail": project.thumbnail,
            "project_created_by": self.user_projection(project.project_created_by).await?,
            "comments": comment_views,
        }))
    }

    async fn populate_comment(&self, comment: &Comment) -> AppResult<Value> {
        let mut replies: Vec<Reply> = self
            .store
            .find_many(|r: &Reply| r.comment_id == comment.id)
            .await?;
        replies.sort_by_key(|r| r.created_at);

        let mut reply_views = Vec::new();
        for reply in &replies {
            reply_views.push(json!({
                "id": reply.id,
                "content": reply.content,
                "created_at": reply.created_at,
                "is_checked": reply.is_checked,
                "reply_created_by": self.user_projection(reply.reply_created_by).await?,
                "likes": reply.reply_likes.len(),
            }));
        }

        Ok(json!({
            "id": comment.id,
            "content": comment.content,
            "created_at": comment.created_at,
            "time_stamp": comment.time_stamp,
            "is_checked": comment.is_checked,
            "comment_type": comment.comment_type,
            "comment_created_by": self.user_projection(comment.comment_created_by).await?,
            "replies": reply_views,
            "likes": comment.likes.len(),
        }))
    }
}

fn project_user(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "profile_image": user.profile_image,
    })
}
