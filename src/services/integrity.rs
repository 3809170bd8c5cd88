// Referential integrity engine. SQLite has no cascade rules for documents,
// so every delete that has dependents runs as a multi-statement transaction
// ordered leaf-to-root: replies before comments before projects before the
// class. A failure mid-cascade rolls the whole operation back.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Class, Comment, Principal, Project, Reply, Team, User, Workspace, DELETED_USER_ID};
use crate::store::{EntityStore, StoreTx};

#[derive(Clone)]
pub struct IntegrityEngine {
    store: EntityStore,
}

impl IntegrityEngine {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Deletes a class and everything under it, walking the transitive
    /// Class -> Project -> Comment -> Reply chain.
    pub async fn delete_class(&self, class_id: Uuid) -> AppResult<Class> {
        let mut tx = self.store.begin().await?;

        let class: Class = match tx.find_by_id(class_id).await? {
            Some(class) => class,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Class {} not found", class_id)));
            }
        };

        let projects: Vec<Project> = tx.find_many(|p: &Project| p.class_id == class_id).await?;
        let project_ids: HashSet<Uuid> = projects.iter().map(|p| p.id).collect();

        let comments: Vec<Comment> = tx
            .find_many(|c: &Comment| project_ids.contains(&c.project_id))
            .await?;
        let comment_ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

        let replies_deleted = tx
            .delete_many(|r: &Reply| comment_ids.contains(&r.comment_id))
            .await?;
        let comments_deleted = tx
            .delete_many(|c: &Comment| project_ids.contains(&c.project_id))
            .await?;
        let projects_deleted = tx
            .delete_many(|p: &Project| p.class_id == class_id)
            .await?;
        tx.delete_by_id::<Class>(class_id).await?;

        tx.commit().await?;

        info!(
            class_id = %class_id,
            projects = projects_deleted,
            comments = comments_deleted,
            replies = replies_deleted,
            "class cascade complete"
        );
        Ok(class)
    }

    /// Deletes a project, its comments and their replies, and unlinks the
    /// project from its parent class.
    pub async fn delete_project(&self, project_id: Uuid) -> AppResult<Project> {
        let mut tx = self.store.begin().await?;

        let project: Project = match tx.find_by_id(project_id).await? {
            Some(project) => project,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Project {} not found", project_id)));
            }
        };

        let comments: Vec<Comment> = tx.find_many(|c: &Comment| c.project_id == project_id).await?;
        let comment_ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

        tx.delete_many(|r: &Reply| comment_ids.contains(&r.comment_id)).await?;
        tx.delete_many(|c: &Comment| c.project_id == project_id).await?;
        tx.delete_by_id::<Project>(project_id).await?;

        if let Some(mut class) = tx.find_by_id::<Class>(project.class_id).await? {
            class.projects.retain(|id| *id != project_id);
            tx.update_by_id(&class).await?;
        }

        tx.commit().await?;
        Ok(project)
    }

    /// Only the comment's author or a teacher may delete it. Replies go
    /// first, then the comment leaves its parent project's list.
    pub async fn delete_comment(&self, comment_id: Uuid, principal: Principal) -> AppResult<Comment> {
        let mut tx = self.store.begin().await?;

        let comment: Comment = match tx.find_by_id(comment_id).await? {
            Some(comment) => comment,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
            }
        };

        if comment.comment_created_by != principal.id && !principal.is_teacher() {
            tx.rollback().await?;
            return Err(AppError::Forbidden(
                "Only the comment author or a teacher can delete a comment".to_string(),
            ));
        }

        tx.delete_many(|r: &Reply| r.comment_id == comment_id).await?;

        if let Some(mut project) = tx.find_by_id::<Project>(comment.project_id).await? {
            project.comments.retain(|id| *id != comment_id);
            tx.update_by_id(&project).await?;
        }

        tx.delete_by_id::<Comment>(comment_id).await?;

        tx.commit().await?;
        Ok(comment)
    }

    /// Reply deletion carries no authorization check; current behavior,
    /// kept deliberately (see DESIGN.md).
    pub async fn delete_reply(&self, reply_id: Uuid) -> AppResult<Reply> {
        let mut tx = self.store.begin().await?;

        let reply: Reply = match tx.find_by_id(reply_id).await? {
            Some(reply) => reply,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Reply {} not found", reply_id)));
            }
        };

        if let Some(mut comment) = tx.find_by_id::<Comment>(reply.comment_id).await? {
            comment.replies.retain(|id| *id != reply_id);
            tx.update_by_id(&comment).await?;
        }

        tx.delete_by_id::<Reply>(reply_id).await?;

        tx.commit().await?;
        Ok(reply)
    }

    /// Deletes a user inside one transaction, reassigning everything they
    /// authored to the placeholder user so population never dangles.
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        if user_id == *DELETED_USER_ID {
            return Err(AppError::Validation(
                "The placeholder user cannot be deleted".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        if tx.find_by_id::<User>(user_id).await?.is_none() {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        ensure_sentinel(&mut tx).await?;

        let mut authored_comments: Vec<Comment> = tx
            .find_many(|c: &Comment| c.comment_created_by == user_id)
            .await?;
        for comment in &mut authored_comments {
            comment.comment_created_by = *DELETED_USER_ID;
            tx.update_by_id(comment).await?;
        }

        let mut authored_replies: Vec<Reply> = tx
            .find_many(|r: &Reply| r.reply_created_by == user_id)
            .await?;
        for reply in &mut authored_replies {
            reply.reply_created_by = *DELETED_USER_ID;
            tx.update_by_id(reply).await?;
        }

        tx.delete_by_id::<User>(user_id).await?;

        tx.commit().await?;

        info!(
            user_id = %user_id,
            comments = authored_comments.len(),
            replies = authored_replies.len(),
            "user deleted, authored content reassigned"
        );
        Ok(())
    }

    /// Direct delete. Teams under the workspace are left in place; the
    /// count is logged so the orphans are observable.
    pub async fn delete_workspace(&self, workspace_id: Uuid) -> AppResult<Workspace> {
        let workspace: Workspace = self
            .store
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workspace {} not found", workspace_id)))?;

        self.store.delete_by_id::<Workspace>(workspace_id).await?;

        if !workspace.teams.is_empty() {
            info!(
                workspace_id = %workspace_id,
                teams = workspace.teams.len(),
                "workspace deleted without cascading to its teams"
            );
        }
        Ok(workspace)
    }

    /// Drops the membership edge in both directions; deletes neither the
    /// user nor the team.
    pub async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        let mut team: Team = match tx.find_by_id(team_id).await? {
            Some(team) => team,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Team {} not found", team_id)));
            }
        };
        let mut user: User = match tx.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
        };

        team.assigned_teachers.remove(&user_id);
        team.assigned_students.remove(&user_id);
        user.teams.remove(&team_id);

        tx.update_by_id(&team).await?;
        tx.update_by_id(&user).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Inserts the placeholder user if it is not already present. Runs both at
/// boot and inside the user-deletion transaction.
pub async fn ensure_sentinel(tx: &mut StoreTx) -> AppResult<()> {
    if tx.find_by_id::<User>(*DELETED_USER_ID).await?.is_none() {
        tx.insert(&User::deleted_sentinel()).await?;
    }
    Ok(())
}
