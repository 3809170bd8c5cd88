// Construction and patch operations. Creation validates parent references
// up front (a comment must point at a live project, a reply at a live
// comment) and registers the child in the parent's list inside the same
// transaction.

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Class, Comment, CommentType, Principal, Project, Reply, Role, Team, User, Workspace,
};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct CatalogService {
    store: EntityStore,
}

impl CatalogService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    pub async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
    ) -> AppResult<User> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if password_hash.is_empty() {
            return Err(AppError::Validation("Credential hash is required".to_string()));
        }

        if self
            .store
            .find_one_by_field::<User>("$.email", &email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!("Email {} is already registered", email)));
        }

        let user = User::new(name, email, password_hash, role);
        self.store.insert(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        principal: Principal,
        name: Option<String>,
        profile_image: Option<String>,
    ) -> AppResult<User> {
        if principal.id != user_id {
            return Err(AppError::Forbidden("Users can only modify their own profile".to_string()));
        }

        let mut user: User = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(profile_image) = profile_image {
            user.profile_image = Some(profile_image);
        }

        self.store.update_by_id(&user).await?;
        Ok(user)
    }

    /// The creator joins the workspace they created.
    pub async fn create_workspace(&self, name: String, principal: Principal) -> AppResult<Workspace> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Workspace name is required".to_string()));
        }

        let workspace = Workspace::new(name, principal.id);

        let mut tx = self.store.begin().await?;
        tx.insert(&workspace).await?;
        if let Some(mut user) = tx.find_by_id::<User>(principal.id).await? {
            user.workspaces.insert(workspace.id);
            tx.update_by_id(&user).await?;
        }
        tx.commit().await?;

        Ok(workspace)
    }

    pub async fn create_team(
        &self,
        team_name: String,
        workspace_id: Uuid,
        principal: Principal,
    ) -> AppResult<Team> {
        let mut tx = self.store.begin().await?;

        let mut workspace: Workspace = match tx.find_by_id(workspace_id).await? {
            Some(workspace) => workspace,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Workspace {} not found", workspace_id)));
            }
        };

        let team = Team::new(team_name, principal.id, workspace_id);
        tx.insert(&team).await?;

        workspace.teams.push(team.id);
        tx.update_by_id(&workspace).await?;

        tx.commit().await?;
        Ok(team)
    }

    /// Teacher assignment checks the role at assignment time; a later role
    /// change is not re-validated.
    pub async fn assign_teacher(&self, team_id: Uuid, user_id: Uuid) -> AppResult<Team> {
        self.assign_member(team_id, user_id, true).await
    }

    pub async fn assign_student(&self, team_id: Uuid, user_id: Uuid) -> AppResult<Team> {
        self.assign_member(team_id, user_id, false).await
    }

    async fn assign_member(&self, team_id: Uuid, user_id: Uuid, as_teacher: bool) -> AppResult<Team> {
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

        if as_teacher {
            if user.role != Role::Teacher {
                tx.rollback().await?;
                return Err(AppError::Validation(
                    "Only users with the teacher role can be assigned as teachers".to_string(),
                ));
            }
            team.assigned_teachers.insert(user_id);
        } else {
            team.assigned_students.insert(user_id);
        }
        user.teams.insert(team_id);

        tx.update_by_id(&team).await?;
        tx.update_by_id(&user).await?;
        tx.commit().await?;

        Ok(team)
    }

    pub async fn grant_class_access(&self, team_id: Uuid, class_id: Uuid) -> AppResult<Team> {
        let mut team: Team = self
            .store
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))?;

        if self.store.find_by_id::<Class>(class_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Class {} not found", class_id)));
        }

        team.access_to.insert(class_id);
        self.store.update_by_id(&team).await?;
        Ok(team)
    }

    pub async fn create_class(&self, title: String, workspace_id: Uuid) -> AppResult<Class> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Class title is required".to_string()));
        }
        if self.store.find_by_id::<Workspace>(workspace_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Workspace {} not found", workspace_id)));
        }

        let class = Class::new(title, workspace_id);
        self.store.insert(&class).await?;
        Ok(class)
    }

    pub async fn create_project(
        &self,
        class_id: Uuid,
        name: String,
        description: Option<String>,
        video: Option<String>,
        thumbnail: Option<String>,
        principal: Principal,
    ) -> AppResult<Project> {
        let mut tx = self.store.begin().await?;

        let mut class: Class = match tx.find_by_id(class_id).await? {
            Some(class) => class,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Class {} not found", class_id)));
            }
        };

        let mut project = Project::new(class_id, name, principal.id);
        project.description = description;
        project.video = video;
        project.thumbnail = thumbnail;
        tx.insert(&project).await?;

        class.projects.push(project.id);
        tx.update_by_id(&class).await?;

        tx.commit().await?;
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_id: Uuid,
        name: Option<String>,
        description: Option<String>,
        video: Option<String>,
        thumbnail: Option<String>,
    ) -> AppResult<Project> {
        let mut project: Project = self
            .store
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        if let Some(name) = name {
            project.name = name;
        }
        if let Some(description) = description {
            project.description = Some(description);
        }
        if let Some(video) = video {
            project.video = Some(video);
        }
        if let Some(thumbnail) = thumbnail {
            project.thumbnail = Some(thumbnail);
        }

        self.store.update_by_id(&project).await?;
        Ok(project)
    }

    pub async fn create_comment(
        &self,
        project_id: Uuid,
        content: String,
        time_stamp: Option<String>,
        comment_type: CommentType,
        principal: Principal,
    ) -> AppResult<Comment> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }

        let mut tx = self.store.begin().await?;

        let mut project: Project = match tx.find_by_id(project_id).await? {
            Some(project) => project,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Project {} not found", project_id)));
            }
        };

        let mut comment = Comment::new(content, project_id, comment_type, principal.id);
        comment.time_stamp = time_stamp;
        tx.insert(&comment).await?;

        project.comments.push(comment.id);
        tx.update_by_id(&project).await?;

        tx.commit().await?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        content: Option<String>,
        is_checked: Option<bool>,
        time_stamp: Option<String>,
    ) -> AppResult<Comment> {
        let mut comment: Comment = self
            .store
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

        if let Some(content) = content {
            comment.content = content;
        }
        if let Some(is_checked) = is_checked {
            comment.is_checked = is_checked;
        }
        if let Some(time_stamp) = time_stamp {
            comment.time_stamp = Some(time_stamp);
        }

        self.store.update_by_id(&comment).await?;
        Ok(comment)
    }

    pub async fn create_reply(
        &self,
        comment_id: Uuid,
        content: String,
        principal: Principal,
    ) -> AppResult<Reply> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Reply content is required".to_string()));
        }

        let mut tx = self.store.begin().await?;

        let mut comment: Comment = match tx.find_by_id(comment_id).await? {
            Some(comment) => comment,
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
            }
        };

        let reply = Reply::new(content, comment_id, principal.id);
        tx.insert(&reply).await?;

        comment.replies.push(reply.id);
        tx.update_by_id(&comment).await?;

        tx.commit().await?;
        Ok(reply)
    }

    pub async fn update_reply(
        &self,
        reply_id: Uuid,
        content: Option<String>,
        is_checked: Option<bool>,
    ) -> AppResult<Reply> {
        let mut reply: Reply = self
            .store
            .find_by_id(reply_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply {} not found", reply_id)))?;

        if let Some(content) = content {
            reply.content = content;
        }
        if let Some(is_checked) = is_checked {
            reply.is_checked = is_checked;
        }

        self.store.update_by_id(&reply).await?;
        Ok(reply)
    }
}
