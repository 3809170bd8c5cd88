// Canonical entity schema for the classroom review domain.
// References between entities are always ids; population happens at read
// time (services::viewer), never in the persisted documents.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::store::Doc;

/// Well-known id of the placeholder user that absorbs authorship of
/// comments and replies when their author is deleted.
pub static DELETED_USER_ID: Lazy<Uuid> =
    Lazy::new(|| Uuid::parse_str("00000000-0000-0000-0000-00000000dead").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Question,
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub access_token: Option<String>,
    pub liked_comments: HashSet<Uuid>,
    pub liked_replies: HashSet<Uuid>,
    pub workspaces: HashSet<Uuid>,
    pub teams: HashSet<Uuid>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            profile_image: None,
            access_token: None,
            liked_comments: HashSet::new(),
            liked_replies: HashSet::new(),
            workspaces: HashSet::new(),
            teams: HashSet::new(),
        }
    }

    /// The placeholder row substituted for deleted authors. Kept as a real
    /// user so population works uniformly.
    pub fn deleted_sentinel() -> Self {
        Self {
            id: *DELETED_USER_ID,
            name: "Deleted User".to_string(),
            email: "deleted@classreel.invalid".to_string(),
            password_hash: String::new(),
            role: Role::Student,
            profile_image: None,
            access_token: None,
            liked_comments: HashSet::new(),
            liked_replies: HashSet::new(),
            workspaces: HashSet::new(),
            teams: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub teams: Vec<Uuid>,
}

impl Workspace {
    pub fn new(name: String, created_by: Uuid) -> Self {
        Self { id: Uuid::new_v4(), name, created_by, teams: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub team_name: String,
    pub created_by: Uuid,
    pub workspace_id: Uuid,
    pub assigned_teachers: HashSet<Uuid>,
    pub assigned_students: HashSet<Uuid>,
    pub access_to: HashSet<Uuid>,
}

impl Team {
    pub fn new(team_name: String, created_by: Uuid, workspace_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_name,
            created_by,
            workspace_id,
            assigned_teachers: HashSet::new(),
            assigned_students: HashSet::new(),
            access_to: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub title: String,
    pub workspace_id: Uuid,
    pub projects: Vec<Uuid>,
}

impl Class {
    pub fn new(title: String, workspace_id: Uuid) -> Self {
        Self { id: Uuid::new_v4(), title, workspace_id, projects: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub class_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    pub project_created_by: Uuid,
    pub comments: Vec<Uuid>,
}

impl Project {
    pub fn new(class_id: Uuid, name: String, project_created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id,
            name,
            description: None,
            video: None,
            thumbnail: None,
            project_created_by,
            comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Video position as `MM:SS` or `MM:SS,mmm`; absent for general notes.
    pub time_stamp: Option<String>,
    pub is_checked: bool,
    pub comment_type: CommentType,
    pub comment_created_by: Uuid,
    pub replies: Vec<Uuid>,
    pub likes: HashSet<Uuid>,
}

impl Comment {
    pub fn new(
        content: String,
        project_id: Uuid,
        comment_type: CommentType,
        comment_created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            project_id,
            created_at: Utc::now(),
            time_stamp: None,
            is_checked: false,
            comment_type,
            comment_created_by,
            replies: Vec::new(),
            likes: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub content: String,
    pub comment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_checked: bool,
    pub reply_created_by: Uuid,
    pub reply_likes: HashSet<Uuid>,
}

impl Reply {
    pub fn new(content: String, comment_id: Uuid, reply_created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            comment_id,
            created_at: Utc::now(),
            is_checked: false,
            reply_created_by,
            reply_likes: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub created_by: Uuid,
    /// Unique and immutable once created.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub allowed_role: Role,
}

impl Doc for User {
    const COLLECTION: &'static str = "users";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Workspace {
    const COLLECTION: &'static str = "workspaces";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Team {
    const COLLECTION: &'static str = "teams";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Class {
    const COLLECTION: &'static str = "classes";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Project {
    const COLLECTION: &'static str = "projects";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Comment {
    const COLLECTION: &'static str = "comments";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Reply {
    const COLLECTION: &'static str = "replies";
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Doc for Invitation {
    const COLLECTION: &'static str = "invitations";
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Authenticated actor, resolved by the auth collaborator.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}
