#![allow(dead_code)]

use classreel::models::{Class, Comment, CommentType, Principal, Project, Reply, Role, User, Workspace};
use classreel::store::EntityStore;
use uuid::Uuid;

pub async fn store() -> EntityStore {
    let store = EntityStore::new("sqlite::memory:").await.unwrap();
    store.init().await.unwrap();
    store
}

pub async fn user(store: &EntityStore, name: &str, role: Role) -> User {
    let user = User::new(
        name.to_string(),
        format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        "hash".to_string(),
        role,
    );
    store.insert(&user).await.unwrap();
    user
}

pub fn principal(user: &User) -> Principal {
    Principal { id: user.id, role: user.role }
}

pub struct Graph {
    pub workspace: Workspace,
    pub class: Class,
    pub project: Project,
    pub comment: Comment,
    pub reply: Reply,
}

/// One workspace with a class, a project, a comment by `author`, and one
/// reply by `author`, all parent lists wired up.
pub async fn graph(store: &EntityStore, author: &User) -> Graph {
    let workspace = Workspace::new("ws".to_string(), author.id);
    store.insert(&workspace).await.unwrap();

    let mut class = Class::new("class".to_string(), workspace.id);
    let mut project = Project::new(class.id, "project".to_string(), author.id);
    class.projects.push(project.id);

    let mut comment = Comment::new("note".to_string(), project.id, CommentType::Public, author.id);
    project.comments.push(comment.id);

    let reply = Reply::new("re".to_string(), comment.id, author.id);
    comment.replies.push(reply.id);

    store.insert(&class).await.unwrap();
    store.insert(&project).await.unwrap();
    store.insert(&comment).await.unwrap();
    store.insert(&reply).await.unwrap();

    Graph { workspace, class, project, comment, reply }
}

pub async fn comment_for(store: &EntityStore, project_id: Uuid, author: &User, stamp: Option<&str>) -> Comment {
    let mut comment = Comment::new("c".to_string(), project_id, CommentType::Public, author.id);
    comment.time_stamp = stamp.map(String::from);
    store.insert(&comment).await.unwrap();
    comment
}
