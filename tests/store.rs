mod common;

use classreel::models::{Role, User};
use classreel::store::EntityStore;
use uuid::Uuid;

use common::{store, user};

#[tokio::test]
async fn documents_round_trip_through_their_collection() {
    let store = store().await;
    let created = user(&store, "alice", Role::Teacher).await;

    let loaded: User = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.email, created.email);
    assert_eq!(loaded.role, Role::Teacher);

    assert!(store.find_by_id::<User>(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_the_whole_document() {
    let store = store().await;
    let mut created = user(&store, "bob", Role::Student).await;

    created.name = "Robert".to_string();
    created.profile_image = Some("avatar.png".to_string());
    assert!(store.update_by_id(&created).await.unwrap());

    let loaded: User = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Robert");
    assert_eq!(loaded.profile_image.as_deref(), Some("avatar.png"));
}

#[tokio::test]
async fn find_many_filters_with_a_predicate() {
    let store = store().await;
    user(&store, "t1", Role::Teacher).await;
    user(&store, "t2", Role::Teacher).await;
    user(&store, "s1", Role::Student).await;

    let teachers: Vec<User> = store.find_many(|u: &User| u.role == Role::Teacher).await.unwrap();
    assert_eq!(teachers.len(), 2);
}

#[tokio::test]
async fn delete_many_reports_the_removed_count() {
    let store = store().await;
    user(&store, "s1", Role::Student).await;
    user(&store, "s2", Role::Student).await;
    let kept = user(&store, "t1", Role::Teacher).await;

    let removed = store.delete_many(|u: &User| u.role == Role::Student).await.unwrap();
    assert_eq!(removed, 2);
    assert!(store.find_by_id::<User>(kept.id).await.unwrap().is_some());
}

#[tokio::test]
async fn secondary_field_lookup_finds_one_document() {
    let store = store().await;
    let created = user(&store, "carol", Role::Student).await;

    let by_email: Option<User> = store.find_one_by_field("$.email", &created.email).await.unwrap();
    assert_eq!(by_email.unwrap().id, created.id);

    let missing: Option<User> = store.find_one_by_field("$.email", "nobody@example.com").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn a_rolled_back_transaction_leaves_no_trace() {
    let store = store().await;
    let ghost = User::new("ghost".into(), "ghost@example.com".into(), "hash".into(), Role::Student);

    let mut tx = store.begin().await.unwrap();
    tx.insert(&ghost).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(store.find_by_id::<User>(ghost.id).await.unwrap().is_none());
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("classreel.db").display());

    let created = {
        let store = EntityStore::new(&url).await.unwrap();
        store.init().await.unwrap();
        let u = User::new("dora".into(), "dora@example.com".into(), "hash".into(), Role::Teacher);
        store.insert(&u).await.unwrap();
        u
    };

    let reopened = EntityStore::new(&url).await.unwrap();
    reopened.init().await.unwrap();
    let loaded: User = reopened.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "dora");
}
