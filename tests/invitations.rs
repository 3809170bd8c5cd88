mod common;

use chrono::{Duration, Utc};
use classreel::error::AppError;
use classreel::models::{Invitation, Role, User, Workspace};
use classreel::services::InvitationService;
use uuid::Uuid;

use common::{principal, store, user};

fn service(store: &classreel::store::EntityStore) -> InvitationService {
    InvitationService::new(store.clone(), "http://localhost:3000".to_string())
}

async fn workspace(store: &classreel::store::EntityStore, creator: &User) -> Workspace {
    let ws = Workspace::new("ws".to_string(), creator.id);
    store.insert(&ws).await.unwrap();
    ws
}

fn token_from_link(link: &str) -> String {
    link.split("token=").nth(1).unwrap().to_string()
}

#[tokio::test]
async fn only_teachers_can_create_invitations() {
    let store = store().await;
    let student = user(&store, "student", Role::Student).await;
    let ws = workspace(&store, &student).await;

    let err = service(&store)
        .create(ws.id, Role::Student, principal(&student))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn a_token_validates_until_consumed() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let joiner = user(&store, "joiner", Role::Student).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let created = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
    let token = token_from_link(&created.signup_link);

    let (validated_ws, expires_at) = svc.validate(&token).await.unwrap();
    assert_eq!(validated_ws.id, ws.id);
    assert_eq!(expires_at, created.expires_at);

    svc.use_invitation(&token, principal(&joiner)).await.unwrap();

    let joined: User = store.find_by_id(joiner.id).await.unwrap().unwrap();
    assert!(joined.workspaces.contains(&ws.id));
}

#[tokio::test]
async fn a_token_is_consumed_exactly_once() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let joiner = user(&store, "joiner", Role::Student).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let created = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
    let token = token_from_link(&created.signup_link);

    svc.use_invitation(&token, principal(&joiner)).await.unwrap();

    // Second use is an opaque rejection, and the markers never flip back.
    let err = svc.use_invitation(&token, principal(&joiner)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let invitation: Invitation = store
        .find_one_by_field("$.token", &token)
        .await
        .unwrap()
        .unwrap();
    assert!(invitation.is_used);
    assert_eq!(invitation.used_by, Some(joiner.id));
    assert!(invitation.used_at.is_some());
}

#[tokio::test]
async fn expired_invitations_are_rejected_even_if_unused() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let joiner = user(&store, "joiner", Role::Student).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let invitation = Invitation {
        id: Uuid::new_v4(),
        workspace_id: ws.id,
        created_by: teacher.id,
        token: "expired-token".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
        is_used: false,
        used_by: None,
        used_at: None,
        allowed_role: Role::Student,
    };
    store.insert(&invitation).await.unwrap();

    assert!(matches!(svc.validate("expired-token").await.unwrap_err(), AppError::Validation(_)));
    assert!(matches!(
        svc.use_invitation("expired-token", principal(&joiner)).await.unwrap_err(),
        AppError::Validation(_)
    ));
}

#[tokio::test]
async fn unknown_tokens_are_indistinguishable_from_expired_ones() {
    let store = store().await;
    let svc = service(&store);

    let err = svc.validate("no-such-token").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("Invalid or expired")));
}

#[tokio::test]
async fn role_mismatch_names_both_roles_and_mutates_nothing() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let another_teacher = user(&store, "other", Role::Teacher).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let created = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
    let token = token_from_link(&created.signup_link);

    let err = svc
        .use_invitation(&token, principal(&another_teacher))
        .await
        .unwrap_err();
    match err {
        AppError::Conflict(msg) => {
            assert!(msg.contains("student"));
            assert!(msg.contains("teacher"));
        }
        other => panic!("expected Conflict, got {:?}", other),
    }

    // No membership was added and the invitation stays open.
    let unchanged: User = store.find_by_id(another_teacher.id).await.unwrap().unwrap();
    assert!(!unchanged.workspaces.contains(&ws.id));
    let invitation: Invitation = store
        .find_one_by_field("$.token", &token)
        .await
        .unwrap()
        .unwrap();
    assert!(!invitation.is_used);
}

#[tokio::test]
async fn concurrent_consumers_cannot_double_spend_a_token() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    for round in 0..10 {
        let first = user(&store, &format!("first{}", round), Role::Student).await;
        let second = user(&store, &format!("second{}", round), Role::Student).await;

        let created = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
        let token = token_from_link(&created.signup_link);

        let (a, b) = tokio::join!(
            svc.use_invitation(&token, principal(&first)),
            svc.use_invitation(&token, principal(&second)),
        );

        // Exactly one consumer wins; the other gets the opaque rejection.
        assert_eq!(
            a.is_ok() as usize + b.is_ok() as usize,
            1,
            "round {}: token consumed {} times",
            round,
            a.is_ok() as usize + b.is_ok() as usize
        );

        let winner = if a.is_ok() { &first } else { &second };
        let loser = if a.is_ok() { &second } else { &first };

        let invitation: Invitation = store
            .find_one_by_field("$.token", &token)
            .await
            .unwrap()
            .unwrap();
        assert!(invitation.is_used);
        assert_eq!(invitation.used_by, Some(winner.id));

        let winner_row: User = store.find_by_id(winner.id).await.unwrap().unwrap();
        assert!(winner_row.workspaces.contains(&ws.id));
        let loser_row: User = store.find_by_id(loser.id).await.unwrap().unwrap();
        assert!(!loser_row.workspaces.contains(&ws.id));
    }
}

#[tokio::test]
async fn deactivation_expires_the_token() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let created = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
    let token = token_from_link(&created.signup_link);
    let invitation: Invitation = store
        .find_one_by_field("$.token", &token)
        .await
        .unwrap()
        .unwrap();

    svc.deactivate(invitation.id, principal(&teacher)).await.unwrap();

    assert!(matches!(svc.validate(&token).await.unwrap_err(), AppError::Validation(_)));
}

#[tokio::test]
async fn generated_tokens_are_unique() {
    let store = store().await;
    let teacher = user(&store, "teacher", Role::Teacher).await;
    let ws = workspace(&store, &teacher).await;
    let svc = service(&store);

    let a = svc.create(ws.id, Role::Student, principal(&teacher)).await.unwrap();
    let b = svc.create(ws.id, Role::Teacher, principal(&teacher)).await.unwrap();
    assert_ne!(token_from_link(&a.signup_link), token_from_link(&b.signup_link));
}
