mod common;

use classreel::error::AppError;
use classreel::models::{Comment, Reply, Role, User};
use classreel::services::LikeEngine;
use uuid::Uuid;

use common::{graph, principal, store, user};

#[tokio::test]
async fn comment_like_is_symmetric_on_both_records() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let liker = user(&store, "liker", Role::Student).await;
    let g = graph(&store, &author).await;
    let engine = LikeEngine::new(store.clone());

    let outcome = engine
        .toggle_comment_like(g.comment.id, principal(&liker))
        .await
        .unwrap();
    assert!(outcome.liked);
    assert_eq!(outcome.total_likes, 1);

    let comment: Comment = store.find_by_id(g.comment.id).await.unwrap().unwrap();
    let liker_row: User = store.find_by_id(liker.id).await.unwrap().unwrap();
    assert_eq!(
        comment.likes.contains(&liker.id),
        liker_row.liked_comments.contains(&g.comment.id)
    );
    assert!(comment.likes.contains(&liker.id));
}

#[tokio::test]
async fn a_toggle_pair_returns_to_the_original_state() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let liker = user(&store, "liker", Role::Student).await;
    let g = graph(&store, &author).await;
    let engine = LikeEngine::new(store.clone());

    engine.toggle_comment_like(g.comment.id, principal(&liker)).await.unwrap();
    let outcome = engine
        .toggle_comment_like(g.comment.id, principal(&liker))
        .await
        .unwrap();

    assert!(!outcome.liked);
    assert_eq!(outcome.total_likes, 0);

    let comment: Comment = store.find_by_id(g.comment.id).await.unwrap().unwrap();
    let liker_row: User = store.find_by_id(liker.id).await.unwrap().unwrap();
    assert!(!comment.likes.contains(&liker.id));
    assert!(!liker_row.liked_comments.contains(&g.comment.id));
}

#[tokio::test]
async fn reply_likes_use_the_reciprocal_reply_sets() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let liker = user(&store, "liker", Role::Student).await;
    let g = graph(&store, &author).await;
    let engine = LikeEngine::new(store.clone());

    let outcome = engine
        .toggle_reply_like(g.reply.id, principal(&liker))
        .await
        .unwrap();
    assert!(outcome.liked);

    let reply: Reply = store.find_by_id(g.reply.id).await.unwrap().unwrap();
    let liker_row: User = store.find_by_id(liker.id).await.unwrap().unwrap();
    assert!(reply.reply_likes.contains(&liker.id));
    assert!(liker_row.liked_replies.contains(&g.reply.id));
    assert!(liker_row.liked_comments.is_empty());
}

#[tokio::test]
async fn liking_a_missing_target_is_not_found() {
    let store = store().await;
    let liker = user(&store, "liker", Role::Student).await;
    let engine = LikeEngine::new(store.clone());

    let err = engine
        .toggle_comment_like(Uuid::new_v4(), principal(&liker))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn two_likers_accumulate_on_the_same_comment() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let first = user(&store, "first", Role::Student).await;
    let second = user(&store, "second", Role::Teacher).await;
    let g = graph(&store, &author).await;
    let engine = LikeEngine::new(store.clone());

    engine.toggle_comment_like(g.comment.id, principal(&first)).await.unwrap();
    let outcome = engine
        .toggle_comment_like(g.comment.id, principal(&second))
        .await
        .unwrap();
    assert_eq!(outcome.total_likes, 2);
}
