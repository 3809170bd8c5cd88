mod common;

use classreel::error::AppError;
use classreel::models::Role;
use classreel::services::SrtExporter;
use uuid::Uuid;

use common::{comment_for, graph, store, user};

#[tokio::test]
async fn exports_the_documented_two_comment_track() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let g = graph(&store, &author).await;

    // The fixture comment has no time stamp, so only these two render.
    let mut a = comment_for(&store, g.project.id, &author, Some("0:10")).await;
    a.content = "A".to_string();
    store.update_by_id(&a).await.unwrap();
    let mut b = comment_for(&store, g.project.id, &author, Some("0:12")).await;
    b.content = "B".to_string();
    store.update_by_id(&b).await.unwrap();

    let track = SrtExporter::new(store.clone())
        .export(g.project.id, 5.0)
        .await
        .unwrap();

    assert_eq!(
        track,
        "1\n00:00:10,000 --> 00:00:12,000\nA\n\n2\n00:00:12,000 --> 00:00:17,000\nB"
    );
}

#[tokio::test]
async fn a_project_without_timestamped_comments_exports_an_empty_string() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let g = graph(&store, &author).await;

    let track = SrtExporter::new(store.clone())
        .export(g.project.id, 5.0)
        .await
        .unwrap();
    assert_eq!(track, "");
}

#[tokio::test]
async fn non_positive_durations_are_rejected_before_rendering() {
    let store = store().await;
    let author = user(&store, "author", Role::Student).await;
    let g = graph(&store, &author).await;
    comment_for(&store, g.project.id, &author, Some("0:10")).await;
    let exporter = SrtExporter::new(store.clone());

    for bad in [-5.0, 0.0, f64::NAN, f64::INFINITY] {
        let err = exporter.export(g.project.id, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "duration {} was accepted", bad);
    }

    // A sane duration still renders, start strictly before end.
    let track = exporter.export(g.project.id, 5.0).await.unwrap();
    assert!(track.contains("00:00:10,000 --> 00:00:15,000"));
}

#[tokio::test]
async fn exporting_a_missing_project_is_not_found() {
    let store = store().await;

    let err = SrtExporter::new(store.clone())
        .export(Uuid::new_v4(), 5.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
