// Subtitle export. Turns a project's timestamped comments into an SRT
// track: parse `MM:SS` / `MM:SS,mmm` stamps, stable-sort, synthesize
// non-overlapping intervals, render `HH:MM:SS,mmm` lines.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Project};
use crate::store::EntityStore;

pub const DEFAULT_SUBTITLE_SECONDS: f64 = 5.0;

#[derive(Clone)]
pub struct SrtExporter {
    store: EntityStore,
}

impl SrtExporter {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Renders the track for one project. An empty string means nothing
    /// to export, not an error.
    pub async fn export(&self, project_id: Uuid, default_duration: f64) -> AppResult<String> {
        if !default_duration.is_finite() || default_duration <= 0.0 {
            return Err(AppError::Validation(
                "Subtitle duration must be a positive number of seconds".to_string(),
            ));
        }

        let _project: Project = self
            .store
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        let comments: Vec<Comment> = self
            .store
            .find_many(|c: &Comment| c.project_id == project_id)
            .await?;

        Ok(build_track(&comments, default_duration))
    }
}

/// Pure transform: order-independent over the input set up to sorting,
/// same comments always yield the same track.
pub fn build_track(comments: &[Comment], default_duration: f64) -> String {
    let mut timed: Vec<(f64, &str)> = comments
        .iter()
        .filter_map(|c| {
            let stamp = c.time_stamp.as_deref()?;
            Some((parse_time_stamp(stamp)?, c.content.as_str()))
        })
        .collect();

    // Stable: comments at the same position keep their relative order.
    timed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    if timed.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (i, (start, content)) in timed.iter().enumerate() {
        let end = match timed.get(i + 1) {
            // Never overlap the next subtitle, never exceed the default.
            Some((next, _)) => start + (next - start).min(default_duration),
            None => start + default_duration,
        };

        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(*start),
            format_srt_time(end),
            content
        ));
    }

    out.trim_end().to_string()
}

/// `MM:SS` or `MM:SS,mmm` to total seconds. Malformed stamps are treated
/// like missing ones and dropped from the track.
pub fn parse_time_stamp(stamp: &str) -> Option<f64> {
    let (clock, millis) = match stamp.split_once(',') {
        Some((clock, ms)) => (clock, ms.trim().parse::<u32>().ok()?),
        None => (stamp, 0),
    };

    let (minutes, seconds) = clock.split_once(':')?;
    let minutes = minutes.trim().parse::<u32>().ok()?;
    let seconds = seconds.trim().parse::<u32>().ok()?;

    Some(f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0)
}

/// `HH:MM:SS,mmm`, zero-padded, hours unbounded.
pub fn format_srt_time(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as i64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentType;

    fn comment(stamp: Option<&str>, content: &str) -> Comment {
        let mut c = Comment::new(
            content.to_string(),
            Uuid::new_v4(),
            CommentType::Public,
            Uuid::new_v4(),
        );
        c.time_stamp = stamp.map(String::from);
        c
    }

    #[test]
    fn parses_plain_and_millisecond_stamps() {
        assert_eq!(parse_time_stamp("0:10"), Some(10.0));
        assert_eq!(parse_time_stamp("02:05"), Some(125.0));
        assert_eq!(parse_time_stamp("01:30,250"), Some(90.25));
    }

    #[test]
    fn rejects_malformed_stamps() {
        assert_eq!(parse_time_stamp(""), None);
        assert_eq!(parse_time_stamp("90"), None);
        assert_eq!(parse_time_stamp("a:b"), None);
        assert_eq!(parse_time_stamp("1:2,xyz"), None);
    }

    #[test]
    fn formats_with_unbounded_hours() {
        assert_eq!(format_srt_time(10.0), "00:00:10,000");
        assert_eq!(format_srt_time(90.25), "00:01:30,250");
        assert_eq!(format_srt_time(3600.0 * 27.0 + 61.5), "27:01:01,500");
    }

    #[test]
    fn caps_duration_at_next_subtitle_start() {
        let comments = vec![comment(Some("0:10"), "A"), comment(Some("0:12"), "B")];
        let track = build_track(&comments, 5.0);

        let expected = "1\n00:00:10,000 --> 00:00:12,000\nA\n\n2\n00:00:12,000 --> 00:00:17,000\nB";
        assert_eq!(track, expected);
    }

    #[test]
    fn sorts_by_parsed_time_regardless_of_input_order() {
        let comments = vec![
            comment(Some("1:00"), "later"),
            comment(Some("0:05"), "earlier"),
        ];
        let track = build_track(&comments, 5.0);
        let first = track.lines().nth(2).unwrap();
        assert_eq!(first, "earlier");
    }

    #[test]
    fn untimed_comments_are_dropped() {
        let comments = vec![comment(None, "no stamp"), comment(Some("0:01"), "timed")];
        let track = build_track(&comments, 5.0);
        assert!(track.contains("timed"));
        assert!(!track.contains("no stamp"));
    }

    #[test]
    fn empty_input_renders_empty_string() {
        assert_eq!(build_track(&[], 5.0), "");
        assert_eq!(build_track(&[comment(None, "x")], 5.0), "");
    }
}
