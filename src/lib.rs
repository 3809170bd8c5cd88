// Classroom video review backend: timestamped comments on project videos,
// replies, likes, workspace/team/class hierarchies, invitation tokens and
// SRT export, over a generic document store with explicit cascades.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod store;
