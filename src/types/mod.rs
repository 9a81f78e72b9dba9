// repomark shared type definitions
// Each submodule defines types used across the application.

pub mod activity;
pub mod bookmark;
pub mod errors;
pub mod github;
pub mod import;
pub mod settings;
