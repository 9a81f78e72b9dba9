// repomark services
// Services provide the self-contained pieces: GitHub access, search,
// import, activity and settings.

pub mod activity;
pub mod csv_importer;
pub mod github_client;
pub mod search;
pub mod settings_engine;
