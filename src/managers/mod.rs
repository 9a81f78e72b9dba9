// repomark state managers
// Managers own session state: who is signed in and which repositories they bookmarked.

pub mod bookmark_store;
pub mod identity;
