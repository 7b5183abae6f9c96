pub mod error;
pub mod file_repo;
pub mod user_repo;
