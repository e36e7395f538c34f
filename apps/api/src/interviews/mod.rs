pub mod db;
pub mod feedback;
pub mod handlers;
pub mod prompts;
