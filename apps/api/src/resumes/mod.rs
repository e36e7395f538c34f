pub mod analysis;
pub mod handlers;
pub mod prompts;
