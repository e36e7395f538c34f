pub mod interview;
pub mod job_posting;
pub mod question;
pub mod user;
