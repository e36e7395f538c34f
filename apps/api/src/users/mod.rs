pub mod db;
pub mod handlers;
pub mod sync;
pub mod webhook;
