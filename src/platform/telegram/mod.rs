pub mod api;
pub mod engine;
pub mod types;
pub mod webhook;

pub use api::{mixed_case, ApiMethod, TelegramApi};
pub use engine::{Responder, Task, TelegramEngine};
