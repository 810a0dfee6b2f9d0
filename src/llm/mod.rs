pub mod media;
pub mod openai;

pub use openai::{chat_json, generate_outfit_image};
