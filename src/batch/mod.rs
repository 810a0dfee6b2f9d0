pub mod compose;
pub mod lookbook;
