pub mod bitmap;
pub mod compositor;
pub mod editor;
pub mod export;
pub mod geometry;
pub mod interaction;

pub use bitmap::{ensure_image_mime, Bitmap, LoadError};
pub use editor::{Editor, EditorEvent, PointerInput};
pub use geometry::{OverlayLimits, OverlayState, Point};
