//! Render output: display list and page diff protocol

mod diff;
mod display;

pub use diff::{moved_boxes, PageDiff, PagePatch};
pub use display::{DisplayItem, DisplayList, DisplayPage, MarkerEdge};
