//! Pagination decision engine

pub mod aggregate;
mod engine;
pub mod flatten;
mod options;
mod pagination;
pub mod split;

pub use aggregate::{aggregate, FlowBox};
pub use engine::{paginate, paginate_observed};
pub use flatten::{flatten_list, flatten_table_rows, FlatCache, FlatItem, FlatSequence};
pub use options::{LayoutConstraints, PaginationOptions, LAYOUT_TOLERANCE, LINE_HEIGHT};
pub use pagination::{
    Fragment, OversizeWarning, Page, PaginationEvent, PaginationObserver, PaginationResult,
    SplitRange,
};
pub use split::{find_split, SplitContext, SplitPoint};
