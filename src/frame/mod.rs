pub mod join_options;
pub use join_options::*;

pub mod group_by;
pub use group_by::*;

pub mod query_frame;
pub use query_frame::*;
