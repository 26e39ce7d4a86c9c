pub mod aggregate_func;
pub use aggregate_func::*;

pub mod select_item;
pub use select_item::*;

pub mod join_spec;
pub use join_spec::*;

pub mod unnest_spec;
pub use unnest_spec::*;

pub mod order_key;
pub use order_key::*;

pub mod key_resolver;
pub use key_resolver::*;

pub mod query_builder;
pub use query_builder::*;
