pub mod identifier;
pub use identifier::*;

pub mod dataset_ref;
pub use dataset_ref::*;

pub mod alias_table;
pub use alias_table::*;

pub mod operator;
pub use operator::*;

pub mod attribute;
pub use attribute::*;

pub mod predicate;
pub use predicate::*;
