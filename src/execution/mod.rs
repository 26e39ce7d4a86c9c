pub mod execution_mode;
pub use execution_mode::*;

pub mod execute_options;
pub use execute_options::*;

pub mod wire;
pub use wire::*;

pub mod param_binder;
pub use param_binder::*;

pub mod row;
pub use row::*;

pub mod result_normalizer;
pub use result_normalizer::*;

pub mod protocol;
pub use protocol::*;

pub mod cursor;
pub use cursor::*;
