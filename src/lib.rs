//! Typed query composition and execution for an HTTP SQL++ query service.
//!
//! A [`QueryFrame`] collects clauses over a dataset, renders them into one
//! statement through the [`QueryBuilder`], and runs it on a [`Cursor`] in
//! immediate, deferred or async mode. A [`DocumentClient`] offers record-level
//! find, count, insert, update and delete with JSON-document conditions.

pub mod error;
pub use error::{AsterixError, ErrorKind, Result, ServiceDiagnostic};

pub mod literal;
pub use literal::{Literal, LiteralSerializer};

pub mod expr;
pub use expr::{AliasTable, Attribute, Connective, DatasetRef, Identifier, Operand, Operator, Predicate};

pub mod query;
pub use query::{AggregateFunc, JoinSpec, QueryBuilder, SelectItem, UnnestSpec};

pub mod transport;
pub use transport::{HttpBackend, ReqwestBackend, RetryPolicy, Transport};

pub mod execution;
pub use execution::{Cursor, ExecuteOptions, ExecutionMode, PollPolicy, Row};

pub mod connection;
pub use connection::{Connection, ConnectionConfig, CursorProvider};

pub mod frame;
pub use frame::{GroupBy, JoinOptions, QueryFrame};

pub mod client;
pub use client::{Condition, DocumentClient, FindOptions};
