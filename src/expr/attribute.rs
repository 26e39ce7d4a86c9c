use std::fmt;

use crate::{expr::{DatasetRef, Operand, Operator, Predicate}, literal::Literal};

/// A field of a dataset. Carries no alias: the alias is looked up from the
/// owning dataset when a predicate is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub dataset: DatasetRef,
    pub path: String,
}

impl Attribute {
    pub fn new(dataset: DatasetRef, path: impl Into<String>) -> Self {
        Self { dataset, path: path.into() }
    }

    fn simple(&self, op: Operator, operand: Operand) -> Predicate {
        Predicate::Simple { attribute: self.clone(), op, operand }
    }

    pub fn eq(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::Eq, Operand::Single(value.into()))
    }

    pub fn ne(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::NotEq, Operand::Single(value.into()))
    }

    pub fn gt(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::Gt, Operand::Single(value.into()))
    }

    pub fn ge(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::GtEq, Operand::Single(value.into()))
    }

    pub fn lt(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::Lt, Operand::Single(value.into()))
    }

    pub fn le(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::LtEq, Operand::Single(value.into()))
    }

    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        self.simple(Operator::Like, Operand::Single(Literal::String(pattern.into())))
    }

    pub fn is_in<T: Into<Literal>>(&self, values: impl IntoIterator<Item = T>) -> Predicate {
        self.simple(Operator::In, Operand::List(values.into_iter().map(Into::into).collect()))
    }

    pub fn between(&self, low: impl Into<Literal>, high: impl Into<Literal>) -> Predicate {
        self.simple(Operator::Between, Operand::Range(low.into(), high.into()))
    }

    pub fn is_null(&self) -> Predicate {
        self.simple(Operator::IsNull, Operand::None)
    }

    pub fn is_not_null(&self) -> Predicate {
        self.simple(Operator::IsNotNull, Operand::None)
    }

    /// `value` is an element of this collection field.
    pub fn contains(&self, value: impl Into<Literal>) -> Predicate {
        self.simple(Operator::Contains, Operand::Single(value.into()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.path)
    }
}
