use std::fmt;

use crate::literal::Literal;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
    Contains,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::NotEq => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::GtEq => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::LtEq => write!(f, "<="),
            Operator::Like => write!(f, "LIKE"),
            Operator::In => write!(f, "IN"),
            Operator::Between => write!(f, "BETWEEN"),
            Operator::IsNull => write!(f, "IS NULL"),
            Operator::IsNotNull => write!(f, "IS NOT NULL"),
            Operator::Contains => write!(f, "CONTAINS"),
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operator({})", self)
    }
}

/// Right-hand side of a simple predicate. Which shape is legal depends on the
/// operator; see [`Operator::accepts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Single(Literal),
    List(Vec<Literal>),
    Range(Literal, Literal),
}

impl Operator {
    pub fn accepts(&self, operand: &Operand) -> bool {
        match self {
            Operator::Eq
            | Operator::NotEq
            | Operator::Gt
            | Operator::GtEq
            | Operator::Lt
            | Operator::LtEq
            | Operator::Like
            | Operator::Contains => matches!(operand, Operand::Single(_)),
            Operator::In => matches!(operand, Operand::List(items) if !items.is_empty()),
            Operator::Between => matches!(operand, Operand::Range(_, _)),
            Operator::IsNull | Operator::IsNotNull => matches!(operand, Operand::None),
        }
    }
}

/// Boolean connective joining two predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => write!(f, "AND"),
            Connective::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{expr::{Operand, Operator}, literal::Literal};

    #[test]
    pub fn test_operand_shapes() {
        assert!(Operator::Gt.accepts(&Operand::Single(Literal::Int(1))));
        assert!(!Operator::Gt.accepts(&Operand::None));
        assert!(Operator::In.accepts(&Operand::List(vec![Literal::Int(1)])));
        assert!(!Operator::In.accepts(&Operand::List(vec![])));
        assert!(!Operator::In.accepts(&Operand::Single(Literal::Int(1))));
        assert!(Operator::Between.accepts(&Operand::Range(Literal::Int(1), Literal::Int(2))));
        assert!(Operator::IsNull.accepts(&Operand::None));
        assert!(!Operator::IsNotNull.accepts(&Operand::Single(Literal::Null)));
    }

    #[test]
    pub fn test_display() {
        assert_eq!(Operator::NotEq.to_string(), "!=");
        assert_eq!(Operator::IsNotNull.to_string(), "IS NOT NULL");
        assert_eq!(format!("{:?}", Operator::LtEq), "Operator(<=)");
    }
}
