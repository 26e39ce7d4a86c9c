use std::ops::{BitAnd, BitOr, Not};

use crate::{
    expr::{AliasTable, Attribute, Connective, Identifier, Operand, Operator},
    literal::LiteralSerializer,
    AsterixError
};

/// Filter condition tree.
///
/// Only `Simple` nodes name an attribute; `Compound` and `Negated` nodes hold
/// their attributes through their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Simple { attribute: Attribute, op: Operator, operand: Operand },
    Compound { kind: Connective, left: Box<Predicate>, right: Box<Predicate> },
    Negated(Box<Predicate>),
}

impl Predicate {
    /// Build a simple predicate from parts, checking that the operand shape
    /// fits the operator.
    pub fn simple(attribute: Attribute, op: Operator, operand: Operand) -> Result<Self, AsterixError> {
        if !op.accepts(&operand) {
            return Err(Self::shape_error(op, &operand));
        }
        Ok(Predicate::Simple { attribute, op, operand })
    }

    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::Compound { kind: Connective::And, left: Box::new(self), right: Box::new(other) }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Compound { kind: Connective::Or, left: Box::new(self), right: Box::new(other) }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Negated(Box::new(self))
    }

    /// Split nested ANDs into their independent conjuncts, left to right.
    /// OR and NOT nodes are kept whole.
    pub fn into_conjuncts(self) -> Vec<Predicate> {
        let mut out = vec![];
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts(self, out: &mut Vec<Predicate>) {
        match self {
            Predicate::Compound { kind: Connective::And, left, right } => {
                left.collect_conjuncts(out);
                right.collect_conjuncts(out);
            },
            other => out.push(other),
        }
    }

    /// Every attribute named in the tree, left to right.
    pub fn attributes(&self) -> Vec<&Attribute> {
        let mut out = vec![];
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a Attribute>) {
        match self {
            Predicate::Simple { attribute, .. } => out.push(attribute),
            Predicate::Compound { left, right, .. } => {
                left.collect_attributes(out);
                right.collect_attributes(out);
            },
            Predicate::Negated(inner) => inner.collect_attributes(out),
        }
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, Predicate::Simple { .. })
    }

    /// Render as SQL++ condition text, qualifying each field with the alias its
    /// dataset is bound to in `aliases`.
    pub fn render(&self, aliases: &AliasTable) -> Result<String, AsterixError> {
        match self {
            Predicate::Simple { attribute, op, operand } => Self::render_simple(attribute, *op, operand, aliases),
            Predicate::Compound { kind, left, right } => {
                let left = left.render(aliases)?;
                let right = right.render(aliases)?;
                Ok(format!("({}) {} ({})", left, kind, right))
            },
            Predicate::Negated(inner) => Ok(format!("NOT ({})", inner.render(aliases)?)),
        }
    }

    fn render_simple(attribute: &Attribute, op: Operator, operand: &Operand, aliases: &AliasTable) -> Result<String, AsterixError> {
        Identifier::validate_path(&attribute.path)?;
        let alias = aliases.alias_of(&attribute.dataset).ok_or_else(|| {
            AsterixError::validation(format!(
                "Dataset '{}' of field '{}' is not part of this query",
                attribute.dataset, attribute.path
            ))
        })?;
        let field = format!("{}.{}", alias, attribute.path);

        match (op, operand) {
            (Operator::Eq | Operator::NotEq | Operator::Gt | Operator::GtEq | Operator::Lt | Operator::LtEq | Operator::Like, Operand::Single(value)) => {
                Ok(format!("{} {} {}", field, op, LiteralSerializer::serialize(value)?))
            },
            (Operator::In, Operand::List(values)) if !values.is_empty() => {
                Ok(format!("{} IN ({})", field, LiteralSerializer::serialize_all(values)?))
            },
            (Operator::Between, Operand::Range(low, high)) => Ok(format!(
                "{} BETWEEN {} AND {}",
                field,
                LiteralSerializer::serialize(low)?,
                LiteralSerializer::serialize(high)?
            )),
            (Operator::IsNull | Operator::IsNotNull, Operand::None) => Ok(format!("{} {}", field, op)),
            (Operator::Contains, Operand::Single(value)) => {
                Ok(format!("CONTAINS({}, {})", field, LiteralSerializer::serialize(value)?))
            },
            (op, operand) => Err(Self::shape_error(op, operand)),
        }
    }

    fn shape_error(op: Operator, operand: &Operand) -> AsterixError {
        AsterixError::validation(format!("Operator {} does not accept operand {:?}", op, operand))
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: &Predicate) -> Predicate {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: &Predicate) -> Predicate {
        self.clone().or(rhs.clone())
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

impl Not for &Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.clone().negate()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        expr::{AliasTable, DatasetRef, Operand, Operator, Predicate},
        literal::Literal,
        ErrorKind
    };

    fn setup() -> (DatasetRef, AliasTable) {
        let ds = DatasetRef::parse("Ds").unwrap();
        let table = AliasTable::new(ds.clone(), "t");
        (ds, table)
    }

    #[test]
    pub fn test_render_comparisons() {
        let (ds, aliases) = setup();

        assert_eq!(ds.attr("age").gt(30).render(&aliases).unwrap(), "t.age > 30");
        assert_eq!(ds.attr("age").le(30).render(&aliases).unwrap(), "t.age <= 30");
        assert_eq!(ds.attr("name").eq("O'Neil").render(&aliases).unwrap(), "t.name = 'O''Neil'");
        assert_eq!(ds.attr("name").ne("x").render(&aliases).unwrap(), "t.name != 'x'");
        assert_eq!(ds.attr("name").like("%pizza%").render(&aliases).unwrap(), "t.name LIKE '%pizza%'");
        assert_eq!(ds.attr("address.city").eq("Porto").render(&aliases).unwrap(), "t.address.city = 'Porto'");
    }

    #[test]
    pub fn test_render_in_between_null_contains() {
        let (ds, aliases) = setup();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        assert_eq!(ds.attr("city").is_in(["Porto", "Braga"]).render(&aliases).unwrap(), "t.city IN ('Porto', 'Braga')");
        assert_eq!(ds.attr("stars").between(2, 4).render(&aliases).unwrap(), "t.stars BETWEEN 2 AND 4");
        assert_eq!(ds.attr("date").ge(day).render(&aliases).unwrap(), "t.date >= date('2020-01-01')");
        assert_eq!(ds.attr("email").is_null().render(&aliases).unwrap(), "t.email IS NULL");
        assert_eq!(ds.attr("email").is_not_null().render(&aliases).unwrap(), "t.email IS NOT NULL");
        assert_eq!(ds.attr("tags").contains("wifi").render(&aliases).unwrap(), "CONTAINS(t.tags, 'wifi')");
    }

    #[test]
    pub fn test_compound_precedence_is_visible() {
        let (ds, aliases) = setup();
        let a = ds.attr("a").eq(1);
        let b = ds.attr("b").eq(2);
        let c = ds.attr("c").eq(3);

        let left = (&a & &b) | c.clone();
        let right = a & (b | c);

        assert_eq!(left.render(&aliases).unwrap(), "((t.a = 1) AND (t.b = 2)) OR (t.c = 3)");
        assert_eq!(right.render(&aliases).unwrap(), "(t.a = 1) AND ((t.b = 2) OR (t.c = 3))");
    }

    #[test]
    pub fn test_negation() {
        let (ds, aliases) = setup();
        let pred = !ds.attr("stars").lt(3);
        assert_eq!(pred.render(&aliases).unwrap(), "NOT (t.stars < 3)");
    }

    #[test]
    pub fn test_composition_keeps_operands() {
        let (ds, _) = setup();
        let a = ds.attr("a").eq(1);
        let b = ds.attr("b").eq(2);
        let _ = &a & &b;
        let _ = !&a;
        assert_eq!(a, ds.attr("a").eq(1));
        assert_eq!(b, ds.attr("b").eq(2));
    }

    #[test]
    pub fn test_alias_comes_from_owning_dataset() {
        let business = DatasetRef::parse("Yelp.Businesses").unwrap();
        let reviews = DatasetRef::parse("Yelp.Reviews").unwrap();
        let mut aliases = AliasTable::new(business.clone(), "b");
        aliases.bind(reviews.clone(), "r");

        let pred = business.attr("stars").ge(4) & reviews.attr("useful").gt(0);
        assert_eq!(pred.render(&aliases).unwrap(), "(b.stars >= 4) AND (r.useful > 0)");
    }

    #[test]
    pub fn test_unbound_dataset_fails() {
        let (_, aliases) = setup();
        let other = DatasetRef::parse("Other").unwrap();

        let err = other.attr("x").eq(1).render(&aliases).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    pub fn test_bad_shapes_are_rejected() {
        let (ds, aliases) = setup();

        assert!(Predicate::simple(ds.attr("x"), Operator::In, Operand::Single(Literal::Int(1))).is_err());
        assert!(ds.attr("x").is_in(Vec::<i64>::new()).render(&aliases).is_err());
        assert!(ds.attr("x; DROP").eq(1).render(&aliases).is_err());
    }

    #[test]
    pub fn test_conjuncts_and_attributes() {
        let (ds, _) = setup();
        let pred = ds.attr("a").eq(1) & (ds.attr("b").eq(2) & (ds.attr("c").eq(3) | ds.attr("d").eq(4)));

        let attrs = pred.attributes().iter().map(|a| a.path.clone()).collect::<Vec<_>>();
        assert_eq!(attrs, vec!["a", "b", "c", "d"]);

        let parts = pred.into_conjuncts();
        assert_eq!(parts.len(), 3);
        assert!(!parts[0].is_compound());
        assert!(!parts[1].is_compound());
        assert!(parts[2].is_compound());
    }
}
