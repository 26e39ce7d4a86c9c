use indexmap::IndexMap;
use tracing::trace;

use crate::{
    expr::{AliasTable, DatasetRef, Identifier, Predicate},
    query::{AggregateFunc, JoinSpec, KeyResolver, KeyScope, OrderKey, SelectItem, UnnestSource, UnnestSpec},
    AsterixError
};

pub const DEFAULT_ALIAS: &str = "t";

/// Accumulates clause state for one SELECT statement over a primary dataset
/// and renders it in the order the service expects:
///
/// `USE; SELECT; FROM; JOIN*; UNNEST*; WHERE; GROUP BY; ORDER BY; LIMIT; OFFSET;`
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    dataset: DatasetRef,
    alias: String,
    select_items: Vec<SelectItem>,
    where_clauses: Vec<Predicate>,
    joins: Vec<JoinSpec>,
    unnests: Vec<UnnestSpec>,
    group_by: Vec<String>,
    aggregates: IndexMap<String, AggregateFunc>,
    order_by: Vec<OrderKey>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    pub fn new(dataset: DatasetRef) -> Self {
        Self {
            dataset,
            alias: DEFAULT_ALIAS.to_string(),
            select_items: vec![],
            where_clauses: vec![],
            joins: vec![],
            unnests: vec![],
            group_by: vec![],
            aggregates: IndexMap::new(),
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn with_alias(dataset: DatasetRef, alias: &str) -> Result<Self, AsterixError> {
        let mut builder = Self::new(dataset);
        builder.set_alias(alias)?;
        Ok(builder)
    }

    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn where_clauses(&self) -> &[Predicate] {
        &self.where_clauses
    }

    pub fn unnests(&self) -> &[UnnestSpec] {
        &self.unnests
    }

    /// Rename the primary alias. Joins and unnests that referred to the old
    /// alias follow the rename.
    pub fn set_alias(&mut self, alias: &str) -> Result<&mut Self, AsterixError> {
        Identifier::validate(alias, "alias")?;
        if alias == self.alias {
            return Ok(self);
        }
        if self.alias_table().contains_alias(alias) || self.unnests.iter().any(|u| u.name == alias) {
            return Err(AsterixError::validation(format!("Alias '{}' is already bound in this query", alias)));
        }

        let old = std::mem::replace(&mut self.alias, alias.to_string());
        for join in &mut self.joins {
            if join.left_alias == old {
                join.left_alias = alias.to_string();
            }
        }
        for unnest in &mut self.unnests {
            if let UnnestSource::Field { alias: source_alias, .. } = &mut unnest.source {
                if *source_alias == old {
                    *source_alias = alias.to_string();
                }
            }
        }
        Ok(self)
    }

    /// Replace the projection list.
    pub fn select<T: Into<SelectItem>>(&mut self, items: impl IntoIterator<Item = T>) -> &mut Self {
        self.select_items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Add one top-level WHERE condition; conditions are ANDed together.
    pub fn add_where(&mut self, predicate: Predicate) -> &mut Self {
        self.where_clauses.push(predicate);
        self
    }

    pub fn add_join(&mut self, join: JoinSpec) -> Result<&mut Self, AsterixError> {
        let aliases = self.alias_table();
        if !aliases.contains_alias(&join.left_alias) {
            return Err(AsterixError::validation(format!(
                "Join left alias '{}' is not bound in this query",
                join.left_alias
            )));
        }
        if aliases.contains_alias(&join.right_alias) || self.unnests.iter().any(|u| u.name == join.right_alias) {
            return Err(AsterixError::validation(format!("Alias '{}' is already bound in this query", join.right_alias)));
        }
        trace!(dataset = %join.dataset, alias = %join.right_alias, "registering join");
        self.joins.push(join);
        Ok(self)
    }

    pub fn add_unnest(&mut self, unnest: UnnestSpec) -> Result<&mut Self, AsterixError> {
        if self.alias_table().contains_alias(&unnest.name) || self.unnests.iter().any(|u| u.name == unnest.name) {
            return Err(AsterixError::validation(format!("Alias '{}' is already bound in this query", unnest.name)));
        }
        self.unnests.push(unnest);
        Ok(self)
    }

    /// Replace the GROUP BY key list.
    pub fn group_by<T: Into<String>>(&mut self, keys: impl IntoIterator<Item = T>) -> &mut Self {
        self.group_by = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn aggregate(&mut self, field: &str, func: AggregateFunc) -> Result<&mut Self, AsterixError> {
        Identifier::validate_path(field)?;
        self.aggregates.insert(field.to_string(), func);
        Ok(self)
    }

    pub fn order_by(&mut self, key: impl Into<String>, descending: bool) -> &mut Self {
        self.order_by.push(OrderKey::new(key, descending));
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    pub fn current_offset(&self) -> Option<u64> {
        self.offset
    }

    /// Clear every clause, keeping the primary dataset and its alias.
    pub fn reset(&mut self) -> &mut Self {
        let dataset = self.dataset.clone();
        let alias = std::mem::take(&mut self.alias);
        *self = Self::new(dataset);
        self.alias = alias;
        self
    }

    /// Primary binding first, then each join in registration order.
    pub fn alias_table(&self) -> AliasTable {
        let mut table = AliasTable::new(self.dataset.clone(), self.alias.clone());
        for join in &self.joins {
            table.bind(join.dataset.clone(), join.right_alias.clone());
        }
        table
    }

    fn output_names(&self) -> Vec<String> {
        let mut names = self
            .select_items
            .iter()
            .filter_map(|item| item.alias.clone())
            .collect::<Vec<_>>();
        names.extend(self.aggregates.iter().map(|(field, func)| func.output_name(field)));
        names
    }

    pub fn build(&self) -> Result<String, AsterixError> {
        let aliases = self.alias_table();
        let output_names = self.output_names();
        let scope = KeyScope {
            aliases: &aliases,
            output_names: output_names.iter().map(String::as_str).collect(),
            unnest_names: self.unnests.iter().map(|u| u.name.as_str()).collect(),
        };

        let mut parts: Vec<String> = vec![];

        if let Some(namespace) = &self.dataset.namespace {
            parts.push(format!("USE {};", namespace));
        }

        parts.push(self.build_select(&scope));
        parts.push(format!("FROM {} {}", self.dataset.name, self.alias));
        parts.extend(self.joins.iter().map(JoinSpec::render));
        parts.extend(self.unnests.iter().map(UnnestSpec::render));

        if let Some(clause) = self.build_where(&aliases)? {
            parts.push(clause);
        }

        if !self.group_by.is_empty() {
            let keys = self
                .group_by
                .iter()
                .map(|k| KeyResolver::resolve(k, &scope))
                .collect::<Result<Vec<_>, _>>()?;
            parts.push(format!("GROUP BY {}", keys.join(", ")));
        }

        if !self.order_by.is_empty() {
            let keys = self
                .order_by
                .iter()
                .map(|o| Ok(format!("{} {}", KeyResolver::resolve(&o.key, &scope)?, o.direction())))
                .collect::<Result<Vec<_>, AsterixError>>()?;
            parts.push(format!("ORDER BY {}", keys.join(", ")));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }

        Ok(format!("{};", parts.join(" ")))
    }

    fn build_select(&self, scope: &KeyScope) -> String {
        if self.select_items.is_empty() && self.aggregates.is_empty() {
            return format!("SELECT VALUE {}", self.alias);
        }

        let mut columns = self
            .select_items
            .iter()
            .map(|item| {
                if item.alias.is_some() {
                    item.text.clone()
                } else {
                    KeyResolver::resolve_field(&item.text, scope)
                }
            })
            .collect::<Vec<_>>();

        for (field, func) in &self.aggregates {
            columns.push(format!("{}({}) AS {}", func, KeyResolver::resolve_field(field, scope), func.output_name(field)));
        }

        format!("SELECT {}", columns.join(", "))
    }

    fn build_where(&self, aliases: &AliasTable) -> Result<Option<String>, AsterixError> {
        if self.where_clauses.is_empty() {
            return Ok(None);
        }
        let wrap = self.where_clauses.len() > 1;
        let mut conditions = Vec::with_capacity(self.where_clauses.len());
        for predicate in &self.where_clauses {
            let text = predicate.render(aliases)?;
            // OR groups stay parenthesised inside the AND chain
            if wrap && predicate.is_compound() && !matches!(predicate, Predicate::Negated(_)) {
                conditions.push(format!("({})", text));
            } else {
                conditions.push(text);
            }
        }
        Ok(Some(format!("WHERE {}", conditions.join(" AND "))))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        expr::DatasetRef,
        query::{AggregateFunc, JoinSpec, QueryBuilder, UnnestSpec},
        ErrorKind
    };

    fn ds(name: &str) -> DatasetRef {
        DatasetRef::parse(name).unwrap()
    }

    #[test]
    pub fn test_whole_record_projection() {
        let qb = QueryBuilder::new(ds("Ds"));
        assert_eq!(qb.build().unwrap(), "SELECT VALUE t FROM Ds t;");
    }

    #[test]
    pub fn test_end_to_end_shape() {
        let data = ds("Ds");
        let mut qb = QueryBuilder::new(data.clone());
        qb.select(["id", "name"])
            .add_where(data.attr("age").gt(30))
            .order_by("id", true)
            .limit(5);

        assert_eq!(qb.build().unwrap(), "SELECT t.id, t.name FROM Ds t WHERE t.age > 30 ORDER BY t.id DESC LIMIT 5;");
    }

    #[test]
    pub fn test_build_is_idempotent() {
        let data = ds("Yelp.Businesses");
        let mut qb = QueryBuilder::new(data.clone());
        qb.select(["name", "COUNT(t.id) AS n"])
            .add_where(data.attr("stars").ge(4) | data.attr("review_count").gt(100))
            .group_by(["name"])
            .order_by("n", true)
            .limit(10)
            .offset(20);

        let first = qb.build().unwrap();
        let second = qb.build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    pub fn test_use_namespace_and_clause_order() {
        let business = ds("Yelp.Businesses");
        let reviews = ds("Yelp.Reviews");
        let mut qb = QueryBuilder::with_alias(business.clone(), "b").unwrap();
        qb.add_join(JoinSpec::new(reviews.clone(), "b", "r", "business_id", "business_id").unwrap()).unwrap();
        qb.add_unnest(UnnestSpec::field("b", "categories", "c").unwrap()).unwrap();
        qb.select(["name", "r.text", "c"])
            .add_where(reviews.attr("stars").eq(5))
            .order_by("c", false)
            .limit(3)
            .offset(6);

        assert_eq!(
            qb.build().unwrap(),
            "USE Yelp; SELECT b.name, r.text, c FROM Businesses b \
             JOIN Reviews r ON b.business_id = r.business_id \
             UNNEST b.categories AS c \
             WHERE r.stars = 5 ORDER BY c ASC LIMIT 3 OFFSET 6;"
        );
    }

    #[test]
    pub fn test_select_alias_wins_in_order_by() {
        let mut qb = QueryBuilder::new(ds("Ds"));
        qb.select(["x AS y"]).order_by("y", false);

        assert_eq!(qb.build().unwrap(), "SELECT x AS y FROM Ds t ORDER BY y ASC;");
    }

    #[test]
    pub fn test_group_by_and_order_by_resolve_alike() {
        let mut qb = QueryBuilder::new(ds("Ds"));
        qb.select(["t.city AS city_name", "state"])
            .group_by(["city_name", "state", "LOWER(t.zip)"])
            .order_by("city_name", false)
            .order_by("state", false)
            .order_by("LOWER(t.zip)", true);

        let text = qb.build().unwrap();
        assert!(text.contains("GROUP BY city_name, t.state, LOWER(t.zip)"));
        assert!(text.contains("ORDER BY city_name ASC, t.state ASC, LOWER(t.zip) DESC"));
    }

    #[test]
    pub fn test_aggregates_without_columns() {
        let mut qb = QueryBuilder::new(ds("Ds"));
        qb.aggregate("stars", AggregateFunc::Avg).unwrap();
        qb.aggregate("review_count", AggregateFunc::Sum).unwrap();
        qb.group_by(["city"]).order_by("avg_stars", true);

        assert_eq!(
            qb.build().unwrap(),
            "SELECT AVG(t.stars) AS avg_stars, SUM(t.review_count) AS sum_review_count FROM Ds t GROUP BY t.city ORDER BY avg_stars DESC;"
        );
    }

    #[test]
    pub fn test_aggregate_over_unnested_name() {
        let mut qb = QueryBuilder::new(ds("Ds"));
        qb.add_unnest(UnnestSpec::field("t", "tags", "tag").unwrap()).unwrap();
        qb.aggregate("tag", AggregateFunc::Count).unwrap();
        qb.group_by(["tag"]);

        assert_eq!(
            qb.build().unwrap(),
            "SELECT COUNT(tag) AS count_tag FROM Ds t UNNEST t.tags AS tag GROUP BY tag;"
        );
    }

    #[test]
    pub fn test_join_after_filter_uses_join_alias() {
        let business = ds("Businesses");
        let reviews = ds("Reviews");
        let mut qb = QueryBuilder::new(business.clone());
        qb.add_where(reviews.attr("stars").ge(4));
        qb.add_join(JoinSpec::new(reviews.clone(), "t", "r0", "id", "business_id").unwrap()).unwrap();

        assert_eq!(
            qb.build().unwrap(),
            "SELECT VALUE t FROM Businesses t JOIN Reviews r0 ON t.id = r0.business_id WHERE r0.stars >= 4;"
        );
    }

    #[test]
    pub fn test_unjoined_dataset_fails_build() {
        let mut qb = QueryBuilder::new(ds("Businesses"));
        qb.add_where(ds("Reviews").attr("stars").ge(4));

        assert_eq!(qb.build().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    pub fn test_top_level_or_is_parenthesised() {
        let data = ds("Ds");
        let mut qb = QueryBuilder::new(data.clone());
        qb.add_where(data.attr("a").eq(1))
            .add_where(data.attr("b").eq(2) | data.attr("c").eq(3))
            .add_where(!data.attr("d").eq(4));

        assert_eq!(
            qb.build().unwrap(),
            "SELECT VALUE t FROM Ds t WHERE t.a = 1 AND ((t.b = 2) OR (t.c = 3)) AND NOT (t.d = 4);"
        );
    }

    #[test]
    pub fn test_reset_keeps_dataset_and_alias() {
        let data = ds("Yelp.Businesses");
        let mut qb = QueryBuilder::with_alias(data.clone(), "b").unwrap();
        qb.select(["name"]).add_where(data.attr("stars").gt(3)).limit(1);
        qb.reset();

        assert_eq!(qb.build().unwrap(), "USE Yelp; SELECT VALUE b FROM Businesses b;");
    }

    #[test]
    pub fn test_alias_rename_follows_joins() {
        let mut qb = QueryBuilder::new(ds("Businesses"));
        qb.add_join(JoinSpec::new(ds("Reviews"), "t", "r", "id", "business_id").unwrap()).unwrap();
        qb.set_alias("b").unwrap();

        assert_eq!(
            qb.build().unwrap(),
            "SELECT VALUE b FROM Businesses b JOIN Reviews r ON b.id = r.business_id;"
        );
    }

    #[test]
    pub fn test_alias_collisions_are_rejected() {
        let mut qb = QueryBuilder::new(ds("Businesses"));
        assert!(qb.add_join(JoinSpec::new(ds("Reviews"), "t", "t", "id", "id").unwrap()).is_err());
        assert!(qb.add_join(JoinSpec::new(ds("Reviews"), "x", "r", "id", "id").unwrap()).is_err());
        assert!(qb.add_unnest(UnnestSpec::field("t", "tags", "t").unwrap()).is_err());
        assert!(qb.aggregate("bad field", AggregateFunc::Max).is_err());
    }
}
