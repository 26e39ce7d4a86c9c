use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    connection::CursorProvider,
    execution::{Cursor, ExecuteOptions, ExecutionMode, Row},
    expr::{Attribute, DatasetRef, Identifier, Predicate},
    frame::{GroupBy, JoinOptions},
    literal::{Literal, LiteralSerializer},
    query::{AggregateFunc, JoinSpec, QueryBuilder, SelectItem, UnnestSpec},
    AsterixError
};

/// Chainable query over one primary dataset.
///
/// Building calls consume and return the frame. The statement is rendered
/// and run on [`QueryFrame::execute`], or on the first fetch if it was never
/// executed. Fetched rows are handed out once.
///
/// ```no_run
/// use std::sync::Arc;
/// use asterix_query::{Connection, ConnectionConfig, QueryFrame};
///
/// let conn = Arc::new(Connection::open(ConnectionConfig::default())?);
/// let users = QueryFrame::new(conn, "Shop.Users")?;
/// let age = users.col("age");
/// let mut adults = users.select(["id", "name"]).filter(age.gt(30)).order_by("id", true).limit(5);
/// for row in adults.fetch_all()? {
///     println!("{row}");
/// }
/// # Ok::<(), asterix_query::AsterixError>(())
/// ```
pub struct QueryFrame {
    provider: Arc<dyn CursorProvider>,
    builder: QueryBuilder,
    options: ExecuteOptions,
    cursor: Option<Cursor>,
    executed: bool,
    closed: bool,
}

impl fmt::Debug for QueryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFrame")
            .field("builder", &self.builder)
            .field("options", &self.options)
            .field("executed", &self.executed)
            .field("closed", &self.closed)
            .finish()
    }
}

impl QueryFrame {
    /// `dataset` is `name` or `namespace.name`.
    pub fn new(provider: Arc<dyn CursorProvider>, dataset: &str) -> Result<Self, AsterixError> {
        Ok(Self::from_dataset(provider, DatasetRef::parse(dataset)?))
    }

    pub fn from_dataset(provider: Arc<dyn CursorProvider>, dataset: DatasetRef) -> Self {
        Self {
            provider,
            builder: QueryBuilder::new(dataset),
            options: ExecuteOptions::default(),
            cursor: None,
            executed: false,
            closed: false,
        }
    }

    pub fn dataset(&self) -> &DatasetRef {
        self.builder.dataset()
    }

    pub fn alias(&self) -> &str {
        self.builder.alias()
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// A field of this frame's dataset, for building predicates.
    pub fn col(&self, field: &str) -> Attribute {
        self.builder.dataset().attr(field)
    }

    pub fn select<T: Into<SelectItem>>(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.builder.select(items);
        self
    }

    /// Add a condition. AND trees are split into separate WHERE entries;
    /// OR and NOT trees stay whole.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        for conjunct in predicate.into_conjuncts() {
            self.builder.add_where(conjunct);
        }
        self
    }

    pub fn r#where(self, predicate: Predicate) -> Self {
        self.filter(predicate)
    }

    /// Keep rows where `predicate` does not hold.
    pub fn mask(self, predicate: Predicate) -> Self {
        self.filter(!predicate)
    }

    pub fn isin<T: Into<Literal>>(self, field: &str, values: impl IntoIterator<Item = T>) -> Self {
        let predicate = self.col(field).is_in(values);
        self.filter(predicate)
    }

    pub fn between(self, field: &str, low: impl Into<Literal>, high: impl Into<Literal>) -> Self {
        let predicate = self.col(field).between(low, high);
        self.filter(predicate)
    }

    pub fn group_by<T: Into<String>>(self, keys: impl IntoIterator<Item = T>) -> GroupBy {
        let keys = keys.into_iter().map(Into::into).collect();
        GroupBy::new(self, keys)
    }

    /// Add `(field, function)` aggregates; a non-empty `group_by` replaces the
    /// grouping keys.
    pub fn aggregate<'a>(
        mut self,
        aggregates: impl IntoIterator<Item = (&'a str, &'a str)>,
        group_by: &[&str],
    ) -> Result<Self, AsterixError> {
        for (field, func) in aggregates {
            let func = func.parse::<AggregateFunc>()?;
            self.builder.aggregate(field, func)?;
        }
        if !group_by.is_empty() {
            self.builder.group_by(group_by.iter().copied());
        }
        Ok(self)
    }

    pub fn order_by(mut self, key: &str, descending: bool) -> Self {
        self.builder.order_by(key, descending);
        self
    }

    pub fn order_by_many<T: AsRef<str>>(mut self, keys: impl IntoIterator<Item = T>, descending: bool) -> Self {
        for key in keys {
            self.builder.order_by(key.as_ref(), descending);
        }
        self
    }

    /// Inner join with `other`'s dataset. Only the dataset is taken from
    /// `other`; its clauses are ignored.
    pub fn join(mut self, other: &QueryFrame, options: JoinOptions) -> Result<Self, AsterixError> {
        let (left_key, right_key) = options
            .resolve_keys()
            .ok_or_else(|| AsterixError::validation("Must provide either 'on' or both 'left_on' and 'right_on'"))?;

        let left_alias = match options.left_alias.as_deref() {
            Some(alias) if self.builder.alias_table().contains_alias(alias) => alias.to_string(),
            Some(alias) => {
                self.builder.set_alias(alias)?;
                alias.to_string()
            },
            None => self.builder.alias().to_string(),
        };
        let right_alias = options
            .right_alias
            .clone()
            .unwrap_or_else(|| format!("r{}", self.builder.joins().len()));

        let spec = JoinSpec::new(other.dataset().clone(), &left_alias, &right_alias, left_key, right_key)?;
        self.builder.add_join(spec)?;
        Ok(self)
    }

    /// Flatten the collection field `field` of the primary dataset, binding
    /// each element to `name`.
    pub fn unnest(mut self, field: &str, name: &str) -> Result<Self, AsterixError> {
        let spec = UnnestSpec::field(self.builder.alias(), field, name)?;
        self.builder.add_unnest(spec)?;
        Ok(self)
    }

    /// Flatten the result of an alias-qualified expression, e.g. one made by
    /// [`QueryFrame::split`].
    pub fn unnest_expr(mut self, expression: &str, name: &str) -> Result<Self, AsterixError> {
        let spec = UnnestSpec::expression(expression, name)?;
        self.builder.add_unnest(spec)?;
        Ok(self)
    }

    /// `split(<alias>.<field>, '<delimiter>')` over the primary dataset.
    pub fn split(&self, field: &str, delimiter: &str) -> Result<String, AsterixError> {
        Identifier::validate_path(field)?;
        Ok(format!(
            "split({}.{}, {})",
            self.builder.alias(),
            field,
            LiteralSerializer::quote_string(delimiter)
        ))
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.builder.limit(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.builder.offset(n);
        self
    }

    pub fn head(self, n: u64) -> Self {
        self.limit(n)
    }

    /// Keep the last `n` rows. Runs the statement once to count its rows,
    /// then narrows LIMIT and OFFSET so the next execution returns the tail.
    pub fn tail(mut self, n: u64) -> Result<Self, AsterixError> {
        self.execute()?;
        let total = self.row_count().unwrap_or(0) as u64;
        let base = self.builder.current_offset().unwrap_or(0);
        self.builder.offset(base + total.saturating_sub(n));
        self.builder.limit(n.min(total));
        self.executed = false;
        Ok(self)
    }

    pub fn with_alias(mut self, alias: &str) -> Result<Self, AsterixError> {
        self.builder.set_alias(alias)?;
        Ok(self)
    }

    /// Options used by [`QueryFrame::execute`] and lazy execution.
    pub fn with_options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }

    /// Clear every clause and any fetched rows; dataset and alias stay.
    pub fn reset(mut self) -> Self {
        self.builder.reset();
        self.executed = false;
        self
    }

    pub fn query_text(&self) -> Result<String, AsterixError> {
        self.builder.build()
    }

    pub fn execute(&mut self) -> Result<&mut Self, AsterixError> {
        let options = self.options.clone();
        self.execute_with(&options)
    }

    /// Render and run the statement. Async executions always block here,
    /// falling back to the connection's poll policy.
    pub fn execute_with(&mut self, options: &ExecuteOptions) -> Result<&mut Self, AsterixError> {
        if self.closed {
            return Err(AsterixError::Interface("frame is closed".into()));
        }
        let statement = self.builder.build()?;
        debug!(%statement, "executing frame");

        let mut cursor = match self.cursor.take() {
            Some(cursor) => cursor,
            None => self.provider.cursor().map_err(|e| e.with_statement(&statement, None))?,
        };

        let mut options = options.clone();
        if options.mode == ExecutionMode::Async && options.poll.is_none() {
            options.poll = Some(cursor.default_poll());
        }

        let result = cursor.execute_with(&statement, &[], &options);
        self.cursor = Some(cursor);
        self.executed = result.is_ok();
        result.map_err(|e| e.with_statement(&statement, None))?;
        Ok(self)
    }

    pub fn fetch_one(&mut self) -> Result<Option<Row>, AsterixError> {
        self.executed_cursor()?.fetch_one()
    }

    pub fn fetch_many(&mut self, size: usize) -> Result<Vec<Row>, AsterixError> {
        self.executed_cursor()?.fetch_many(size)
    }

    pub fn fetch_all(&mut self) -> Result<Vec<Row>, AsterixError> {
        self.executed_cursor()?.fetch_all()
    }

    /// Draining iterator over the rows not yet fetched.
    pub fn rows(&mut self) -> Result<impl Iterator<Item = Row> + '_, AsterixError> {
        self.executed_cursor()
    }

    /// Rows not yet fetched.
    pub fn len(&mut self) -> Result<usize, AsterixError> {
        Ok(self.executed_cursor()?.buffered())
    }

    pub fn is_empty(&mut self) -> Result<bool, AsterixError> {
        Ok(self.len()? == 0)
    }

    /// Rows the last execution produced, whether fetched or not.
    pub fn row_count(&self) -> Option<usize> {
        self.cursor.as_ref().and_then(Cursor::row_count)
    }

    /// Statement text of the last execution.
    pub fn statement(&self) -> Option<&str> {
        self.cursor.as_ref().and_then(Cursor::statement)
    }

    pub fn close(&mut self) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.close();
        }
        self.closed = true;
    }

    fn executed_cursor(&mut self) -> Result<&mut Cursor, AsterixError> {
        if self.closed {
            return Err(AsterixError::Interface("frame is closed".into()));
        }
        if !self.executed {
            self.execute()?;
        }
        self.cursor
            .as_mut()
            .ok_or_else(|| AsterixError::Interface("frame has no cursor".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;

    use crate::{
        connection::{Connection, ConnectionConfig, CursorProvider},
        execution::ExecuteOptions,
        frame::{JoinOptions, QueryFrame},
        transport::_tests::fixtures::{Reply, ScriptedBackend},
        ErrorKind
    };

    fn provider(replies: Vec<Reply>) -> (Arc<dyn CursorProvider>, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new(replies));
        let config = ConnectionConfig::default()
            .with_retries(0, Duration::ZERO)
            .with_async_polling(10, Duration::ZERO);
        let conn = Connection::with_backend(config, backend.clone()).unwrap();
        (Arc::new(conn), backend)
    }

    fn sent_statement(backend: &ScriptedBackend, index: usize) -> String {
        backend.requests()[index].body.as_ref().unwrap()["statement"].as_str().unwrap().to_string()
    }

    #[test]
    pub fn test_end_to_end_statement() {
        let (conn, backend) = provider(vec![Reply::results(json!([{"id": 9, "name": "Ann"}]))]);
        let ds = QueryFrame::new(conn, "Ds").unwrap();
        let age = ds.col("age");
        let mut frame = ds.select(["id", "name"]).filter(age.gt(30)).order_by("id", true).limit(5);

        let expected = "SELECT t.id, t.name FROM Ds t WHERE t.age > 30 ORDER BY t.id DESC LIMIT 5;";
        assert_eq!(frame.query_text().unwrap(), expected);

        let rows = frame.fetch_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("Ann")));
        assert_eq!(sent_statement(&backend, 0), expected);
    }

    #[test]
    pub fn test_filter_splits_conjunctions() {
        let (conn, _) = provider(vec![]);
        let ds = QueryFrame::new(conn, "Ds").unwrap();
        let (a, b, c, d) = (ds.col("a").eq(1), ds.col("b").eq(2), ds.col("c").eq(3), ds.col("d").eq(4));

        let frame = ds.filter(a & (b & (c | d)));
        assert_eq!(frame.builder().where_clauses().len(), 3);
        assert_eq!(
            frame.query_text().unwrap(),
            "SELECT VALUE t FROM Ds t WHERE t.a = 1 AND t.b = 2 AND ((t.c = 3) OR (t.d = 4));"
        );
    }

    #[test]
    pub fn test_mask_isin_between() {
        let (conn, _) = provider(vec![]);
        let ds = QueryFrame::new(conn, "Yelp.Businesses").unwrap();
        let closed = ds.col("is_open").eq(0);

        let frame = ds.mask(closed).isin("city", ["Porto", "Braga"]).between("stars", 3, 5);
        assert_eq!(
            frame.query_text().unwrap(),
            "USE Yelp; SELECT VALUE t FROM Businesses t WHERE NOT (t.is_open = 0) AND t.city IN ('Porto', 'Braga') AND t.stars BETWEEN 3 AND 5;"
        );
    }

    #[test]
    pub fn test_join_after_filter_rebinds_alias() {
        let (conn, _) = provider(vec![]);
        let business = QueryFrame::new(conn.clone(), "Yelp.Businesses").unwrap();
        let reviews = QueryFrame::new(conn, "Yelp.Reviews").unwrap();
        let stars = reviews.col("stars");

        let frame = business
            .filter(stars.ge(4))
            .join(&reviews, JoinOptions::keys("business_id", "business_id").with_left_alias("b").with_right_alias("r"))
            .unwrap()
            .select(["name", "r.text"]);

        assert_eq!(
            frame.query_text().unwrap(),
            "USE Yelp; SELECT b.name, r.text FROM Businesses b JOIN Reviews r ON b.business_id = r.business_id WHERE r.stars >= 4;"
        );
    }

    #[test]
    pub fn test_join_default_aliases() {
        let (conn, _) = provider(vec![]);
        let business = QueryFrame::new(conn.clone(), "Businesses").unwrap();
        let reviews = QueryFrame::new(conn.clone(), "Reviews").unwrap();
        let users = QueryFrame::new(conn, "Users").unwrap();

        let frame = business
            .join(&reviews, JoinOptions::keys("id", "business_id"))
            .unwrap()
            .join(&users, JoinOptions::keys("user_id", "id").with_left_alias("r0"))
            .unwrap();

        assert_eq!(
            frame.query_text().unwrap(),
            "SELECT VALUE t FROM Businesses t JOIN Reviews r0 ON t.id = r0.business_id JOIN Users r1 ON r0.user_id = r1.id;"
        );
        assert!(frame.join(&QueryFrame::new(provider(vec![]).0, "X").unwrap(), JoinOptions::default()).is_err());
    }

    #[test]
    pub fn test_group_by_agg() {
        let (conn, _) = provider(vec![]);
        let frame = QueryFrame::new(conn, "Businesses")
            .unwrap()
            .group_by(["city"])
            .agg([("stars", "avg"), ("review_count", "SUM")])
            .unwrap()
            .order_by("avg_stars", true);

        assert_eq!(
            frame.query_text().unwrap(),
            "SELECT AVG(t.stars) AS avg_stars, SUM(t.review_count) AS sum_review_count FROM Businesses t GROUP BY t.city ORDER BY avg_stars DESC;"
        );
    }

    #[test]
    pub fn test_unknown_aggregate_is_rejected() {
        let (conn, _) = provider(vec![]);
        let err = QueryFrame::new(conn, "Ds").unwrap().aggregate([("stars", "MEDIAN")], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    pub fn test_unnest_split() {
        let (conn, _) = provider(vec![]);
        let ds = QueryFrame::new(conn, "Businesses").unwrap().with_alias("b").unwrap();
        let expr = ds.split("categories", ",").unwrap();

        let frame = ds
            .unnest_expr(&expr, "category")
            .unwrap()
            .select(["category"])
            .group_by(["category"])
            .agg([("business_id", "COUNT")])
            .unwrap()
            .order_by_many(["count_business_id", "category"], true)
            .head(10);

        assert_eq!(
            frame.query_text().unwrap(),
            "SELECT category, COUNT(b.business_id) AS count_business_id FROM Businesses b \
             UNNEST split(b.categories, ',') AS category GROUP BY category \
             ORDER BY count_business_id DESC, category DESC LIMIT 10;"
        );
    }

    #[test]
    pub fn test_unnest_field() {
        let (conn, _) = provider(vec![]);
        let frame = QueryFrame::new(conn, "Users").unwrap().unnest("friends", "f").unwrap().select(["f.name"]);
        assert_eq!(frame.query_text().unwrap(), "SELECT f.name FROM Users t UNNEST t.friends AS f;");
    }

    #[test]
    pub fn test_lazy_execution_and_draining() {
        let (conn, backend) = provider(vec![Reply::results(json!([1, 2, 3]))]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap();

        assert_eq!(frame.len().unwrap(), 3);
        assert_eq!(frame.fetch_one().unwrap().unwrap().get("value"), Some(&json!(1)));
        assert_eq!(frame.rows().unwrap().count(), 2);
        assert!(frame.is_empty().unwrap());
        assert!(frame.fetch_all().unwrap().is_empty());
        assert_eq!(frame.row_count(), Some(3));
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    pub fn test_async_frame_execution() {
        let (conn, backend) = provider(vec![
            Reply::running("/query/service/status/5"),
            Reply::status_running(),
            Reply::status_running(),
            Reply::status_success("/query/service/result/5-0"),
            Reply::results(json!([{"id": 1}, {"id": 2}])),
        ]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().with_options(ExecuteOptions::asynchronous(None));

        let rows = frame.fetch_all().unwrap();
        assert_eq!(rows.iter().map(|r| r.get("id").cloned().unwrap()).collect::<Vec<_>>(), vec![json!(1), json!(2)]);
        assert_eq!(backend.count_paths("/status/"), 3);
        assert_eq!(backend.count_paths("/result/"), 1);
    }

    #[test]
    pub fn test_async_failure_skips_fetch() {
        let (conn, backend) = provider(vec![
            Reply::running("/query/service/status/6"),
            Reply::status_running(),
            Reply::failed("Cannot resolve field"),
        ]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap();
        let err = frame.execute_with(&ExecuteOptions::asynchronous(None)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.statement(), Some("SELECT VALUE t FROM Ds t;"));
        assert_eq!(err.handle(), Some("/query/service/status/6"));
        assert_eq!(backend.count_paths("/result/"), 0);
    }

    #[test]
    pub fn test_remote_error_carries_statement() {
        let (conn, _) = provider(vec![Reply::json(json!({
            "status": "fatal",
            "errors": [{"code": 1, "msg": "Cannot find dataset Ds in dataverse Default"}]
        }))]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().limit(1);
        let err = frame.execute().unwrap_err();

        let text = err.to_string();
        assert!(text.contains("Cannot find dataset Ds"));
        assert!(text.contains("Query: SELECT VALUE t FROM Ds t LIMIT 1;"));
    }

    #[test]
    pub fn test_transport_failure_carries_statement() {
        let (conn, _) = provider(vec![Reply::connect_refused()]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap();
        let err = frame.fetch_all().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.statement(), Some("SELECT VALUE t FROM Ds t;"));
    }

    #[test]
    pub fn test_tail_reruns_with_offset() {
        let (conn, backend) = provider(vec![
            Reply::results(json!([{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5}])),
            Reply::results(json!([{"id": 4}, {"id": 5}])),
        ]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().order_by("id", false).tail(2).unwrap();
        let rows = frame.fetch_all().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&json!(4)));
        assert_eq!(sent_statement(&backend, 0), "SELECT VALUE t FROM Ds t ORDER BY t.id ASC;");
        assert_eq!(sent_statement(&backend, 1), "SELECT VALUE t FROM Ds t ORDER BY t.id ASC LIMIT 2 OFFSET 3;");
    }

    #[test]
    pub fn test_tail_longer_than_result() {
        let (conn, backend) = provider(vec![
            Reply::results(json!([{"id": 1}])),
            Reply::results(json!([{"id": 1}])),
        ]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().offset(10).tail(5).unwrap();

        assert_eq!(frame.len().unwrap(), 1);
        assert_eq!(sent_statement(&backend, 1), "SELECT VALUE t FROM Ds t LIMIT 1 OFFSET 10;");
    }

    #[test]
    pub fn test_empty_isin_fails_at_render() {
        let (conn, backend) = provider(vec![]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().isin("id", Vec::<i64>::new());

        assert_eq!(frame.query_text().unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(frame.fetch_all().unwrap_err().kind(), ErrorKind::Validation);
        assert!(backend.requests().is_empty());
    }

    #[test]
    pub fn test_malformed_order_key_fails_at_render() {
        let (conn, backend) = provider(vec![]);
        let frame = QueryFrame::new(conn, "Ds").unwrap().order_by("id; DROP DATASET X", false);
        assert_eq!(frame.query_text().unwrap_err().kind(), ErrorKind::Validation);

        let (conn, _) = provider(vec![]);
        let frame = QueryFrame::new(conn, "Ds").unwrap().group_by([""]).agg([("id", "count")]).unwrap();
        assert_eq!(frame.query_text().unwrap_err().kind(), ErrorKind::Validation);
        assert!(backend.requests().is_empty());
    }

    #[test]
    pub fn test_reset_and_close() {
        let (conn, _) = provider(vec![Reply::results(json!([]))]);
        let mut frame = QueryFrame::new(conn, "Ds").unwrap().select(["a"]).limit(3).reset();
        assert_eq!(frame.query_text().unwrap(), "SELECT VALUE t FROM Ds t;");

        frame.execute().unwrap();
        assert_eq!(frame.statement(), Some("SELECT VALUE t FROM Ds t;"));
        frame.close();
        assert_eq!(frame.fetch_all().unwrap_err().kind(), ErrorKind::Interface);
    }
}
