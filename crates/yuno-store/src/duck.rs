//! DuckDB storage for the `policies` cache table.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{Connection, Row, params_from_iter};
use tracing::{debug, info};
use yuno_core::row::format_timestamp;
use yuno_core::{Clock, Policy, PolicyQuery, PolicyRow, SystemClock};

use crate::filter::{PageOrder, QueryBuilder, SqlValue};
use crate::{PolicyCache, StoreError, StoredPage};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS policies (
    id               VARCHAR PRIMARY KEY,
    title            VARCHAR NOT NULL,
    category         VARCHAR NOT NULL,
    description      VARCHAR,
    content          VARCHAR,
    deadline         VARCHAR,
    start_date       VARCHAR,
    end_date         VARCHAR,
    application_url  VARCHAR,
    contact_info     VARCHAR,
    requirements     VARCHAR NOT NULL,
    benefits         VARCHAR NOT NULL,
    documents        VARCHAR NOT NULL,
    region           VARCHAR NOT NULL,
    target_age       VARCHAR,
    age_min          INTEGER,
    age_max          INTEGER,
    target_education VARCHAR,
    tags             VARCHAR NOT NULL,
    image_url        VARCHAR,
    status           VARCHAR NOT NULL,
    view_count       BIGINT NOT NULL DEFAULT 0,
    popularity_score DOUBLE NOT NULL DEFAULT 0,
    cached_at        VARCHAR,
    created_at       VARCHAR NOT NULL,
    updated_at       VARCHAR NOT NULL
)";

/// Columns read back into a [`PolicyRow`], in `read_row` order.
const SELECT_COLUMNS: &str = "id, title, category, description, content, deadline, start_date, \
    end_date, application_url, contact_info, requirements, benefits, documents, region, \
    target_age, age_min, age_max, target_education, tags, image_url, status, view_count, \
    popularity_score, cached_at, updated_at";

/// Columns written by an upsert, in `bind_row` order.
const INSERT_COLUMNS: &str = "id, title, category, description, content, deadline, start_date, \
    end_date, application_url, contact_info, requirements, benefits, documents, region, \
    target_age, age_min, age_max, target_education, tags, image_url, status, view_count, \
    popularity_score, cached_at, updated_at, created_at";

const INSERT_WIDTH: usize = 26;

/// Overwritten on conflict. `view_count`, `popularity_score` and
/// `created_at` keep their stored values.
const UPDATE_SET: &str = "title = EXCLUDED.title, category = EXCLUDED.category, \
    description = EXCLUDED.description, content = EXCLUDED.content, \
    deadline = EXCLUDED.deadline, start_date = EXCLUDED.start_date, \
    end_date = EXCLUDED.end_date, application_url = EXCLUDED.application_url, \
    contact_info = EXCLUDED.contact_info, requirements = EXCLUDED.requirements, \
    benefits = EXCLUDED.benefits, documents = EXCLUDED.documents, region = EXCLUDED.region, \
    target_age = EXCLUDED.target_age, age_min = EXCLUDED.age_min, age_max = EXCLUDED.age_max, \
    target_education = EXCLUDED.target_education, tags = EXCLUDED.tags, \
    image_url = EXCLUDED.image_url, status = EXCLUDED.status, \
    cached_at = EXCLUDED.cached_at, updated_at = EXCLUDED.updated_at";

/// DuckDB-backed policy cache.
///
/// One `policies` table keyed by `id`. Structured fields are JSON text (see
/// [`PolicyRow`]), so the table needs no DuckDB extensions. Supports both
/// in-memory and file-backed databases; timestamps written by upserts come
/// from the injected [`Clock`].
///
/// The inherent methods block on the connection. The [`PolicyCache`] impl
/// runs them on tokio's blocking pool. Clones share the connection.
#[derive(Clone)]
pub struct DuckPolicyStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl DuckPolicyStore {
    /// Open an in-memory database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used to stamp `cached_at`, `updated_at` and `created_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("policy store connection lock poisoned".into()))
    }

    /// Number of rows in `policies`, any status.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT count(*) FROM policies", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ── Reads ──

    /// Active policies matching `query`, ordered by popularity then `updated_at`.
    pub fn query_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError> {
        self.select_page(&QueryBuilder::for_policies(query, true), query, PageOrder::Updated)
    }

    /// Active policies matching `query` (age bounds ignored), ordered by
    /// popularity then `created_at`.
    pub fn query_cached_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError> {
        self.select_page(&QueryBuilder::for_policies(query, false), query, PageOrder::Created)
    }

    fn select_page(
        &self,
        filter: &QueryBuilder,
        query: &PolicyQuery,
        order: PageOrder,
    ) -> Result<StoredPage, StoreError> {
        let where_clause = filter.where_clause();
        let values: Vec<Value> = filter.values().iter().map(to_value).collect();
        let conn = self.conn()?;

        let count_sql = format!("SELECT count(*) FROM policies {where_clause}");
        let total: i64 =
            conn.query_row(&count_sql, params_from_iter(values.iter()), |row| row.get(0))?;

        // LIMIT and OFFSET are typed integers.
        let page_sql = format!(
            "SELECT {SELECT_COLUMNS} FROM policies {where_clause} {} LIMIT {} OFFSET {}",
            order.order_by(),
            query.limit,
            query.offset()
        );
        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), read_row)?
            .collect::<Result<Vec<PolicyRow>, _>>()?;
        let policies = rows
            .into_iter()
            .map(PolicyRow::into_policy)
            .collect::<Result<Vec<Policy>, _>>()?;

        debug!(total, returned = policies.len(), page = query.page, "queried policy page");
        Ok(StoredPage {
            policies,
            total: total.max(0) as u64,
        })
    }

    /// Fetch a single policy by id, whatever its status.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Policy>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM policies WHERE id = ?");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt.query_map([id], read_row)?.next().transpose()?;
        Ok(row.map(PolicyRow::into_policy).transpose()?)
    }

    // ── Writes ──

    /// Insert or fully overwrite one policy. `cached_at` and `updated_at` are
    /// stamped with the store clock.
    pub fn upsert_one(&self, policy: &Policy) -> Result<(), StoreError> {
        let now = format_timestamp(self.clock.now());
        let mut row = PolicyRow::from_policy(policy)?;
        row.cached_at = Some(now.clone());
        row.updated_at = Some(now.clone());

        let values = bind_row(row, &now);
        let conn = self.conn()?;
        conn.execute(&upsert_sql(1), params_from_iter(values.iter()))?;
        debug!(id = %policy.id, "upserted policy");
        Ok(())
    }

    /// Insert or overwrite many policies in a single statement.
    ///
    /// Each element keeps its own `cached_at` (now when absent); `updated_at`
    /// is stamped with the store clock. Repeated ids collapse to their last
    /// occurrence. Returns the number of distinct rows written.
    pub fn upsert_batch(&self, policies: &[Policy]) -> Result<usize, StoreError> {
        let policies = dedup_last_wins(policies);
        if policies.is_empty() {
            return Ok(0);
        }

        let now = format_timestamp(self.clock.now());
        let mut values = Vec::with_capacity(policies.len() * INSERT_WIDTH);
        for policy in &policies {
            let mut row = PolicyRow::from_policy(policy)?;
            if row.cached_at.is_none() {
                row.cached_at = Some(now.clone());
            }
            row.updated_at = Some(now.clone());
            values.extend(bind_row(row, &now));
        }

        let conn = self.conn()?;
        conn.execute(&upsert_sql(policies.len()), params_from_iter(values.iter()))?;
        info!(count = policies.len(), "batch upserted policies");
        Ok(policies.len())
    }
}

/// Run a store call on the blocking pool so DuckDB never stalls a runtime worker.
async fn off_runtime<T, F>(call: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| StoreError::Other(format!("policy store task failed: {e}")))?
}

#[async_trait]
impl PolicyCache for DuckPolicyStore {
    async fn query_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError> {
        let (store, query) = (self.clone(), query.clone());
        off_runtime(move || store.query_page(&query)).await
    }

    async fn query_cached_page(&self, query: &PolicyQuery) -> Result<StoredPage, StoreError> {
        let (store, query) = (self.clone(), query.clone());
        off_runtime(move || store.query_cached_page(&query)).await
    }

    async fn upsert_one(&self, policy: &Policy) -> Result<(), StoreError> {
        let (store, policy) = (self.clone(), policy.clone());
        off_runtime(move || store.upsert_one(&policy)).await
    }

    async fn upsert_batch(&self, policies: &[Policy]) -> Result<usize, StoreError> {
        let (store, policies) = (self.clone(), policies.to_vec());
        off_runtime(move || store.upsert_batch(&policies)).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Policy>, StoreError> {
        let (store, id) = (self.clone(), id.to_string());
        off_runtime(move || store.get_by_id(&id)).await
    }
}

fn upsert_sql(rows: usize) -> String {
    let tuple = format!("({})", vec!["?"; INSERT_WIDTH].join(", "));
    let tuples = vec![tuple; rows].join(", ");
    format!(
        "INSERT INTO policies ({INSERT_COLUMNS}) VALUES {tuples} \
         ON CONFLICT (id) DO UPDATE SET {UPDATE_SET}"
    )
}

fn dedup_last_wins(policies: &[Policy]) -> Vec<&Policy> {
    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(policies.len());
    for (i, policy) in policies.iter().enumerate() {
        last_index.insert(policy.id.as_str(), i);
    }
    policies
        .iter()
        .enumerate()
        .filter(|(i, policy)| last_index.get(policy.id.as_str()) == Some(i))
        .map(|(_, policy)| policy)
        .collect()
}

fn to_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Int(i) => Value::BigInt(*i),
    }
}

fn text(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

fn int(value: Option<i32>) -> Value {
    value.map(Value::Int).unwrap_or(Value::Null)
}

/// Column values in `INSERT_COLUMNS` order.
fn bind_row(row: PolicyRow, created_at: &str) -> Vec<Value> {
    vec![
        Value::Text(row.id),
        Value::Text(row.title),
        Value::Text(row.category),
        text(row.description),
        text(row.content),
        text(row.deadline),
        text(row.start_date),
        text(row.end_date),
        text(row.application_url),
        text(row.contact_info),
        Value::Text(row.requirements),
        Value::Text(row.benefits),
        Value::Text(row.documents),
        Value::Text(row.region),
        text(row.target_age),
        int(row.age_min),
        int(row.age_max),
        text(row.target_education),
        Value::Text(row.tags),
        text(row.image_url),
        Value::Text(row.status),
        Value::BigInt(row.view_count),
        Value::Double(row.popularity_score),
        text(row.cached_at),
        text(row.updated_at),
        Value::Text(created_at.to_string()),
    ]
}

fn read_row(row: &Row<'_>) -> duckdb::Result<PolicyRow> {
    Ok(PolicyRow {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        deadline: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        application_url: row.get(8)?,
        contact_info: row.get(9)?,
        requirements: row.get(10)?,
        benefits: row.get(11)?,
        documents: row.get(12)?,
        region: row.get(13)?,
        target_age: row.get(14)?,
        age_min: row.get(15)?,
        age_max: row.get(16)?,
        target_education: row.get(17)?,
        tags: row.get(18)?,
        image_url: row.get(19)?,
        status: row.get(20)?,
        view_count: row.get(21)?,
        popularity_score: row.get(22)?,
        cached_at: row.get(23)?,
        updated_at: row.get(24)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use yuno_core::{AgeRange, Category, ContactInfo, ManualClock};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_at(clock: Arc<ManualClock>) -> DuckPolicyStore {
        DuckPolicyStore::open().unwrap().with_clock(clock)
    }

    fn policy(id: &str, title: &str) -> Policy {
        let mut p = Policy::new(id, title);
        p.cached_at = Some(t0());
        p
    }

    #[test]
    fn open_in_memory_creates_table() {
        let store = DuckPolicyStore::open().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn upsert_one_is_idempotent_and_restamps() {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = store_at(clock.clone());
        let mut p = policy("R1", "청년 월세 지원");
        p.category = Category::Housing;
        p.target_age = Some(AgeRange { min: 19, max: 34 });

        store.upsert_one(&p).unwrap();
        clock.advance(Duration::minutes(5));
        store.upsert_one(&p).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get_by_id("R1").unwrap().unwrap();
        let second_write = t0() + Duration::minutes(5);
        assert_eq!(stored.cached_at, Some(second_write));
        assert_eq!(stored.updated_at, Some(second_write));

        let mut expected = p.clone();
        expected.cached_at = Some(second_write);
        expected.updated_at = Some(second_write);
        assert_eq!(stored, expected);
    }

    #[test]
    fn upsert_overwrites_mutable_fields_but_keeps_popularity() {
        let store = DuckPolicyStore::open().unwrap();
        let mut p = policy("R1", "old title");
        p.popularity_score = 9.0;
        p.contact_info = Some(ContactInfo {
            department: Some("A과".into()),
            phone: None,
            email: None,
        });
        store.upsert_one(&p).unwrap();

        let mut changed = policy("R1", "new title");
        changed.popularity_score = 0.0;
        changed.tags = vec!["주거".into()];
        store.upsert_one(&changed).unwrap();

        let stored = store.get_by_id("R1").unwrap().unwrap();
        assert_eq!(stored.title, "new title");
        assert_eq!(stored.tags, vec!["주거"]);
        assert_eq!(stored.contact_info, None);
        assert_eq!(stored.popularity_score, 9.0);
    }

    #[test]
    fn batch_upsert_roundtrip() {
        let clock = Arc::new(ManualClock::new(t0() + Duration::hours(1)));
        let store = store_at(clock);
        let mut batch = Vec::new();
        for i in 0..5 {
            let mut p = policy(&format!("R{i}"), &format!("정책 {i}"));
            p.region = vec!["서울".into()];
            p.requirements = vec![format!("요건 {i}")];
            p.target_age = Some(AgeRange { min: 19, max: 30 + i });
            batch.push(p);
        }
        assert_eq!(store.upsert_batch(&batch).unwrap(), 5);

        let page = store.query_page(&PolicyQuery::new(1, 10)).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.policies.len(), 5);
        for stored in &page.policies {
            let input = batch.iter().find(|p| p.id == stored.id).unwrap();
            // cached_at comes from the element, updated_at from the clock.
            assert_eq!(stored.cached_at, Some(t0()));
            assert_eq!(stored.updated_at, Some(t0() + Duration::hours(1)));
            let mut expected = input.clone();
            expected.updated_at = stored.updated_at;
            assert_eq!(stored, &expected);
        }
    }

    #[test]
    fn batch_upsert_overwrites_existing_and_collapses_duplicates() {
        let store = DuckPolicyStore::open().unwrap();
        store.upsert_one(&policy("R1", "first")).unwrap();

        let batch = vec![
            policy("R1", "second"),
            policy("R2", "other"),
            policy("R1", "third"),
        ];
        assert_eq!(store.upsert_batch(&batch).unwrap(), 2);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_by_id("R1").unwrap().unwrap().title, "third");
    }

    #[test]
    fn empty_batch_is_noop() {
        let store = DuckPolicyStore::open().unwrap();
        assert_eq!(store.upsert_batch(&[]).unwrap(), 0);
    }

    #[test]
    fn get_by_id_missing() {
        let store = DuckPolicyStore::open().unwrap();
        assert!(store.get_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn page_order_popularity_then_updated() {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = store_at(clock.clone());

        let mut low = policy("low", "low");
        low.popularity_score = 1.0;
        let mut high = policy("high", "high");
        high.popularity_score = 5.0;
        store.upsert_one(&low).unwrap();
        store.upsert_one(&high).unwrap();

        let older = policy("older", "older");
        store.upsert_one(&older).unwrap();
        clock.advance(Duration::minutes(1));
        let newer = policy("newer", "newer");
        store.upsert_one(&newer).unwrap();

        let page = store.query_page(&PolicyQuery::new(1, 10)).unwrap();
        let ids: Vec<&str> = page.policies.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low", "newer", "older"]);
    }

    #[test]
    fn cached_page_orders_by_created_at() {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = store_at(clock.clone());
        store.upsert_one(&policy("a", "a")).unwrap();
        clock.advance(Duration::minutes(1));
        store.upsert_one(&policy("b", "b")).unwrap();
        // Touch "a" again: updated_at moves, created_at does not.
        clock.advance(Duration::minutes(1));
        store.upsert_one(&policy("a", "a")).unwrap();

        let updated: Vec<String> = store
            .query_page(&PolicyQuery::new(1, 10))
            .unwrap()
            .policies
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(updated, vec!["a", "b"]);

        let created: Vec<String> = store
            .query_cached_page(&PolicyQuery::new(1, 10))
            .unwrap()
            .policies
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(created, vec!["b", "a"]);
    }

    #[test]
    fn pagination_window_and_total() {
        let store = DuckPolicyStore::open().unwrap();
        let batch: Vec<Policy> = (0..7).map(|i| policy(&format!("R{i}"), "t")).collect();
        store.upsert_batch(&batch).unwrap();

        let page = store.query_page(&PolicyQuery::new(2, 3)).unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.policies.len(), 3);
        let page = store.query_page(&PolicyQuery::new(3, 3)).unwrap();
        assert_eq!(page.policies.len(), 1);
        let page = store.query_page(&PolicyQuery::new(4, 3)).unwrap();
        assert!(page.policies.is_empty());
        assert_eq!(page.total, 7);
    }

    #[test]
    fn filters_category_region_search() {
        let store = DuckPolicyStore::open().unwrap();
        let mut housing = policy("h", "청년 월세 지원");
        housing.category = Category::Housing;
        housing.region = vec!["서울".into(), "경기".into()];
        let mut startup = policy("s", "창업 지원금");
        startup.category = Category::Startup;
        startup.region = vec!["부산".into()];
        startup.description = Some("월세 보조 포함".into());
        let mut english = policy("e", "Global Youth Exchange");
        english.category = Category::Culture;
        store.upsert_batch(&[housing, startup, english]).unwrap();

        let ids = |q: PolicyQuery| -> Vec<String> {
            let mut ids: Vec<String> =
                store.query_page(&q).unwrap().policies.into_iter().map(|p| p.id).collect();
            ids.sort();
            ids
        };

        assert_eq!(ids(PolicyQuery::default().with_category(Category::Housing)), vec!["h"]);
        assert_eq!(ids(PolicyQuery::default().with_region("경기")), vec!["h"]);
        assert_eq!(ids(PolicyQuery::default().with_region("경")), Vec::<String>::new());
        assert_eq!(ids(PolicyQuery::default().with_search("월세")), vec!["h", "s"]);
        assert_eq!(ids(PolicyQuery::default().with_search("youth")), vec!["e"]);
        assert_eq!(
            ids(PolicyQuery::default()
                .with_search("월세")
                .with_category(Category::Startup)),
            vec!["s"]
        );
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let store = DuckPolicyStore::open().unwrap();
        store
            .upsert_batch(&[policy("a", "100% 지원"), policy("b", "1000 지원")])
            .unwrap();
        let page = store
            .query_page(&PolicyQuery::default().with_search("100%"))
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.policies[0].id, "a");
    }

    #[test]
    fn age_overlap_filter() {
        let store = DuckPolicyStore::open().unwrap();
        let mut young = policy("young", "t");
        young.target_age = Some(AgeRange { min: 19, max: 24 });
        let mut mid = policy("mid", "t");
        mid.target_age = Some(AgeRange { min: 25, max: 34 });
        let mut old = policy("old", "t");
        old.target_age = Some(AgeRange { min: 35, max: 39 });
        let open = policy("open", "t");
        store.upsert_batch(&[young, mid, old, open]).unwrap();

        let ids = |min: Option<u32>, max: Option<u32>| -> Vec<String> {
            let mut ids: Vec<String> = store
                .query_page(&PolicyQuery::new(1, 10).with_age(min, max))
                .unwrap()
                .policies
                .into_iter()
                .map(|p| p.id)
                .collect();
            ids.sort();
            ids
        };

        assert_eq!(ids(Some(24), Some(30)), vec!["mid", "open", "young"]);
        assert_eq!(ids(Some(35), None), vec!["old", "open"]);
        assert_eq!(ids(None, Some(20)), vec!["open", "young"]);
        // The cache-only listing ignores age bounds.
        let all = store
            .query_cached_page(&PolicyQuery::new(1, 10).with_age(Some(35), None))
            .unwrap();
        assert_eq!(all.total, 4);
    }

    #[test]
    fn inactive_rows_are_not_listed() {
        let store = DuckPolicyStore::open().unwrap();
        store.upsert_one(&policy("R1", "t")).unwrap();
        store
            .conn()
            .unwrap()
            .execute("UPDATE policies SET status = 'inactive' WHERE id = 'R1'", [])
            .unwrap();

        assert_eq!(store.query_page(&PolicyQuery::default()).unwrap().total, 0);
        assert_eq!(store.query_cached_page(&PolicyQuery::default()).unwrap().total, 0);
        assert!(store.get_by_id("R1").unwrap().is_some());
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("policies.duckdb");

        let store = DuckPolicyStore::open_persistent(&db_path).unwrap();
        store.upsert_one(&policy("R1", "persisted")).unwrap();
        drop(store);

        let store = DuckPolicyStore::open_persistent(&db_path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get_by_id("R1").unwrap().unwrap().title, "persisted");
    }

    #[tokio::test]
    async fn trait_object_dispatch() {
        let store: Arc<dyn PolicyCache> = Arc::new(DuckPolicyStore::open().unwrap());
        store.upsert_batch(&[policy("R1", "t")]).await.unwrap();
        let page = store.query_page(&PolicyQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(store.get_by_id("R1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_writers_share_the_connection() {
        let store = Arc::new(DuckPolicyStore::open().unwrap());
        let cache: Arc<dyn PolicyCache> = store.clone();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.upsert_one(&policy(&format!("R{i}"), "t")).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(store.count().unwrap(), 8);
        let page = cache.query_page(&PolicyQuery::new(1, 5)).await.unwrap();
        assert_eq!((page.policies.len(), page.total), (5, 8));
    }

    #[test]
    fn clones_see_the_same_rows() {
        let store = DuckPolicyStore::open().unwrap();
        let other = store.clone();
        other.upsert_one(&policy("R1", "shared")).unwrap();
        assert_eq!(store.get_by_id("R1").unwrap().unwrap().title, "shared");
    }
}
