use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};

use crate::config::Settings;

use super::{DataProvider, DataSourceError, QueryParams, Row};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads rows from the `analytics_facts` table behind `DB_URL`.
///
/// The pool connects lazily; the first request pays the connection cost and
/// surfaces `ConnectionFailed` if the database is unavailable.
pub struct SqlProvider {
    pool: PgPool,
    max_rows: usize,
}

impl SqlProvider {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_url = settings
            .db_url
            .as_deref()
            .context("DB_URL is required for the SQL data source")?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(db_url)?;
        Ok(Self {
            pool,
            max_rows: settings.max_rows,
        })
    }
}

/// Parameterized query reflecting the filters; every value is bound, never
/// interpolated.
fn build_query(params: &QueryParams, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT CAST(date AS DATE) AS date, product, region, system, team, owner, status, \
         revenue::float8 AS revenue, cost::float8 AS cost, \
         (revenue - cost)::float8 AS profit \
         FROM analytics_facts WHERE 1=1",
    );

    if let Some(start) = params.start_date {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = params.end_date {
        qb.push(" AND date <= ").push_bind(end);
    }
    push_any(&mut qb, "product", &params.products);
    push_any(&mut qb, "region", &params.regions);
    push_any(&mut qb, "system", &params.systems);
    push_any(&mut qb, "team", &params.teams);
    if let Some(owner) = &params.owner {
        let needle = owner.trim();
        if !needle.is_empty() {
            qb.push(" AND owner ILIKE ").push_bind(format!("%{needle}%"));
        }
    }
    if let Some(min_profit) = params.min_profit {
        qb.push(" AND (revenue - cost) >= ").push_bind(min_profit);
    }

    qb.push(" ORDER BY date");
    qb.push(" LIMIT ").push_bind(limit);
    qb
}

fn push_any(qb: &mut QueryBuilder<'static, Postgres>, column: &str, values: &Option<Vec<String>>) {
    if let Some(values) = values {
        if !values.is_empty() {
            qb.push(format!(" AND {column} = ANY("))
                .push_bind(values.clone())
                .push(")");
        }
    }
}

fn classify(err: sqlx::Error) -> DataSourceError {
    let connection_level = matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_)
    );
    if connection_level {
        DataSourceError::ConnectionFailed(err.to_string())
    } else {
        DataSourceError::QueryFailed(err.to_string())
    }
}

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    Ok(Row {
        date: row.try_get("date")?,
        product: row.try_get("product")?,
        region: row.try_get("region")?,
        system: row.try_get("system")?,
        team: row.try_get("team")?,
        owner: row.try_get("owner")?,
        status: row.try_get("status")?,
        revenue: row.try_get("revenue")?,
        cost: row.try_get("cost")?,
        profit: row.try_get("profit")?,
    })
}

#[async_trait]
impl DataProvider for SqlProvider {
    async fn load(&self, params: &QueryParams) -> Result<Vec<Row>, DataSourceError> {
        let limit = params.limit.map_or(self.max_rows, |l| l.min(self.max_rows));
        let mut qb = build_query(params, limit as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        rows.iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataSourceError::QueryFailed(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "SQL"
    }
}
