pub mod repository;
pub mod rest;
pub mod sql;
pub mod synthetic;

pub use repository::DataRepository;
pub use rest::RestProvider;
pub use sql::SqlProvider;
pub use synthetic::SyntheticProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from the data source backends. Surfaced to the caller as-is;
/// there is no retry and no fallback between backends.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("data service unreachable: {0}")]
    Unreachable(String),

    #[error("data service returned a bad response: {0}")]
    BadResponse(String),

    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("database query failed: {0}")]
    QueryFailed(String),
}

/// One record of the uniform tabular result, identical in shape across all
/// three backends. `profit` is derived (`revenue - cost`) at the source
/// boundary and never recomputed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub system: String,
    pub team: String,
    pub owner: String,
    pub status: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// An ordered, capped sequence of rows. Not mutated after creation except
/// through the consuming helpers below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Narrow the set to a single team's rows.
    pub fn scoped_to_team(mut self, team: &str) -> Self {
        self.rows.retain(|row| row.team == team);
        self
    }
}

/// Per-request filter and shape description. Doubles as the cache key
/// source, so its serialized form must be stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub products: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub systems: Option<Vec<String>>,
    pub teams: Option<Vec<String>>,
    pub min_profit: Option<f64>,
    pub owner: Option<String>,
    pub limit: Option<usize>,
}

impl QueryParams {
    /// Stable cache key: struct fields serialize in declaration order, so
    /// identical params always produce identical JSON and thus the same
    /// digest.
    pub fn cache_key(&self) -> String {
        let canonical =
            serde_json::to_string(self).expect("query parameters serialize to JSON");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("rowset:v1:{:x}", hasher.finalize())
    }

    /// Whether a row passes every configured filter. Empty filter lists
    /// mean "no filter", matching how absent query parameters behave.
    pub fn matches(&self, row: &Row) -> bool {
        if let Some(start) = self.start_date {
            if row.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if row.date > end {
                return false;
            }
        }
        if !list_allows(&self.products, &row.product)
            || !list_allows(&self.regions, &row.region)
            || !list_allows(&self.systems, &row.system)
            || !list_allows(&self.teams, &row.team)
        {
            return false;
        }
        if let Some(owner) = &self.owner {
            let needle = owner.trim().to_lowercase();
            if !needle.is_empty() && !row.owner.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(min_profit) = self.min_profit {
            if row.profit < min_profit {
                return false;
            }
        }
        true
    }

    /// Query-string form used when pushing filters to the REST backend.
    /// Lists are comma-joined; unset fields are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date {
            pairs.push(("start_date", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date", end.to_string()));
        }
        push_list(&mut pairs, "products", &self.products);
        push_list(&mut pairs, "regions", &self.regions);
        push_list(&mut pairs, "systems", &self.systems);
        push_list(&mut pairs, "teams", &self.teams);
        if let Some(min_profit) = self.min_profit {
            pairs.push(("min_profit", min_profit.to_string()));
        }
        if let Some(owner) = &self.owner {
            pairs.push(("owner", owner.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

fn list_allows(filter: &Option<Vec<String>>, value: &str) -> bool {
    match filter {
        Some(allowed) if !allowed.is_empty() => allowed.iter().any(|v| v == value),
        _ => true,
    }
}

fn push_list(
    pairs: &mut Vec<(&'static str, String)>,
    key: &'static str,
    values: &Option<Vec<String>>,
) {
    if let Some(values) = values {
        if !values.is_empty() {
            pairs.push((key, values.join(",")));
        }
    }
}

/// Capability shared by the three backends: given query parameters,
/// produce rows or fail with a `DataSourceError`.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn load(&self, params: &QueryParams) -> Result<Vec<Row>, DataSourceError>;

    /// Short backend name used in logs and response metadata.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) fn test_row(team: &str, owner: &str, status: &str, profit: f64) -> Row {
    Row {
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        product: "Alpha".to_string(),
        region: "APAC".to_string(),
        system: "Payments".to_string(),
        team: team.to_string(),
        owner: owner.to_string(),
        status: status.to_string(),
        revenue: profit + 60.0,
        cost: 60.0,
        profit,
    }
}
