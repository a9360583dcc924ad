use axum::extract::{Extension, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{Identity, Role};
use crate::datasource::{QueryParams, RowSet};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Query-string form of the filter parameters. List filters are
/// comma-separated, e.g. `products=Alpha,Beta`.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub products: Option<String>,
    pub regions: Option<String>,
    pub systems: Option<String>,
    pub teams: Option<String>,
    pub min_profit: Option<f64>,
    pub owner: Option<String>,
    pub limit: Option<usize>,
}

impl DataQuery {
    fn into_params(self) -> QueryParams {
        QueryParams {
            start_date: self.start_date,
            end_date: self.end_date,
            products: split_list(self.products),
            regions: split_list(self.regions),
            systems: split_list(self.systems),
            teams: split_list(self.teams),
            min_profit: self.min_profit,
            owner: self.owner.filter(|o| !o.trim().is_empty()),
            limit: self.limit,
        }
    }
}

fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Developers with a team claim only see their own team's rows; other
/// roles see everything.
fn scope_for_identity(rows: RowSet, identity: &Identity) -> RowSet {
    match (identity.role, identity.team.as_deref()) {
        (Role::Developer, Some(team)) => rows.scoped_to_team(team),
        _ => rows,
    }
}

/// GET /api/data - the filtered, capped row set
pub async fn data_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Value> {
    let params = query.into_params();
    let rows = state.data.get_or_fetch(&params).await?;
    let rows = scope_for_identity(rows, &identity);

    Ok(ApiResponse::success(json!({
        "rows": rows.rows,
        "row_count": rows.len(),
        "source": state.data.source_name(),
    })))
}

/// GET /api/summary - KPI aggregates over the same row set
pub async fn summary_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Value> {
    let params = query.into_params();
    let rows = state.data.get_or_fetch(&params).await?;
    let rows = scope_for_identity(rows, &identity);

    Ok(ApiResponse::success(summarize(&rows)))
}

fn summarize(rows: &RowSet) -> Value {
    let mut revenue = 0.0;
    let mut cost = 0.0;
    let mut red_count = 0usize;
    for row in &rows.rows {
        revenue += row.revenue;
        cost += row.cost;
        if row.status == "Red" {
            red_count += 1;
        }
    }

    json!({
        "revenue": revenue,
        "cost": cost,
        "profit": revenue - cost,
        "red_count": red_count,
        "row_count": rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::test_row;

    fn identity(role: Role, team: Option<&str>) -> Identity {
        Identity {
            subject: "u@corp".to_string(),
            name: None,
            role,
            team: team.map(str::to_string),
            expiry: 0,
        }
    }

    fn mixed_rows() -> RowSet {
        RowSet::new(vec![
            test_row("Platform", "alice", "Green", 100.0),
            test_row("Platform", "bob", "Red", -10.0),
            test_row("Retail", "carol", "Amber", 50.0),
        ])
    }

    #[test]
    fn comma_lists_split_and_blank_entries_drop() {
        let query = DataQuery {
            products: Some("Alpha, Beta,,".to_string()),
            owner: Some("   ".to_string()),
            ..Default::default()
        };
        let params = query.into_params();
        assert_eq!(
            params.products,
            Some(vec!["Alpha".to_string(), "Beta".to_string()])
        );
        assert!(params.owner.is_none());
    }

    #[test]
    fn developer_with_team_is_scoped() {
        let scoped = scope_for_identity(mixed_rows(), &identity(Role::Developer, Some("Platform")));
        assert_eq!(scoped.len(), 2);
        assert!(scoped.rows.iter().all(|r| r.team == "Platform"));
    }

    #[test]
    fn other_roles_see_everything() {
        assert_eq!(
            scope_for_identity(mixed_rows(), &identity(Role::Cio, Some("Platform"))).len(),
            3
        );
        assert_eq!(
            scope_for_identity(mixed_rows(), &identity(Role::Developer, None)).len(),
            3
        );
    }

    #[test]
    fn summary_totals_add_up() {
        let summary = summarize(&mixed_rows());
        assert_eq!(summary["row_count"], 3);
        assert_eq!(summary["red_count"], 1);
        let revenue = summary["revenue"].as_f64().unwrap();
        let cost = summary["cost"].as_f64().unwrap();
        let profit = summary["profit"].as_f64().unwrap();
        assert!((profit - (revenue - cost)).abs() < 1e-9);
        assert!((profit - 140.0).abs() < 1e-9);
    }
}
