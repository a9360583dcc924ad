use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{DataProvider, DataSourceError, QueryParams, Row};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches rows from a REST metrics endpoint and normalizes them to the
/// uniform row shape.
pub struct RestProvider {
    client: Client,
    base_url: Url,
}

/// Wire shape of one upstream record. `profit` is derived locally.
#[derive(Debug, Deserialize)]
struct ApiRow {
    date: NaiveDate,
    product: String,
    region: String,
    system: String,
    team: String,
    owner: String,
    status: String,
    revenue: f64,
    cost: f64,
}

impl From<ApiRow> for Row {
    fn from(api: ApiRow) -> Self {
        Row {
            profit: api.revenue - api.cost,
            date: api.date,
            product: api.product,
            region: api.region,
            system: api.system,
            team: api.team,
            owner: api.owner,
            status: api.status,
            revenue: api.revenue,
            cost: api.cost,
        }
    }
}

impl RestProvider {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, base_url })
    }

    fn metrics_url(&self) -> String {
        format!("{}/metrics", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl DataProvider for RestProvider {
    async fn load(&self, params: &QueryParams) -> Result<Vec<Row>, DataSourceError> {
        let response = self
            .client
            .get(self.metrics_url())
            .query(&params.to_query_pairs())
            .send()
            .await
            .map_err(|e| DataSourceError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::BadResponse(format!(
                "unexpected status {status}"
            )));
        }

        let rows: Vec<ApiRow> = response
            .json()
            .await
            .map_err(|e| DataSourceError::BadResponse(e.to_string()))?;

        Ok(rows.into_iter().map(Row::from).collect())
    }

    fn name(&self) -> &'static str {
        "REST"
    }
}
