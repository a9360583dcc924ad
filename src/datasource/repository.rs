use std::sync::Arc;

use anyhow::Context;

use crate::config::{DataSourceKind, Settings};

use super::{
    DataProvider, DataSourceError, QueryParams, RestProvider, Row, RowSet, SqlProvider,
    SyntheticProvider,
};

/// Single abstraction point over the three backends.
///
/// The provider is selected once at startup from `DATA_SOURCE`; requests
/// never re-check the configuration, and a backend failure surfaces to the
/// caller as-is with no fallback.
pub struct DataRepository {
    provider: Arc<dyn DataProvider>,
    max_rows: usize,
}

impl DataRepository {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider: Arc<dyn DataProvider> = match settings.data_source {
            DataSourceKind::Synthetic => Arc::new(SyntheticProvider::new(settings)),
            DataSourceKind::Rest => {
                let base_url = settings
                    .api_base_url
                    .clone()
                    .context("API_BASE_URL is required for the REST data source")?;
                Arc::new(RestProvider::new(base_url)?)
            }
            DataSourceKind::Sql => Arc::new(SqlProvider::new(settings)?),
        };
        Ok(Self::with_provider(provider, settings.max_rows))
    }

    pub fn with_provider(provider: Arc<dyn DataProvider>, max_rows: usize) -> Self {
        Self { provider, max_rows }
    }

    pub fn source_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch rows through the configured backend, apply the filters
    /// uniformly, and cap the result.
    ///
    /// Backends push filters to the remote side where they can (SQL
    /// predicates, REST query string); the local pass keeps the result
    /// identical regardless of how much the backend honored.
    pub async fn fetch(&self, params: &QueryParams) -> Result<RowSet, DataSourceError> {
        let loaded = self.provider.load(params).await?;
        let cap = params.limit.map_or(self.max_rows, |l| l.min(self.max_rows));
        let rows: Vec<Row> = loaded
            .into_iter()
            .filter(|row| params.matches(row))
            .take(cap)
            .collect();

        tracing::debug!(
            source = self.provider.name(),
            rows = rows.len(),
            "fetched row set"
        );
        Ok(RowSet::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::test_row;
    use async_trait::async_trait;

    struct FakeProvider {
        rows: Vec<Row>,
    }

    #[async_trait]
    impl DataProvider for FakeProvider {
        async fn load(&self, _params: &QueryParams) -> Result<Vec<Row>, DataSourceError> {
            Ok(self.rows.clone())
        }

        fn name(&self) -> &'static str {
            "FAKE"
        }
    }

    fn repo_with_rows(rows: Vec<Row>, max_rows: usize) -> DataRepository {
        DataRepository::with_provider(Arc::new(FakeProvider { rows }), max_rows)
    }

    #[tokio::test]
    async fn result_is_capped_at_max_rows() {
        let rows = vec![test_row("Platform", "alice", "Green", 10.0); 200];
        let repo = repo_with_rows(rows, 50);

        let set = repo.fetch(&QueryParams::default()).await.unwrap();
        assert_eq!(set.len(), 50);
    }

    #[tokio::test]
    async fn request_limit_tightens_the_cap_but_never_raises_it() {
        let rows = vec![test_row("Platform", "alice", "Green", 10.0); 200];
        let repo = repo_with_rows(rows, 50);

        let set = repo
            .fetch(&QueryParams {
                limit: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(set.len(), 5);

        let set = repo
            .fetch(&QueryParams {
                limit: Some(500),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(set.len(), 50);
    }

    #[tokio::test]
    async fn filters_are_applied_locally() {
        let rows = vec![
            test_row("Platform", "alice", "Green", 10.0),
            test_row("Retail", "bob", "Red", -5.0),
        ];
        let repo = repo_with_rows(rows, 100);

        let set = repo
            .fetch(&QueryParams {
                teams: Some(vec!["Retail".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows[0].owner, "bob");
    }

    #[tokio::test]
    async fn synthetic_dispatch_is_deterministic_end_to_end() {
        let settings = {
            let mut env = std::collections::HashMap::new();
            env.insert("MAX_ROWS".to_string(), "10".to_string());
            Settings::resolve(std::path::Path::new("/nonexistent"), &env).unwrap()
        };
        let repo = DataRepository::from_settings(&settings).unwrap();
        assert_eq!(repo.source_name(), "SYNTHETIC");

        let first = repo.fetch(&QueryParams::default()).await.unwrap();
        let second = repo.fetch(&QueryParams::default()).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
    }
}
