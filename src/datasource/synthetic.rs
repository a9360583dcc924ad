use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Settings;

use super::{DataProvider, DataSourceError, QueryParams, Row};

const PRODUCTS: &[&str] = &["Alpha", "Beta", "Gamma", "Delta"];
const REGIONS: &[&str] = &["APAC", "EMEA", "AMER", "India"];
const SYSTEMS: &[&str] = &[
    "Payments",
    "CoreBanking",
    "DataLake",
    "API-Gateway",
    "Mobile",
    "Web",
];
const TEAMS: &[&str] = &["Platform", "Retail", "Corporate", "Data", "Integration"];
const OWNERS: &[&str] = &["alice", "bob", "carol", "dave", "erin"];

const DEFAULT_SEED: u64 = 42;
const HISTORY_DAYS: i64 = 90;

/// Deterministic seeded generator, used as the default backend and for
/// offline development. Same seed and same day produce identical rows.
pub struct SyntheticProvider {
    rows: usize,
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(settings: &Settings) -> Self {
        Self::with_seed(settings.max_rows, DEFAULT_SEED)
    }

    pub fn with_seed(rows: usize, seed: u64) -> Self {
        Self { rows, seed }
    }

    fn generate(&self) -> Vec<Row> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let today = Utc::now().date_naive();
        let days: Vec<NaiveDate> = (0..=HISTORY_DAYS)
            .map(|back| today - Duration::days(HISTORY_DAYS - back))
            .collect();

        (0..self.rows)
            .map(|_| {
                let revenue: f64 = rng.random_range(25_000.0..175_000.0);
                let cost: f64 = rng.random_range(15_000.0..105_000.0);
                Row {
                    date: days[rng.random_range(0..days.len())],
                    product: pick(&mut rng, PRODUCTS),
                    region: pick(&mut rng, REGIONS),
                    system: pick(&mut rng, SYSTEMS),
                    team: pick(&mut rng, TEAMS),
                    owner: pick(&mut rng, OWNERS),
                    status: status(&mut rng),
                    revenue,
                    cost,
                    profit: revenue - cost,
                }
            })
            .collect()
    }
}

fn pick(rng: &mut StdRng, values: &[&str]) -> String {
    values[rng.random_range(0..values.len())].to_string()
}

/// Statuses are weighted 70/20/10 Green/Amber/Red.
fn status(rng: &mut StdRng) -> String {
    let roll: f64 = rng.random();
    if roll < 0.7 {
        "Green"
    } else if roll < 0.9 {
        "Amber"
    } else {
        "Red"
    }
    .to_string()
}

#[async_trait]
impl DataProvider for SyntheticProvider {
    async fn load(&self, _params: &QueryParams) -> Result<Vec<Row>, DataSourceError> {
        // The full set is generated before any filtering so repeated calls
        // with different filters draw from the same underlying data.
        Ok(self.generate())
    }

    fn name(&self) -> &'static str {
        "SYNTHETIC"
    }
}
