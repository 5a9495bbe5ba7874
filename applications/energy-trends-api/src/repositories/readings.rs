use crate::db::{DbPool, RetryPolicy};
use crate::error::{AppError, Result};
use crate::trends::{Sample, TimeRange};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::future::Future;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::debug;

/// Source of meter readings, queried by closed time range.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Readings in `[start, end]`, ascending by timestamp.
    async fn fetch_samples(&self, range: TimeRange) -> Result<Vec<Sample>>;

    /// Unprocessed rows as `"<time>, <irms1>, <irms2>, <irms3>"` lines.
    async fn fetch_raw_rows(&self, range: TimeRange) -> Result<Vec<String>>;

    async fn ping(&self) -> Result<()>;
}

pub fn format_raw_row(sample: &Sample) -> String {
    format!(
        "{}, {}, {}, {}",
        sample.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        sample.irms[0],
        sample.irms[1],
        sample.irms[2]
    )
}

struct ReadingRow(Sample);

impl<'r> FromRow<'r, PgRow> for ReadingRow {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let time: DateTime<Utc> = row.try_get("time")?;
        Ok(Self(Sample::new(
            time,
            row.try_get("irms1")?,
            row.try_get("irms2")?,
            row.try_get("irms3")?,
        )))
    }
}

const SELECT_RANGE: &str = r#"
    SELECT
        time,
        CAST(COALESCE(irms1, 0) AS DOUBLE PRECISION) AS irms1,
        CAST(COALESCE(irms2, 0) AS DOUBLE PRECISION) AS irms2,
        CAST(COALESCE(irms3, 0) AS DOUBLE PRECISION) AS irms3
    FROM readings
    WHERE time >= $1 AND time <= $2
    ORDER BY time ASC
"#;

#[derive(Clone)]
pub struct PgReadingRepository {
    pool: DbPool,
    retry: RetryPolicy,
    fetch_timeout: Duration,
}

impl PgReadingRepository {
    pub fn new(pool: DbPool, retry: RetryPolicy, fetch_timeout: Duration) -> Self {
        Self {
            pool,
            retry,
            fetch_timeout,
        }
    }

    async fn bounded<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.fetch_timeout, self.retry.run(operation, f)).await {
            Ok(result) => result.map_err(AppError::Db),
            Err(_) => Err(AppError::Upstream(format!(
                "{} timed out after {:?}",
                operation, self.fetch_timeout
            ))),
        }
    }
}

#[async_trait]
impl SampleStore for PgReadingRepository {
    async fn fetch_samples(&self, range: TimeRange) -> Result<Vec<Sample>> {
        let rows = self
            .bounded("fetch_samples", || {
                sqlx::query_as::<_, ReadingRow>(SELECT_RANGE)
                    .bind(range.start)
                    .bind(range.end)
                    .fetch_all(&self.pool)
            })
            .await?;

        debug!(count = rows.len(), start = %range.start, end = %range.end, "fetched readings");
        Ok(rows.into_iter().map(|ReadingRow(sample)| sample).collect())
    }

    async fn fetch_raw_rows(&self, range: TimeRange) -> Result<Vec<String>> {
        self.bounded("fetch_raw_rows", || async move {
            let mut stream = sqlx::query_as::<_, ReadingRow>(SELECT_RANGE)
                .bind(range.start)
                .bind(range.end)
                .fetch(&self.pool);

            let mut lines = Vec::new();
            while let Some(row) = stream.next().await {
                let ReadingRow(sample) = row?;
                lines.push(format_raw_row(&sample));
            }
            Ok::<_, sqlx::Error>(lines)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.bounded("ping", || sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}
