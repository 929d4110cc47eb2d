//! MySQL backend over sqlx. Candidate reads use `FOR UPDATE SKIP LOCKED`, so
//! overlapping passes never wait on each other's rows.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use tracing::info;

use crate::error::StoreError;
use crate::model::{ChairId, Ride, RideId, RideProgress};
use crate::spatial::Coordinate;

use super::{ChairQuery, DispatchStore, DispatchTx, LockedChair};

const PENDING_RIDES_SQL: &str = r#"
    SELECT id, pickup_latitude, pickup_longitude, destination_latitude, destination_longitude, created_at
    FROM rides
    WHERE chair_id IS NULL
    ORDER BY created_at, id
    LIMIT ?
    FOR UPDATE SKIP LOCKED
"#;

const AVAILABLE_CHAIRS_SQL: &str = r#"
    SELECT c.id, loc.latitude, loc.longitude, m.speed
    FROM chairs c
    INNER JOIN (
        SELECT chair_id, latitude, longitude,
               ROW_NUMBER() OVER (PARTITION BY chair_id ORDER BY created_at DESC, id DESC) AS rn
        FROM chair_locations
    ) loc ON loc.chair_id = c.id AND loc.rn = 1
    LEFT JOIN chair_models m ON m.name = c.model
    WHERE c.is_active = TRUE
      AND NOT EXISTS (
          SELECT 1
          FROM rides r
          WHERE r.chair_id = c.id
            AND (SELECT COUNT(rs.chair_sent_at) FROM ride_statuses rs WHERE rs.ride_id = r.id) < ?
      )
    ORDER BY c.id
    LIMIT ?
    FOR UPDATE OF c SKIP LOCKED
"#;

const ASSIGN_SQL: &str = r#"
    UPDATE rides SET chair_id = ?, updated_at = ? WHERE id = ? AND chair_id IS NULL
"#;

#[derive(sqlx::FromRow)]
struct RideRow {
    id: String,
    pickup_latitude: i32,
    pickup_longitude: i32,
    destination_latitude: i32,
    destination_longitude: i32,
    created_at: DateTime<Utc>,
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Ride {
            id: RideId(row.id),
            pickup: Coordinate::new(row.pickup_latitude, row.pickup_longitude),
            destination: Coordinate::new(row.destination_latitude, row.destination_longitude),
            created_at: row.created_at,
            chair_id: None,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChairRow {
    id: String,
    latitude: i32,
    longitude: i32,
    speed: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    ride_id: String,
    chair_id: String,
    delivered_events: i64,
}

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await?;
        info!(max_connections, "connected to dispatch database");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DispatchStore for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn DispatchTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlTx { tx }))
    }
}

pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl DispatchTx for MySqlTx {
    async fn lock_pending_rides(&mut self, limit: usize) -> Result<Vec<Ride>, StoreError> {
        let rows: Vec<RideRow> = sqlx::query_as(PENDING_RIDES_SQL)
            .bind(limit as u64)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(Ride::from).collect())
    }

    async fn lock_available_chairs(
        &mut self,
        query: ChairQuery,
    ) -> Result<Vec<LockedChair>, StoreError> {
        let limit = query.limit.map_or(u64::MAX, |limit| limit as u64);
        let rows: Vec<ChairRow> = sqlx::query_as(AVAILABLE_CHAIRS_SQL)
            .bind(query.completion_threshold)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| LockedChair {
                id: ChairId(row.id),
                location: Coordinate::new(row.latitude, row.longitude),
                speed: row.speed,
            })
            .collect())
    }

    async fn ride_progress(
        &mut self,
        chair_ids: &[ChairId],
    ) -> Result<Vec<RideProgress>, StoreError> {
        if chair_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<MySql>::new(
            "SELECT r.id AS ride_id, r.chair_id AS chair_id, COUNT(rs.chair_sent_at) AS delivered_events \
             FROM rides r LEFT JOIN ride_statuses rs ON rs.ride_id = r.id \
             WHERE r.chair_id IN (",
        );
        let mut ids = query.separated(", ");
        for chair_id in chair_ids {
            ids.push_bind(chair_id.as_str());
        }
        ids.push_unseparated(") GROUP BY r.id, r.chair_id");

        let rows: Vec<ProgressRow> = query.build_query_as().fetch_all(&mut *self.tx).await?;
        Ok(rows
            .into_iter()
            .map(|row| RideProgress {
                ride_id: RideId(row.ride_id),
                chair_id: ChairId(row.chair_id),
                delivered_events: u32::try_from(row.delivered_events).unwrap_or(u32::MAX),
            })
            .collect())
    }

    async fn assign_chair(
        &mut self,
        ride_id: &RideId,
        chair_id: &ChairId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(ASSIGN_SQL)
            .bind(chair_id.as_str())
            .bind(Utc::now())
            .bind(ride_id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
