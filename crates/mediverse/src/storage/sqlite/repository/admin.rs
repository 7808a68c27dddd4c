use async_trait::async_trait;
use mediverse_core::clinic::DashboardStats;
use mediverse_core::storage::{AdminRepository, Result};

use super::super::conversions::row_to_dashboard_stats;
use super::super::error::{map_tokio_rusqlite_error, wrap_err};
use super::super::schema;
use super::SqliteRepository;

#[async_trait]
impl AdminRepository for SqliteRepository {
    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.conn
            .call(|conn| {
                conn.query_row(schema::SELECT_DASHBOARD_STATS, [], row_to_dashboard_stats)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "DashboardStats"))
    }

    async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Database"))
    }
}
