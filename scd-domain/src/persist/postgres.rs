//! Postgres 记录存储（feature = "infra-sqlx"）
//!
//! 基于 sqlx 连接池的 `RecordStore` 实现。一次迁移在单个数据库
//! 事务内完成：过期更新按 `rows_affected == 1` 做预期校验，首次
//! 注册在事务内探测已有当前行，任一校验失败即整体回滚。
//!
//! 表名来自可信配置，不做转义处理。
//!
use crate::error::{ScdError, ScdResult};
use crate::persist::record_store::{RecordStore, Transition};
use crate::value_object::{NaturalKey, SurrogateId};
use crate::version_record::{Attributes, VersionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use uuid::Uuid;

const DEFAULT_TABLE: &str = "dimension_versions";

pub struct PgRecordStore {
    pool: PgPool,
    table: String,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_table(pool, DEFAULT_TABLE)
    }

    pub fn with_table(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// 建表与索引（幂等）
    pub async fn ensure_schema(&self) -> ScdResult<()> {
        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    surrogate_id    UUID PRIMARY KEY,
                    natural_key     TEXT NOT NULL,
                    attributes      JSONB NOT NULL,
                    valid_from      TIMESTAMPTZ NOT NULL,
                    valid_to        TIMESTAMPTZ,
                    is_current      BOOLEAN NOT NULL,
                    current_pointer UUID
                )",
                table = self.table
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_natural_key
                    ON {table} (natural_key, valid_from)",
                table = self.table
            ),
            // 结构性兜底：每个自然键至多一行当前版本
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_current
                    ON {table} (natural_key) WHERE is_current",
                table = self.table
            ),
        ];

        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    fn map_row(&self, row: &PgRow) -> ScdResult<VersionRecord> {
        let surrogate_id: Uuid = row.try_get("surrogate_id")?;
        let natural_key: String = row.try_get("natural_key")?;
        let attributes: Value = row.try_get("attributes")?;
        let attributes: Attributes = serde_json::from_value(attributes)?;
        let valid_from: DateTime<Utc> = row.try_get("valid_from")?;
        let valid_to: Option<DateTime<Utc>> = row.try_get("valid_to")?;
        let is_current: bool = row.try_get("is_current")?;
        let current_pointer: Option<Uuid> = row.try_get("current_pointer")?;

        Ok(VersionRecord::builder()
            .surrogate_id(SurrogateId::from_uuid(surrogate_id))
            .natural_key(NaturalKey::from(natural_key))
            .attributes(attributes)
            .valid_from(valid_from)
            .maybe_valid_to(valid_to)
            .is_current(is_current)
            .maybe_current_pointer(current_pointer.map(SurrogateId::from_uuid))
            .build())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_current(
        &self,
        natural_key: &NaturalKey,
    ) -> ScdResult<Option<VersionRecord>> {
        let sql = format!(
            "SELECT * FROM {} WHERE natural_key = $1 AND is_current",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(natural_key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(|r| self.map_row(r)).transpose()
    }

    async fn find_as_of(
        &self,
        natural_key: &NaturalKey,
        at: DateTime<Utc>,
    ) -> ScdResult<Option<VersionRecord>> {
        let sql = format!(
            "SELECT * FROM {}
             WHERE natural_key = $1
               AND valid_from <= $2
               AND (valid_to IS NULL OR valid_to > $2)",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(natural_key.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(|r| self.map_row(r)).transpose()
    }

    async fn find_history(&self, natural_key: &NaturalKey) -> ScdResult<Vec<VersionRecord>> {
        let sql = format!(
            "SELECT * FROM {} WHERE natural_key = $1 ORDER BY valid_from ASC",
            self.table
        );
        let rows = sqlx::query(&sql)
            .bind(natural_key.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|r| self.map_row(r)).collect()
    }

    async fn find_by_surrogate(
        &self,
        surrogate_id: &SurrogateId,
    ) -> ScdResult<Option<VersionRecord>> {
        let sql = format!("SELECT * FROM {} WHERE surrogate_id = $1", self.table);
        let row = sqlx::query(&sql)
            .bind(surrogate_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(|r| self.map_row(r)).transpose()
    }

    async fn apply_transition(&self, transition: Transition) -> ScdResult<()> {
        let mut tx = self.pool.begin().await?;

        match transition.expire() {
            Some(expiry) => {
                let sql = format!(
                    "UPDATE {} SET valid_to = $1, is_current = FALSE
                     WHERE surrogate_id = $2 AND is_current",
                    self.table
                );
                let updated = sqlx::query(&sql)
                    .bind(expiry.valid_to())
                    .bind(expiry.surrogate_id().as_uuid())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                if updated != 1 {
                    tx.rollback().await?;
                    return Err(ScdError::ConcurrentModification {
                        natural_key: transition.natural_key().clone(),
                        reason: format!(
                            "expected current version {} was superseded",
                            expiry.surrogate_id()
                        ),
                    });
                }
            }
            None => {
                let sql = format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE natural_key = $1 AND is_current)",
                    self.table
                );
                let exists: bool = sqlx::query_scalar(&sql)
                    .bind(transition.natural_key().as_str())
                    .fetch_one(&mut *tx)
                    .await?;

                if exists {
                    tx.rollback().await?;
                    return Err(ScdError::ConcurrentModification {
                        natural_key: transition.natural_key().clone(),
                        reason: "natural key already registered".to_string(),
                    });
                }
            }
        }

        let record = transition.insert();
        let sql = format!(
            "INSERT INTO {}
                (surrogate_id, natural_key, attributes, valid_from, valid_to,
                 is_current, current_pointer)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            self.table
        );
        sqlx::query(&sql)
            .bind(record.surrogate_id().as_uuid())
            .bind(record.natural_key().as_str())
            .bind(serde_json::to_value(record.attributes())?)
            .bind(record.valid_from())
            .bind(record.valid_to())
            .bind(record.is_current())
            .bind(record.current_pointer().map(|p| *p.as_uuid()))
            .execute(&mut *tx)
            .await?;

        if let Some(pointer) = transition.repoint_to() {
            let sql = format!(
                "UPDATE {} SET current_pointer = $1 WHERE natural_key = $2",
                self.table
            );
            sqlx::query(&sql)
                .bind(pointer.as_uuid())
                .bind(transition.natural_key().as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
