//! 领域层统一错误定义
//!
//! 聚焦版本迁移校验、并发冲突与存储故障的最小必要集合，
//! 便于在各存储实现层统一转换为 `ScdError`。
//!
use crate::value_object::NaturalKey;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScdError {
    // --- 版本迁移校验 ---
    #[error(
        "out-of-order effective date: natural_key={natural_key}, effective={effective}, current_valid_from={current_valid_from}"
    )]
    OutOfOrderEffectiveDate {
        natural_key: NaturalKey,
        effective: DateTime<Utc>,
        current_valid_from: DateTime<Utc>,
    },
    #[error("unknown natural key: {natural_key}")]
    UnknownNaturalKey { natural_key: NaturalKey },

    // --- 并发与存储 ---
    #[error("concurrent modification: natural_key={natural_key}, reason={reason}")]
    ConcurrentModification {
        natural_key: NaturalKey,
        reason: String,
    },
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type ScdResult<T> = Result<T, ScdError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 错误转换为 ScdError

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for ScdError {
    fn from(err: sqlx::Error) -> Self {
        ScdError::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}
