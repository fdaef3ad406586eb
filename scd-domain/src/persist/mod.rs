//! 持久化（persist）
//!
//! 定义记录存储协议与其内置实现：
//! - 读写接口与原子迁移计划（`RecordStore`/`Transition`）；
//! - 进程内实现（`InMemoryRecordStore`）；
//! - Postgres 实现（`PgRecordStore`，feature = "infra-sqlx"）。
//!
//! 该模块聚焦协议与校验逻辑，其他存储后端由上层提供实现并注入。
//!
mod memory;
#[cfg(feature = "infra-sqlx")]
mod postgres;
mod record_store;

pub use memory::InMemoryRecordStore;
#[cfg(feature = "infra-sqlx")]
pub use postgres::PgRecordStore;
pub use record_store::{Expiry, RecordStore, RecordStoreExt, Transition};
