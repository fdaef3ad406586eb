//! 内存记录存储
//!
//! `RecordStore` 的进程内实现：按自然键分组持有全部版本行。
//! 一次迁移的预期校验与三项写效果在同一把锁内完成，天然满足
//! 原子性契约。适用于测试与示例，也可作为自定义存储实现的参照。
//!
use crate::error::{ScdError, ScdResult};
use crate::persist::record_store::{RecordStore, Transition};
use crate::value_object::{NaturalKey, SurrogateId};
use crate::version_record::VersionRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Rows = HashMap<NaturalKey, Vec<VersionRecord>>;

#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    rows: Arc<Mutex<Rows>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ScdResult<MutexGuard<'_, Rows>> {
        self.rows.lock().map_err(|_| ScdError::StoreUnavailable {
            reason: "in-memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_current(
        &self,
        natural_key: &NaturalKey,
    ) -> ScdResult<Option<VersionRecord>> {
        let rows = self.lock()?;
        Ok(rows
            .get(natural_key)
            .and_then(|versions| versions.iter().find(|v| v.is_current()).cloned()))
    }

    async fn find_as_of(
        &self,
        natural_key: &NaturalKey,
        at: DateTime<Utc>,
    ) -> ScdResult<Option<VersionRecord>> {
        let rows = self.lock()?;
        Ok(rows
            .get(natural_key)
            .and_then(|versions| versions.iter().find(|v| v.covers(at)).cloned()))
    }

    async fn find_history(&self, natural_key: &NaturalKey) -> ScdResult<Vec<VersionRecord>> {
        let rows = self.lock()?;
        let mut history = rows.get(natural_key).cloned().unwrap_or_default();
        history.sort_by_key(|v| v.valid_from());
        Ok(history)
    }

    async fn find_by_surrogate(
        &self,
        surrogate_id: &SurrogateId,
    ) -> ScdResult<Option<VersionRecord>> {
        let rows = self.lock()?;
        Ok(rows
            .values()
            .flatten()
            .find(|v| v.surrogate_id() == *surrogate_id)
            .cloned())
    }

    async fn apply_transition(&self, transition: Transition) -> ScdResult<()> {
        let mut rows = self.lock()?;
        let versions = rows.entry(transition.natural_key().clone()).or_default();

        match transition.expire() {
            Some(expiry) => {
                // 预期校验：读取时观察到的当前行必须仍是当前行
                let position = versions.iter().position(|v| {
                    v.surrogate_id() == expiry.surrogate_id() && v.is_current()
                });
                let Some(position) = position else {
                    return Err(ScdError::ConcurrentModification {
                        natural_key: transition.natural_key().clone(),
                        reason: format!(
                            "expected current version {} was superseded",
                            expiry.surrogate_id()
                        ),
                    });
                };
                let expired = versions[position].expired(expiry.valid_to());
                versions[position] = expired;
            }
            None => {
                // 首次注册：该键不得已有当前版本
                if versions.iter().any(|v| v.is_current()) {
                    return Err(ScdError::ConcurrentModification {
                        natural_key: transition.natural_key().clone(),
                        reason: "natural key already registered".to_string(),
                    });
                }
            }
        }

        versions.push(transition.insert().clone());

        if let Some(pointer) = transition.repoint_to() {
            for version in versions.iter_mut() {
                *version = version.with_current_pointer(pointer);
            }
        }

        Ok(())
    }
}
