//! 记录存储协议（RecordStore）
//!
//! 定义维度版本的读写接口。写侧以 `Transition` 为单位：一次 SCD-2
//! 迁移的全部效果（过期、插入、指针回写）必须原子生效，部分生效
//! 属于存储实现缺陷，读方永远不应观察到中间态。
//!
use crate::error::{ScdError, ScdResult};
use crate::value_object::{NaturalKey, SurrogateId};
use crate::version_record::VersionRecord;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 对"预期仍为当前版本"那一行的点更新：封闭有效期并清除当前标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    surrogate_id: SurrogateId,
    valid_to: DateTime<Utc>,
}

impl Expiry {
    pub fn new(surrogate_id: SurrogateId, valid_to: DateTime<Utc>) -> Self {
        Self {
            surrogate_id,
            valid_to,
        }
    }

    pub fn surrogate_id(&self) -> SurrogateId {
        self.surrogate_id
    }

    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }
}

/// 一次 SCD-2 迁移的写计划
///
/// - `expire`：首次注册时为 None；否则携带读取时观察到的当前行代理键，
///   存储实现据此做预期校验，不匹配即报 `ConcurrentModification`；
/// - `insert`：新的当前版本行；
/// - `repoint_to`：指针变体下，需批量回写到该自然键全部行的新代理键。
#[derive(Debug, Clone, Builder)]
pub struct Transition {
    natural_key: NaturalKey,
    expire: Option<Expiry>,
    insert: VersionRecord,
    repoint_to: Option<SurrogateId>,
}

impl Transition {
    pub fn natural_key(&self) -> &NaturalKey {
        &self.natural_key
    }

    pub fn expire(&self) -> Option<&Expiry> {
        self.expire.as_ref()
    }

    pub fn insert(&self) -> &VersionRecord {
        &self.insert
    }

    pub fn repoint_to(&self) -> Option<SurrogateId> {
        self.repoint_to
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 查该自然键的当前版本
    async fn find_current(&self, natural_key: &NaturalKey) -> ScdResult<Option<VersionRecord>>;

    /// 查有效期覆盖指定时间点的版本（as-seen 历史真相）
    async fn find_as_of(
        &self,
        natural_key: &NaturalKey,
        at: DateTime<Utc>,
    ) -> ScdResult<Option<VersionRecord>>;

    /// 查该自然键的全部版本，按 `valid_from` 升序
    async fn find_history(&self, natural_key: &NaturalKey) -> ScdResult<Vec<VersionRecord>>;

    /// 按代理键查单个版本
    async fn find_by_surrogate(
        &self,
        surrogate_id: &SurrogateId,
    ) -> ScdResult<Option<VersionRecord>>;

    /// 原子应用一次迁移：过期 + 插入 + 指针回写全部生效或全部不生效。
    ///
    /// 预期校验属于本方法契约的一部分：
    /// - `expire` 存在而对应行已不是当前版本 → `ConcurrentModification`；
    /// - `expire` 缺席（首次注册）而该键已有当前版本 → `ConcurrentModification`。
    async fn apply_transition(&self, transition: Transition) -> ScdResult<()>;
}

#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// 查当前版本，键不存在时报 `UnknownNaturalKey`
    async fn require_current(&self, natural_key: &NaturalKey) -> ScdResult<VersionRecord> {
        self.find_current(natural_key)
            .await?
            .ok_or_else(|| ScdError::UnknownNaturalKey {
                natural_key: natural_key.clone(),
            })
    }
}

#[async_trait]
impl<T> RecordStore for Arc<T>
where
    T: RecordStore + ?Sized,
{
    async fn find_current(
        &self,
        natural_key: &NaturalKey,
    ) -> ScdResult<Option<VersionRecord>> {
        (**self).find_current(natural_key).await
    }

    async fn find_as_of(
        &self,
        natural_key: &NaturalKey,
        at: DateTime<Utc>,
    ) -> ScdResult<Option<VersionRecord>> {
        (**self).find_as_of(natural_key, at).await
    }

    async fn find_history(&self, natural_key: &NaturalKey) -> ScdResult<Vec<VersionRecord>> {
        (**self).find_history(natural_key).await
    }

    async fn find_by_surrogate(
        &self,
        surrogate_id: &SurrogateId,
    ) -> ScdResult<Option<VersionRecord>> {
        (**self).find_by_surrogate(surrogate_id).await
    }

    async fn apply_transition(&self, transition: Transition) -> ScdResult<()> {
        (**self).apply_transition(transition).await
    }
}

#[async_trait]
impl<T> RecordStoreExt for T where T: RecordStore + ?Sized {}
