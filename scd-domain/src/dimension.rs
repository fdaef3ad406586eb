//! 维度版本管理器（DimensionManager）
//!
//! 把散落在各处的"过期旧行 + 插入新行 + 回写指针"手工序列收敛为
//! 单个原子操作 `record_new_version`：
//! - 读取当前版本并做生效时间单调性校验；
//! - 以半开区间约定在 `effective` 处封闭旧版本；
//! - 插入携带全新代理键的当前版本；
//! - 指针变体下批量回写 `current_pointer`。
//!
//! 管理器自身无状态，并发正确性依赖存储的预期校验：同一自然键的
//! 两次并发迁移只有一次能通过，落败方收到 `ConcurrentModification`
//! 后应整体重试。
//!
use crate::error::{ScdError, ScdResult};
use crate::persist::{Expiry, RecordStore, RecordStoreExt, Transition};
use crate::value_object::{NaturalKey, PointerMode, SurrogateId};
use crate::version_record::{Attributes, VersionRecord};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct DimensionManager<S> {
    store: Arc<S>,
    pointer_mode: PointerMode,
}

impl<S> DimensionManager<S>
where
    S: RecordStore,
{
    /// 仅维护 `is_current` 标志的默认模式
    pub fn new(store: Arc<S>) -> Self {
        Self::with_pointer_mode(store, PointerMode::FlagOnly)
    }

    pub fn with_pointer_mode(store: Arc<S>, pointer_mode: PointerMode) -> Self {
        Self {
            store,
            pointer_mode,
        }
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    /// 记录实体的新版本；键不存在时视作首次注册。
    ///
    /// 属性与当前版本完全相同也照常产生新版本——本操作不抑制
    /// 空变更，语义始终是字面的"过期再插入"。
    ///
    /// 返回新版本的代理键。
    pub async fn record_new_version(
        &self,
        natural_key: impl Into<NaturalKey>,
        attributes: Attributes,
        effective: DateTime<Utc>,
    ) -> ScdResult<SurrogateId> {
        let natural_key = natural_key.into();
        let current = self.store.find_current(&natural_key).await?;
        self.transition(natural_key, current, attributes, effective)
            .await
    }

    /// 同 `record_new_version`，但要求实体已注册，
    /// 否则报 `UnknownNaturalKey`。
    pub async fn record_change(
        &self,
        natural_key: impl Into<NaturalKey>,
        attributes: Attributes,
        effective: DateTime<Utc>,
    ) -> ScdResult<SurrogateId> {
        let natural_key = natural_key.into();
        let current = self.store.require_current(&natural_key).await?;
        self.transition(natural_key, Some(current), attributes, effective)
            .await
    }

    async fn transition(
        &self,
        natural_key: NaturalKey,
        current: Option<VersionRecord>,
        attributes: Attributes,
        effective: DateTime<Utc>,
    ) -> ScdResult<SurrogateId> {
        // 生效时间单调性：新版本不得早于当前版本的起点。
        // 相等合法，旧版本退化为空的半开区间。
        if let Some(current) = &current {
            if effective < current.valid_from() {
                return Err(ScdError::OutOfOrderEffectiveDate {
                    natural_key,
                    effective,
                    current_valid_from: current.valid_from(),
                });
            }
        }

        let surrogate_id = SurrogateId::new();
        let pointer = self
            .pointer_mode
            .maintains_pointer()
            .then_some(surrogate_id);

        let record = VersionRecord::builder()
            .surrogate_id(surrogate_id)
            .natural_key(natural_key.clone())
            .attributes(attributes)
            .valid_from(effective)
            .is_current(true)
            .maybe_current_pointer(pointer)
            .build();

        let transition = Transition::builder()
            .natural_key(natural_key)
            .maybe_expire(current.map(|c| Expiry::new(c.surrogate_id(), effective)))
            .insert(record)
            .maybe_repoint_to(pointer)
            .build();

        self.store.apply_transition(transition).await?;

        Ok(surrogate_id)
    }

    /// 查当前版本
    pub async fn current_version(
        &self,
        natural_key: impl Into<NaturalKey>,
    ) -> ScdResult<Option<VersionRecord>> {
        self.store.find_current(&natural_key.into()).await
    }

    /// 查有效期覆盖指定时间点的版本；早于首版本或键未知时为 None
    pub async fn version_as_of(
        &self,
        natural_key: impl Into<NaturalKey>,
        at: DateTime<Utc>,
    ) -> ScdResult<Option<VersionRecord>> {
        self.store.find_as_of(&natural_key.into(), at).await
    }

    /// 查全部版本，按 `valid_from` 升序
    pub async fn history(
        &self,
        natural_key: impl Into<NaturalKey>,
    ) -> ScdResult<Vec<VersionRecord>> {
        self.store.find_history(&natural_key.into()).await
    }
}
