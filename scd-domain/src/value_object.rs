//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，封装维度版本化中的不可变概念：
//! - 代理键（`SurrogateId`）与业务自然键（`NaturalKey`）；
//! - 半开有效期区间（`Validity`）；
//! - 指针维护模式（`PointerMode`）。
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 代理键：每个历史版本唯一，由插入时分配，永不复用或修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurrogateId(Uuid);

impl SurrogateId {
    /// 分配一个全新的代理键
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SurrogateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurrogateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SurrogateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// 自然键：同一业务实体所有版本共享的稳定标识，永不变化
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalKey(String);

impl NaturalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NaturalKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NaturalKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 半开有效期区间 `[valid_from, valid_to)`
///
/// `valid_to` 为 `None` 时区间开放，等价于该版本为当前版本；
/// 两者的一致性由版本管理器在迁移时保证。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    valid_from: DateTime<Utc>,
    valid_to: Option<DateTime<Utc>>,
}

impl Validity {
    pub fn new(valid_from: DateTime<Utc>, valid_to: Option<DateTime<Utc>>) -> Self {
        Self {
            valid_from,
            valid_to,
        }
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    /// 区间是否开放（无截止时间）
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// 判断时间点是否落在区间内（左闭右开）
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if at < self.valid_from {
            return false;
        }
        match self.valid_to {
            Some(to) => at < to,
            None => true,
        }
    }
}

/// 指针维护模式
///
/// - `FlagOnly`：仅维护 `is_current` 标志，查当前版本需按标志检索；
/// - `SharedPointer`：额外在同一自然键的所有历史行上冗余维护
///   `current_pointer`，以支持从任意历史行一跳定位当前版本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerMode {
    #[default]
    FlagOnly,
    SharedPointer,
}

impl PointerMode {
    /// 是否需要在迁移时批量回写 `current_pointer`
    pub fn maintains_pointer(&self) -> bool {
        matches!(self, PointerMode::SharedPointer)
    }
}
