//! 版本持久化模型（VersionRecord）
//!
//! 定义维度版本在持久化层的标准形态：同一自然键的每个历史版本
//! 对应一行，行一经写入即不再原地修改——过期与指针回写均以
//! 替换副本的方式表达（`expired`/`with_current_pointer`）。
//!
use crate::value_object::{NaturalKey, SurrogateId, Validity};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 被版本化的可变属性负载：字段名 → 值
pub type Attributes = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct VersionRecord {
    /// 代理键，插入时分配，唯一且不可变
    surrogate_id: SurrogateId,
    /// 自然键，同一实体所有版本共享
    natural_key: NaturalKey,
    /// 被追踪的属性负载
    attributes: Attributes,
    /// 有效期起点（含）
    valid_from: DateTime<Utc>,
    /// 有效期终点（不含）；当前版本为 None
    valid_to: Option<DateTime<Utc>>,
    /// 当前版本标志，与 `valid_to` 为 None 始终一致
    is_current: bool,
    /// 指针变体：指向该自然键当前版本的代理键（冗余存储，便于一跳查询）
    current_pointer: Option<SurrogateId>,
}

impl VersionRecord {
    pub fn surrogate_id(&self) -> SurrogateId {
        self.surrogate_id
    }

    pub fn natural_key(&self) -> &NaturalKey {
        &self.natural_key
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// 按字段名取单个属性值
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn current_pointer(&self) -> Option<SurrogateId> {
        self.current_pointer
    }

    pub fn validity(&self) -> Validity {
        Validity::new(self.valid_from, self.valid_to)
    }

    /// 时间点是否落在该版本的有效期内
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.validity().contains(at)
    }

    /// 返回过期副本：封闭有效期并清除当前标志
    pub fn expired(&self, valid_to: DateTime<Utc>) -> Self {
        Self {
            valid_to: Some(valid_to),
            is_current: false,
            ..self.clone()
        }
    }

    /// 返回指针回写后的副本
    pub fn with_current_pointer(&self, pointer: SurrogateId) -> Self {
        Self {
            current_pointer: Some(pointer),
            ..self.clone()
        }
    }
}
