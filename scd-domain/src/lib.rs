//! SCD Type-2 维度版本化基础库（scd-domain）
//!
//! 为缓变维度（Slowly Changing Dimension, Type 2）提供通用的
//! 版本化构件，用于在应用中实现：
//! - 代理键/自然键与半开有效期等值对象（`value_object`）
//! - 版本行的持久化形态（`version_record`）
//! - 记录存储协议与内置实现（`persist`）
//! - 原子的"过期 + 插入 + 指针回写"迁移管理器（`dimension`）
//!
//! 本 crate 尽量保持与存储实现解耦，仅定义领域层接口与最小必要的
//! 错误类型，以便在不同基础设施（例如 Postgres、内存存储等）上
//! 进行适配实现。
//!
//! 典型用法：
//! 1. 选择 `persist` 中的 `RecordStore` 实现或自行适配；
//! 2. 构造 `DimensionManager`，按需选择 `PointerMode`；
//! 3. 通过 `record_new_version` 驱动版本迁移，
//!    用 `current_version`/`version_as_of`/`history` 读取历史。
//!
pub mod dimension;
pub mod error;
pub mod persist;
pub mod value_object;
pub mod version_record;
