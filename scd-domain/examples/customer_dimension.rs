/// 客户维度示例
/// 演示 SCD Type-2 版本化：注册客户、两次收入档变更，
/// 以及当前版本、时间点与全量历史三种查询
use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use scd_domain::dimension::DimensionManager;
use scd_domain::persist::InMemoryRecordStore;
use scd_domain::version_record::{Attributes, VersionRecord};
use serde_json::json;
use std::sync::Arc;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid timestamp")
}

fn customer(income: &str, city: &str) -> Attributes {
    Attributes::from([
        ("income".to_string(), json!(income)),
        ("city".to_string(), json!(city)),
    ])
}

fn print_version(v: &VersionRecord) {
    let until = v
        .valid_to()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "open".to_string());
    println!(
        "  [{} .. {}) income={} city={} current={}",
        v.valid_from().to_rfc3339(),
        until,
        v.attribute("income").unwrap(),
        v.attribute("city").unwrap(),
        v.is_current()
    );
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let manager = DimensionManager::new(Arc::new(InMemoryRecordStore::new()));

    // ========================================================================
    // 版本迁移：注册 + 两次变更
    // ========================================================================

    let v1 = manager
        .record_new_version(
            "101",
            customer("Medium", "Hangzhou"),
            ts("2024-01-01T00:00:00Z"),
        )
        .await?;
    println!("✅ 注册客户 101, 代理键 {v1}");

    let v2 = manager
        .record_new_version(
            "101",
            customer("High", "Hangzhou"),
            ts("2024-06-01T00:00:00Z"),
        )
        .await?;
    println!("✅ 收入档变更为 High, 代理键 {v2}");

    let v3 = manager
        .record_new_version(
            "101",
            customer("High", "Shanghai"),
            ts("2025-02-01T00:00:00Z"),
        )
        .await?;
    println!("✅ 迁居上海, 代理键 {v3}\n");

    // ========================================================================
    // 查询：当前版本 / 时间点 / 全量历史
    // ========================================================================

    println!("--- 当前版本 ---");
    let current = manager.current_version("101").await?.unwrap();
    print_version(&current);

    println!("\n--- 2024-03-01 当时的版本（as-seen）---");
    let seen = manager
        .version_as_of("101", ts("2024-03-01T00:00:00Z"))
        .await?
        .unwrap();
    print_version(&seen);

    println!("\n--- 全量历史（按 valid_from 升序）---");
    for version in manager.history("101").await? {
        print_version(&version);
    }

    Ok(())
}
