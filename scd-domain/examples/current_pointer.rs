/// 共享当前指针示例
/// 演示指针变体：每次迁移后同一自然键的所有历史行都指向
/// 当前版本，从任意历史行一跳即可定位当前代理键
use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use scd_domain::dimension::DimensionManager;
use scd_domain::persist::{InMemoryRecordStore, RecordStore};
use scd_domain::value_object::PointerMode;
use scd_domain::version_record::Attributes;
use serde_json::json;
use std::sync::Arc;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid timestamp")
}

fn income(band: &str) -> Attributes {
    Attributes::from([("income".to_string(), json!(band))])
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let store = Arc::new(InMemoryRecordStore::new());
    let manager =
        DimensionManager::with_pointer_mode(Arc::clone(&store), PointerMode::SharedPointer);

    let v1 = manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    let v2 = manager
        .record_new_version("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;
    let v3 = manager
        .record_new_version("101", income("VeryHigh"), ts("2025-01-01T00:00:00Z"))
        .await?;
    println!("✅ 客户 101 共 3 个版本: {v1}, {v2}, {v3}\n");

    println!("--- 所有行的 current_pointer ---");
    for version in manager.history("101").await? {
        println!(
            "  {} current={} pointer={}",
            version.surrogate_id(),
            version.is_current(),
            version.current_pointer().unwrap()
        );
    }

    // 从最早的历史行出发，一跳定位当前版本
    let oldest = store.find_by_surrogate(&v1).await?.unwrap();
    let current = store
        .find_by_surrogate(&oldest.current_pointer().unwrap())
        .await?
        .unwrap();
    println!(
        "\n✅ 由历史行 {} 一跳得到当前版本 {} (income={})",
        oldest.surrogate_id(),
        current.surrogate_id(),
        current.attribute("income").unwrap()
    );

    Ok(())
}
