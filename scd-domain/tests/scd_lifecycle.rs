use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use scd_domain::dimension::DimensionManager;
use scd_domain::error::ScdError;
use scd_domain::persist::InMemoryRecordStore;
use scd_domain::version_record::{Attributes, VersionRecord};
use serde_json::json;
use std::sync::Arc;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn income(band: &str) -> Attributes {
    Attributes::from([("income".to_string(), json!(band))])
}

fn manager() -> DimensionManager<InMemoryRecordStore> {
    DimensionManager::new(Arc::new(InMemoryRecordStore::new()))
}

// 断言同一自然键的全部不变量：恰有一行当前版本、当前标志与开放
// 区间一致、按 valid_from 升序的区间首尾相接且不重叠
fn assert_invariants(history: &[VersionRecord]) {
    assert_eq!(history.iter().filter(|v| v.is_current()).count(), 1);

    for version in history {
        assert_eq!(version.is_current(), version.valid_to().is_none());
    }

    for pair in history.windows(2) {
        assert_eq!(pair[0].valid_to(), Some(pair[1].valid_from()));
    }
}

// 规范场景：收入档从 Medium 变为 High，产生两行版本
#[tokio::test]
async fn register_and_change_income_band() -> AnyResult<()> {
    let manager = manager();

    let first = manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    let second = manager
        .record_new_version("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;
    assert_ne!(first, second);

    let history = manager.history("101").await?;
    assert_eq!(history.len(), 2);

    let old = &history[0];
    assert_eq!(old.surrogate_id(), first);
    assert_eq!(old.attribute("income"), Some(&json!("Medium")));
    assert_eq!(old.valid_from(), ts("2024-01-01T00:00:00Z"));
    assert_eq!(old.valid_to(), Some(ts("2024-06-01T00:00:00Z")));
    assert!(!old.is_current());

    let new = &history[1];
    assert_eq!(new.surrogate_id(), second);
    assert_eq!(new.attribute("income"), Some(&json!("High")));
    assert_eq!(new.valid_from(), ts("2024-06-01T00:00:00Z"));
    assert_eq!(new.valid_to(), None);
    assert!(new.is_current());

    Ok(())
}

// 规范场景：晚到的早生效时间必须被拒绝
#[tokio::test]
async fn out_of_order_effective_date_is_rejected() -> AnyResult<()> {
    let manager = manager();

    manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    manager
        .record_new_version("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;

    let err = manager
        .record_new_version("101", income("Low"), ts("2023-12-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScdError::OutOfOrderEffectiveDate { .. }));

    // 拒绝后历史保持不变
    let history = manager.history("101").await?;
    assert_eq!(history.len(), 2);
    assert_invariants(&history);

    Ok(())
}

// 严格递增的迁移序列：每一步之后不变量都成立，
// 且 current_version 始终等于 history 的末元素
#[tokio::test]
async fn monotonic_sequence_keeps_invariants() -> AnyResult<()> {
    let manager = manager();
    let dates = [
        "2024-01-01T00:00:00Z",
        "2024-03-15T08:30:00Z",
        "2024-06-01T00:00:00Z",
        "2024-11-20T17:45:00Z",
        "2025-02-01T00:00:00Z",
    ];

    for (step, date) in dates.iter().enumerate() {
        manager
            .record_new_version("101", income(&format!("band-{step}")), ts(date))
            .await?;

        let history = manager.history("101").await?;
        assert_eq!(history.len(), step + 1);
        assert_invariants(&history);

        let current = manager.current_version("101").await?.unwrap();
        assert_eq!(&current, history.last().unwrap());
    }

    Ok(())
}

// 时间点查询：区间包含、首版本之前与未知键
#[tokio::test]
async fn as_of_resolves_by_interval_containment() -> AnyResult<()> {
    let manager = manager();

    manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    manager
        .record_new_version("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;

    // 落在旧版本区间内
    let v = manager
        .version_as_of("101", ts("2024-03-01T00:00:00Z"))
        .await?
        .unwrap();
    assert_eq!(v.attribute("income"), Some(&json!("Medium")));

    // 区间边界：旧版本的 valid_to 属于新版本
    let v = manager
        .version_as_of("101", ts("2024-06-01T00:00:00Z"))
        .await?
        .unwrap();
    assert_eq!(v.attribute("income"), Some(&json!("High")));

    // 开放区间覆盖未来任意时间
    let v = manager
        .version_as_of("101", ts("2030-01-01T00:00:00Z"))
        .await?
        .unwrap();
    assert!(v.is_current());

    // 首版本之前与未知键均为 None
    assert!(
        manager
            .version_as_of("101", ts("2023-01-01T00:00:00Z"))
            .await?
            .is_none()
    );
    assert!(
        manager
            .version_as_of("999", ts("2024-03-01T00:00:00Z"))
            .await?
            .is_none()
    );

    Ok(())
}

// 空变更不被抑制：完全相同的属性仍然过期旧行并产生新行
#[tokio::test]
async fn identical_attributes_still_create_version() -> AnyResult<()> {
    let manager = manager();

    manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    manager
        .record_new_version("101", income("Medium"), ts("2024-06-01T00:00:00Z"))
        .await?;

    let history = manager.history("101").await?;
    assert_eq!(history.len(), 2);
    assert_invariants(&history);
    assert_eq!(history[0].attributes(), history[1].attributes());

    Ok(())
}

// 生效时间等于当前版本起点：合法，旧版本退化为空区间
#[tokio::test]
async fn equal_effective_date_is_allowed() -> AnyResult<()> {
    let manager = manager();
    let at = ts("2024-01-01T00:00:00Z");

    manager.record_new_version("101", income("Medium"), at).await?;
    manager.record_new_version("101", income("High"), at).await?;

    let history = manager.history("101").await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|v| v.is_current()).count(), 1);

    // 空区间不覆盖任何时间点，as-of 唯一命中新版本
    let v = manager.version_as_of("101", at).await?.unwrap();
    assert_eq!(v.attribute("income"), Some(&json!("High")));

    Ok(())
}

// record_change 要求实体已注册
#[tokio::test]
async fn record_change_requires_existing_entity() -> AnyResult<()> {
    let manager = manager();

    let err = manager
        .record_change("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScdError::UnknownNaturalKey { .. }));

    manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    manager
        .record_change("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;

    let history = manager.history("101").await?;
    assert_eq!(history.len(), 2);

    Ok(())
}

// 不同自然键的历史互不影响
#[tokio::test]
async fn keys_are_independent() -> AnyResult<()> {
    let manager = manager();

    manager
        .record_new_version("101", income("Medium"), ts("2024-01-01T00:00:00Z"))
        .await?;
    manager
        .record_new_version("202", income("Low"), ts("2024-02-01T00:00:00Z"))
        .await?;
    manager
        .record_new_version("101", income("High"), ts("2024-06-01T00:00:00Z"))
        .await?;

    assert_eq!(manager.history("101").await?.len(), 2);
    assert_eq!(manager.history("202").await?.len(), 1);

    let other = manager.current_version("202").await?.unwrap();
    assert_eq!(other.attribute("income"), Some(&json!("Low")));

    Ok(())
}
