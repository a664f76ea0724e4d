//! Integration tests for runtime reconfiguration of the backup schedule.

use backuphub_core::error::ErrorKind;

use crate::helpers::{CronCall, TestInstance, shared_locks, system_config};

#[tokio::test]
async fn test_update_after_lock_reaches_registry_once() {
    let instance = TestInstance::recording(shared_locks(), system_config("0 2 * * *", true)).await;
    instance.backup.on_bootstrap().await.unwrap();
    instance.config.reload().await.unwrap();

    instance.provider.set(system_config("0 3 * * *", false));
    instance.config.reload().await.unwrap();

    assert_eq!(
        instance.cron.updates(),
        vec![CronCall::Update {
            name: "backupDatabase".to_string(),
            schedule: "0 3 * * *".to_string(),
            enabled: false,
        }]
    );
}

#[tokio::test]
async fn test_first_load_does_not_reschedule() {
    let instance = TestInstance::recording(shared_locks(), system_config("0 2 * * *", true)).await;
    instance.backup.on_bootstrap().await.unwrap();

    instance.config.reload().await.unwrap();

    assert!(instance.cron.updates().is_empty());
    assert_eq!(instance.cron.calls().len(), 1);
}

#[tokio::test]
async fn test_invalid_cron_vetoes_change() {
    let instance = TestInstance::recording(shared_locks(), system_config("0 2 * * *", true)).await;
    instance.backup.on_bootstrap().await.unwrap();
    instance.config.reload().await.unwrap();

    instance.provider.set(system_config("not-a-cron", true));
    let err = instance.config.reload().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Invalid cron expression not-a-cron");
    assert!(instance.cron.updates().is_empty());
    assert_eq!(
        instance.config.get_config().await.unwrap(),
        system_config("0 2 * * *", true)
    );
}

#[tokio::test]
async fn test_successive_updates_are_applied_in_order() {
    let instance = TestInstance::recording(shared_locks(), system_config("0 2 * * *", true)).await;
    instance.backup.on_bootstrap().await.unwrap();
    instance.config.reload().await.unwrap();

    for (expr, enabled) in [("0 3 * * *", false), ("*/30 * * * *", true)] {
        instance.provider.set(system_config(expr, enabled));
        instance.config.reload().await.unwrap();
    }

    let schedules: Vec<(String, bool)> = instance
        .cron
        .updates()
        .into_iter()
        .filter_map(|c| match c {
            CronCall::Update {
                schedule, enabled, ..
            } => Some((schedule, enabled)),
            CronCall::Add { .. } => None,
        })
        .collect();
    assert_eq!(
        schedules,
        vec![
            ("0 3 * * *".to_string(), false),
            ("*/30 * * * *".to_string(), true)
        ]
    );
}
