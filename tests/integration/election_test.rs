//! Integration tests for backup leader election.

use std::sync::Arc;

use futures::future::join_all;

use backuphub_core::traits::LockStore;
use backuphub_service::BackupRole;

use crate::helpers::{
    CronCall, TestInstance, UnavailableLockStore, shared_locks, system_config,
};

#[tokio::test]
async fn test_exactly_one_leader_among_concurrent_instances() {
    let locks = shared_locks();
    let mut instances = Vec::new();
    for _ in 0..8 {
        instances.push(
            TestInstance::recording(locks.clone(), system_config("0 2 * * *", true)).await,
        );
    }

    let roles: Vec<BackupRole> = join_all(instances.iter().map(|i| i.backup.on_bootstrap()))
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(roles.iter().filter(|r| r.is_leader()).count(), 1);

    let registrations: usize = instances.iter().map(|i| i.cron.calls().len()).sum();
    assert_eq!(registrations, 1);

    let leader = instances
        .iter()
        .find(|i| i.backup.role() == Some(BackupRole::Leader))
        .unwrap();
    assert_eq!(
        leader.cron.calls(),
        vec![CronCall::Add {
            name: "backupDatabase".to_string(),
            schedule: "0 2 * * *".to_string(),
            enabled: true,
        }]
    );
}

#[tokio::test]
async fn test_followers_never_touch_registry() {
    let locks = shared_locks();
    let leader = TestInstance::recording(locks.clone(), system_config("0 2 * * *", true)).await;
    let follower = TestInstance::recording(locks, system_config("0 2 * * *", true)).await;

    assert_eq!(leader.backup.on_bootstrap().await.unwrap(), BackupRole::Leader);
    assert_eq!(follower.backup.on_bootstrap().await.unwrap(), BackupRole::Follower);

    follower.config.reload().await.unwrap();
    follower.provider.set(system_config("0 3 * * *", false));
    follower.config.reload().await.unwrap();

    assert!(follower.cron.calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_lock_store_yields_follower() {
    let instance = TestInstance::recording(
        Arc::new(UnavailableLockStore) as Arc<dyn LockStore>,
        system_config("0 2 * * *", true),
    )
    .await;

    assert_eq!(instance.backup.on_bootstrap().await.unwrap(), BackupRole::Follower);
    assert!(instance.cron.calls().is_empty());
}

#[tokio::test]
async fn test_disabled_schedule_is_still_registered_by_leader() {
    let instance =
        TestInstance::recording(shared_locks(), system_config("0 2 * * *", false)).await;

    instance.backup.on_bootstrap().await.unwrap();

    assert_eq!(
        instance.cron.calls(),
        vec![CronCall::Add {
            name: "backupDatabase".to_string(),
            schedule: "0 2 * * *".to_string(),
            enabled: false,
        }]
    );
}

#[tokio::test]
async fn test_misconfigured_instance_does_not_take_leadership() {
    let locks = shared_locks();
    let broken = TestInstance::recording(locks.clone(), system_config("* * *", true)).await;
    let healthy = TestInstance::recording(locks.clone(), system_config("0 2 * * 0", true)).await;

    assert!(broken.backup.on_bootstrap().await.is_err());
    assert!(broken.cron.calls().is_empty());

    assert_eq!(healthy.backup.on_bootstrap().await.unwrap(), BackupRole::Leader);
    assert_eq!(
        healthy.cron.calls(),
        vec![CronCall::Add {
            name: "backupDatabase".to_string(),
            schedule: "0 2 * * 0".to_string(),
            enabled: true,
        }]
    );
}
