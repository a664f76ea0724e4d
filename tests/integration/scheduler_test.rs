//! Integration tests wiring the backup service to the real cron scheduler.

use std::sync::Arc;
use std::time::Duration;

use backuphub_worker::CronScheduler;
use backuphub_worker::scheduler::CronJobInfo;

use crate::helpers::{TestInstance, shared_locks, system_config};

async fn wait_for_jobs(instance: &TestInstance<CronScheduler>, at_least: usize) -> bool {
    tokio::time::timeout(Duration::from_secs(10), async {
        while instance.queue.count() < at_least {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_leader_trigger_enqueues_backups() {
    let scheduler = Arc::new(CronScheduler::new().await.unwrap());
    let instance =
        TestInstance::new(shared_locks(), scheduler.clone(), system_config("* * * * * *", true))
            .await;

    instance.backup.on_bootstrap().await.unwrap();
    instance.config.reload().await.unwrap();
    scheduler.start().await.unwrap();

    let fired = wait_for_jobs(&instance, 1).await;
    scheduler.shutdown().await.unwrap();
    assert!(fired, "backup trigger never fired");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disabling_schedule_stops_enqueueing() {
    let scheduler = Arc::new(CronScheduler::new().await.unwrap());
    let instance =
        TestInstance::new(shared_locks(), scheduler.clone(), system_config("* * * * * *", true))
            .await;

    instance.backup.on_bootstrap().await.unwrap();
    instance.config.reload().await.unwrap();
    scheduler.start().await.unwrap();
    assert!(wait_for_jobs(&instance, 1).await, "backup trigger never fired");

    instance.provider.set(system_config("0 3 * * *", false));
    instance.config.reload().await.unwrap();

    // A firing already in flight may still land.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let settled = instance.queue.count();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    scheduler.shutdown().await.unwrap();

    assert_eq!(instance.queue.count(), settled);
    assert_eq!(
        scheduler.jobs().await,
        vec![CronJobInfo {
            name: "backupDatabase".to_string(),
            schedule: "0 3 * * *".to_string(),
            enabled: false,
        }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_follower_leaves_scheduler_empty() {
    let locks = shared_locks();
    let leader_scheduler = Arc::new(CronScheduler::new().await.unwrap());
    let follower_scheduler = Arc::new(CronScheduler::new().await.unwrap());

    let leader = TestInstance::new(
        locks.clone(),
        leader_scheduler.clone(),
        system_config("0 2 * * *", true),
    )
    .await;
    let follower = TestInstance::new(
        locks,
        follower_scheduler.clone(),
        system_config("0 2 * * *", true),
    )
    .await;

    leader.backup.on_bootstrap().await.unwrap();
    follower.backup.on_bootstrap().await.unwrap();

    assert_eq!(leader_scheduler.jobs().await.len(), 1);
    assert!(follower_scheduler.jobs().await.is_empty());
    assert_eq!(follower.backup.role(), Some(backuphub_service::BackupRole::Follower));
}
