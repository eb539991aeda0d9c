mod common;

use std::future;
use std::time::Duration;

use common::{Behavior, Fleet, config};
use shardkeep::marker::{BootstrapMarker, FileMarker};
use shardkeep::startup::{self, StartupPath};
use shardkeep::state::RootKeyState;

#[tokio::test]
async fn test_first_start_bootstraps_and_restart_recovers_same_key() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = Fleet::new();

    let first = RootKeyState::new();
    let path = startup::run(
        config(2, 3),
        fleet.clone(),
        FileMarker::in_dir(dir.path()),
        first.clone(),
        future::pending(),
    )
    .await
    .unwrap();
    assert_eq!(path, StartupPath::Bootstrapped);
    assert!(FileMarker::in_dir(dir.path()).is_present().unwrap());

    // Restart with one custodian gone
    fleet.set("keeper-3", Behavior::Down);
    let second = RootKeyState::new();
    let path = startup::run(
        config(2, 3),
        fleet.clone(),
        FileMarker::in_dir(dir.path()),
        second.clone(),
        future::pending(),
    )
    .await
    .unwrap();
    assert_eq!(path, StartupPath::Recovered);
    assert_eq!(
        first.get().unwrap().as_bytes(),
        second.get().unwrap().as_bytes()
    );
}

#[tokio::test]
async fn test_bootstrap_retries_until_every_custodian_acknowledges() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = Fleet::new();
    fleet.set("keeper-2", Behavior::Down);

    let reviver = {
        let fleet = fleet.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fleet.set("keeper-2", Behavior::Healthy);
        })
    };

    let path = startup::run(
        config(2, 3),
        fleet.clone(),
        FileMarker::in_dir(dir.path()),
        RootKeyState::new(),
        future::pending(),
    )
    .await
    .unwrap();
    reviver.await.unwrap();

    assert_eq!(path, StartupPath::Bootstrapped);
    assert!(fleet.stored("keeper-2").is_some());
}

#[tokio::test]
async fn test_interrupted_bootstrap_leaves_no_marker() {
    let dir = tempfile::tempdir().unwrap();
    let fleet = Fleet::new();
    fleet.set("keeper-1", Behavior::Down);
    let state = RootKeyState::new();

    let path = startup::run(
        config(2, 3),
        fleet,
        FileMarker::in_dir(dir.path()),
        state.clone(),
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await
    .unwrap();

    assert_eq!(path, StartupPath::Interrupted);
    assert!(!FileMarker::in_dir(dir.path()).is_present().unwrap());
    assert!(state.is_set());
}

#[tokio::test]
async fn test_recovery_keeps_polling_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let marker = FileMarker::in_dir(dir.path());
    marker.write().unwrap();

    let fleet = Fleet::new();
    let config = config(2, 3);
    common::seed(&fleet, &config);
    fleet.set("keeper-1", Behavior::Down);
    fleet.set("keeper-2", Behavior::Down);
    let state = RootKeyState::new();

    let path = startup::run(
        config,
        fleet.clone(),
        marker,
        state.clone(),
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await
    .unwrap();

    assert_eq!(path, StartupPath::Interrupted);
    assert!(!state.is_set());
    assert!(fleet.pulls() > 3);
}

#[tokio::test]
async fn test_recovery_waits_for_a_returning_custodian() {
    let dir = tempfile::tempdir().unwrap();
    let marker = FileMarker::in_dir(dir.path());
    marker.write().unwrap();

    let fleet = Fleet::new();
    let config = config(2, 3);
    let key = common::seed(&fleet, &config);
    fleet.set("keeper-1", Behavior::Down);
    fleet.set("keeper-2", Behavior::Down);

    let reviver = {
        let fleet = fleet.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fleet.set("keeper-2", Behavior::Healthy);
        })
    };

    let state = RootKeyState::new();
    let path = startup::run(config, fleet, marker, state.clone(), future::pending())
        .await
        .unwrap();
    reviver.await.unwrap();

    assert_eq!(path, StartupPath::Recovered);
    assert_eq!(state.get().unwrap().as_bytes(), key.as_bytes());
}
