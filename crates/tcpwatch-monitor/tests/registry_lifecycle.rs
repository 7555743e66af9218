//! End-to-end registry behaviour against real sockets on localhost.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use tcpwatch_core::{HostKey, HostSpec, SortMode, ViewPrefs};
use tcpwatch_monitor::{HostRegistry, HostStatus};
use tcpwatch_probe::TcpProber;

async fn open_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((_sock, _)) = listener.accept().await {}
    });
    port
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn spec(port: u16) -> HostSpec {
    HostSpec::new(
        "127.0.0.1",
        port,
        Duration::from_millis(500),
        Duration::from_secs(1),
        true,
    )
    .unwrap()
}

/// Poll until every key has a status, or give up after `limit`.
async fn poll_until_known(registry: &mut HostRegistry, keys: &[HostKey], limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        registry.poll();
        let known = keys.iter().all(|k| {
            registry
                .state(k)
                .is_some_and(|s| s.status() != HostStatus::Unknown)
        });
        if known {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "hosts never reported a status"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn open_and_refused_hosts_settle_and_order() {
    let up = open_port().await;
    let down = closed_port().await;
    let up_key = HostKey::new("127.0.0.1", up);
    let down_key = HostKey::new("127.0.0.1", down);

    let mut registry = HostRegistry::new(
        Arc::new(TcpProber),
        Duration::from_millis(500),
        Duration::from_secs(1),
    );
    // Add the refused host first so ordering has to move it.
    registry.add_host(spec(down)).unwrap();
    registry.add_host(spec(up)).unwrap();

    poll_until_known(&mut registry, &[up_key.clone(), down_key.clone()], Duration::from_secs(5)).await;

    let up_state = registry.state(&up_key).unwrap();
    assert!(up_state.last_ok());
    assert!(up_state.last_latency_ms().is_finite());
    assert_eq!(up_state.consecutive_failures(), 0);

    let down_state = registry.state(&down_key).unwrap();
    assert!(!down_state.last_ok());
    assert!(down_state.last_error().is_some());
    assert!(down_state.consecutive_failures() >= 1);

    let order: Vec<&HostKey> = registry
        .ordered(SortMode::Status)
        .into_iter()
        .map(HostSpec::key)
        .collect();
    assert_eq!(order, vec![&up_key, &down_key]);

    registry.shutdown().await;
    assert_eq!(registry.running_count(), 0);
}

#[tokio::test]
async fn remove_and_restart_keep_state_tied_to_workers() {
    let up = open_port().await;
    let other = open_port().await;
    let up_key = HostKey::new("127.0.0.1", up);
    let other_key = HostKey::new("127.0.0.1", other);

    let mut registry = HostRegistry::new(
        Arc::new(TcpProber),
        Duration::from_millis(500),
        Duration::from_secs(1),
    );
    registry.add_host(spec(up)).unwrap();
    registry.add_host(spec(other)).unwrap();
    poll_until_known(&mut registry, &[up_key.clone(), other_key.clone()], Duration::from_secs(5)).await;

    registry.remove_host(&up_key).await.unwrap();
    assert!(registry.state(&up_key).is_none());
    // Nothing for the removed host shows up afterwards.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(registry.poll().iter().all(|e| e.key != up_key));
    assert!(registry.state(&up_key).is_none());

    assert!(!registry.toggle_all().await);
    assert!(registry.toggle_all().await);
    poll_until_known(&mut registry, &[other_key.clone()], Duration::from_secs(5)).await;

    let config = registry.to_config(&ViewPrefs::default());
    assert_eq!(config.hosts.len(), 1);
    assert_eq!(config.hosts[0].port, i64::from(other));

    registry.shutdown().await;
}
