use std::collections::HashMap;
use std::sync::Arc;

use drain_metrics::SchedulerMetrics;
use drain_protocol::{AppBinding, AppBindings, Binding, BindingList};

use crate::testutil::SpyClient;
use crate::{AdapterService, ServiceError};

fn binding() -> Binding {
    Binding::new("app-id", "org.space.app", "syslog://my-drain-url")
}

fn desired(drains: &[&str]) -> AppBindings {
    let mut bindings = HashMap::new();
    bindings.insert(
        "app-id".to_string(),
        AppBinding {
            hostname: "org.space.app".to_string(),
            drains: drains.iter().map(|d| d.to_string()).collect(),
        },
    );
    bindings
}

fn service(clients: &[Arc<SpyClient>]) -> AdapterService {
    let pool = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn crate::AdapterClient>)
        .collect();
    AdapterService::new(pool, Arc::new(SchedulerMetrics::new()))
}

fn spies(n: usize) -> Vec<Arc<SpyClient>> {
    (0..n)
        .map(|i| Arc::new(SpyClient::new(format!("10.0.0.{i}:4443"))))
        .collect()
}

#[tokio::test]
async fn test_count_returns_pool_size() {
    let clients = spies(1);
    assert_eq!(service(&clients).count(), 1);
}

#[tokio::test]
async fn test_delete_removes_undesired_binding() {
    let clients = spies(1);
    let actual: BindingList = vec![vec![binding()]];

    service(&clients).delete(&actual, &AppBindings::new()).await;

    assert_eq!(clients[0].deleted(), vec![binding()]);
}

#[tokio::test]
async fn test_delete_targets_every_holder() {
    let clients = spies(3);
    let actual: BindingList = vec![vec![binding()], vec![binding()], vec![]];

    service(&clients).delete(&actual, &AppBindings::new()).await;

    assert_eq!(clients[0].delete_count(), 1);
    assert_eq!(clients[1].delete_count(), 1);
    assert_eq!(clients[2].delete_count(), 0);
}

#[tokio::test]
async fn test_delete_spares_desired_bindings() {
    let clients = spies(1);
    let actual: BindingList = vec![vec![binding()]];

    service(&clients)
        .delete(&actual, &desired(&["syslog://my-drain-url"]))
        .await;

    assert_eq!(clients[0].delete_count(), 0);
}

#[tokio::test]
async fn test_list_collects_from_all_adapters() {
    let clients = spies(1);
    clients[0].set_list_response(vec![binding()]);

    let actual = service(&clients).list().await.unwrap();

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0], vec![binding()]);
}

#[tokio::test]
async fn test_list_leaves_empty_slot_on_partial_failure() {
    let clients = spies(2);
    clients[0].fail_list();
    clients[1].set_list_response(vec![binding()]);

    let actual = service(&clients).list().await.unwrap();

    assert_eq!(actual.len(), 2);
    assert!(actual[0].is_empty());
    assert_eq!(actual[1], vec![binding()]);
}

#[tokio::test]
async fn test_list_errors_when_every_adapter_fails() {
    let clients = spies(2);
    clients[0].fail_list();
    clients[1].fail_list();

    let err = service(&clients).list().await.unwrap_err();

    assert!(matches!(err, ServiceError::AllAdaptersFailed(2)));
}

#[tokio::test]
async fn test_create_writes_to_a_single_adapter() {
    let clients = spies(1);

    service(&clients)
        .create(&BindingList::new(), &desired(&["syslog://my-drain-url"]))
        .await;

    assert_eq!(clients[0].created(), vec![binding()]);
}

#[tokio::test]
async fn test_create_replicates_to_both_of_two_adapters() {
    let clients = spies(2);

    service(&clients)
        .create(&BindingList::new(), &desired(&["syslog://my-drain-url"]))
        .await;

    assert_eq!(clients[0].create_count(), 1);
    assert_eq!(clients[1].create_count(), 1);
}

#[tokio::test]
async fn test_create_writes_to_only_two_of_many_adapters() {
    let clients = spies(3);

    service(&clients)
        .create(&BindingList::new(), &desired(&["syslog://my-drain-url"]))
        .await;

    let with_creates = clients.iter().filter(|c| c.create_count() > 0).count();
    assert_eq!(with_creates, 2);

    // Placement is deterministic: first adapters in pool order.
    assert_eq!(clients[0].create_count(), 1);
    assert_eq!(clients[1].create_count(), 1);
    assert_eq!(clients[2].create_count(), 0);
}

#[tokio::test]
async fn test_create_tops_up_when_one_adapter_already_holds() {
    let clients = spies(3);
    let actual: BindingList = vec![vec![binding()], vec![], vec![]];

    service(&clients)
        .create(&actual, &desired(&["syslog://my-drain-url"]))
        .await;

    let with_creates = clients.iter().filter(|c| c.create_count() > 0).count();
    assert_eq!(with_creates, 1);
    // The holder is skipped; the next adapter in pool order gets it.
    assert_eq!(clients[0].create_count(), 0);
    assert_eq!(clients[1].create_count(), 1);
}

#[tokio::test]
async fn test_create_is_idempotent_once_replicated() {
    let clients = spies(2);
    let drains = ["syslog://my-drain-url", "syslog://another-drain"];

    let svc = service(&clients);
    svc.create(&BindingList::new(), &desired(&drains)).await;

    let total: usize = clients.iter().map(|c| c.create_count()).sum();
    assert_eq!(total, 4);

    // Second pass with the fleet already converged issues nothing.
    let held: Vec<Binding> = drains
        .iter()
        .map(|d| Binding::new("app-id", "org.space.app", *d))
        .collect();
    let actual: BindingList = vec![held.clone(), held];

    svc.create(&actual, &desired(&drains)).await;

    let total: usize = clients.iter().map(|c| c.create_count()).sum();
    assert_eq!(total, 4);
}

#[tokio::test]
async fn test_create_records_issued_metric() {
    let clients = spies(2);
    let metrics = Arc::new(SchedulerMetrics::new());
    let pool = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn crate::AdapterClient>)
        .collect();
    let svc = AdapterService::new(pool, Arc::clone(&metrics));

    svc.create(&BindingList::new(), &desired(&["syslog://my-drain-url"]))
        .await;

    assert_eq!(metrics.snapshot().creates_issued, 2);
}
