/// End-to-end bay aggregate lifecycle: create, populate dependents, destroy
use std::collections::HashMap;

use baykeeper::store::{
    self, bays, containers, pods, rcs, services, BayIdent, NewBay, NewContainer, NewPod,
    NewReplicationController, NewService, StoreError,
};

async fn create_test_bay(pool: &sqlx::SqlitePool, uuid: &str, name: &str) -> bays::Bay {
    bays::create_bay(
        pool,
        NewBay {
            uuid: Some(uuid.to_string()),
            name: Some(name.to_string()),
            baymodel_id: None,
            node_count: 3,
            status: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn same_row_reachable_by_id_and_uuid() {
    let pool = store::connect_in_memory().await.unwrap();
    let bay = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;

    let by_uuid = bays::get_bay_by_uuid(&pool, "bay-uuid-1").await.unwrap();
    let by_id = bays::get_bay_by_id(&pool, bay.id).await.unwrap();
    assert_eq!(by_uuid.id, by_id.id);
    assert_eq!(by_uuid.uuid, by_id.uuid);
}

#[tokio::test]
async fn destroy_bay_removes_every_dependent_kind() {
    let pool = store::connect_in_memory().await.unwrap();
    let bay = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;

    let pod = pods::create_pod(
        &pool,
        NewPod {
            name: Some("test-pod".to_string()),
            bay_uuid: bay.uuid.clone(),
            manifest: Some("kind: Pod".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let service = services::create_service(
        &pool,
        NewService {
            name: Some("test-service".to_string()),
            bay_uuid: bay.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let rc = rcs::create_rc(
        &pool,
        NewReplicationController {
            name: Some("test-rc".to_string()),
            bay_uuid: bay.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let container = containers::create_container(
        &pool,
        NewContainer {
            name: Some("test-container".to_string()),
            bay_uuid: bay.uuid.clone(),
            image: Some("nginx:latest".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(pod.bay_uuid, bay.uuid);
    assert_eq!(service.bay_uuid, bay.uuid);
    assert_eq!(rc.bay_uuid, bay.uuid);
    assert_eq!(container.bay_uuid, bay.uuid);

    bays::destroy_bay(&pool, &BayIdent::Id(bay.id)).await.unwrap();

    assert!(matches!(
        pods::get_pod_by_id(&pool, pod.id).await,
        Err(StoreError::PodNotFound { .. })
    ));
    assert!(matches!(
        services::get_service_by_id(&pool, service.id).await,
        Err(StoreError::ServiceNotFound { .. })
    ));
    assert!(matches!(
        rcs::get_rc_by_id(&pool, rc.id).await,
        Err(StoreError::ReplicationControllerNotFound { .. })
    ));
    assert!(matches!(
        containers::get_container_by_id(&pool, container.id).await,
        Err(StoreError::ContainerNotFound { .. })
    ));
    assert!(matches!(
        bays::get_bay_by_id(&pool, bay.id).await,
        Err(StoreError::BayNotFound { .. })
    ));
}

#[tokio::test]
async fn destroy_bay_by_uuid_cascades_too() {
    let pool = store::connect_in_memory().await.unwrap();
    let bay = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;

    let pod = pods::create_pod(
        &pool,
        NewPod {
            bay_uuid: bay.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    bays::destroy_bay(&pool, &BayIdent::Uuid(bay.uuid.clone()))
        .await
        .unwrap();

    assert!(matches!(
        pods::get_pod_by_id(&pool, pod.id).await,
        Err(StoreError::PodNotFound { .. })
    ));
}

#[tokio::test]
async fn destroy_leaves_other_bays_untouched() {
    let pool = store::connect_in_memory().await.unwrap();
    let doomed = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;
    let survivor = create_test_bay(&pool, "bay-uuid-2", "bay-two").await;

    let survivor_pod = pods::create_pod(
        &pool,
        NewPod {
            bay_uuid: survivor.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    pods::create_pod(
        &pool,
        NewPod {
            bay_uuid: doomed.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    bays::destroy_bay(&pool, &BayIdent::Id(doomed.id)).await.unwrap();

    // The surviving bay and its pod are still reachable
    bays::get_bay_by_id(&pool, survivor.id).await.unwrap();
    let listed = pods::list_pods_by_bay(&pool, &survivor.uuid).await.unwrap();
    assert_eq!(
        listed.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![survivor_pod.id]
    );
}

#[tokio::test]
async fn failed_destroy_is_not_partial() {
    let pool = store::connect_in_memory().await.unwrap();
    let bay = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;
    let pod = pods::create_pod(
        &pool,
        NewPod {
            bay_uuid: bay.uuid.clone(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let result = bays::destroy_bay(&pool, &BayIdent::Uuid("no-such-bay".to_string())).await;
    assert!(matches!(result, Err(StoreError::BayNotFound { .. })));

    // Nothing was removed
    bays::get_bay_by_id(&pool, bay.id).await.unwrap();
    pods::get_pod_by_id(&pool, pod.id).await.unwrap();
}

#[tokio::test]
async fn uuid_collision_across_lifecycle() {
    let pool = store::connect_in_memory().await.unwrap();
    create_test_bay(&pool, "bay-uuid-1", "bay-one").await;

    let result = bays::create_bay(
        &pool,
        NewBay {
            uuid: Some("bay-uuid-1".to_string()),
            node_count: 1,
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(StoreError::BayAlreadyExists { .. })));

    // Destroying the holder frees the uuid for reuse
    bays::destroy_bay(&pool, &BayIdent::Uuid("bay-uuid-1".to_string()))
        .await
        .unwrap();
    create_test_bay(&pool, "bay-uuid-1", "bay-one-again").await;
}

#[tokio::test]
async fn list_filters_follow_catalog_changes() {
    let pool = store::connect_in_memory().await.unwrap();
    let bay = create_test_bay(&pool, "bay-uuid-1", "bay-one").await;

    let filters = HashMap::from([("name".to_string(), "bay-one".to_string())]);
    assert_eq!(bays::list_bays(&pool, &filters).await.unwrap().len(), 1);

    bays::destroy_bay(&pool, &BayIdent::Id(bay.id)).await.unwrap();
    assert!(bays::list_bays(&pool, &filters).await.unwrap().is_empty());
}
