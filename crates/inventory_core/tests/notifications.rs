use inventory_core::{
    ChangeNotifier, ContentUri, InsertOutcome, ProductColumn, ProductService, ProductType,
    ProductValues, ResourceRouter, Selection, SortOrder, StorageAdapter,
};
use std::sync::Arc;
use std::time::Duration;

fn service() -> ProductService {
    ProductService::new(
        Arc::new(StorageAdapter::in_memory()),
        Arc::new(ChangeNotifier::default()),
        ResourceRouter::products(),
    )
}

fn insert_apples(service: &ProductService) -> ContentUri {
    let values =
        ProductValues::for_product("Apples", "Acme", "555-0100", ProductType::Grocery, 10, 200);
    match service
        .insert(&service.router().collection_uri(), &values)
        .unwrap()
    {
        InsertOutcome::Created(uri) => uri,
        InsertOutcome::NoRowCreated => panic!("expected a created row"),
    }
}

#[test]
fn deleting_missing_item_sends_nothing() {
    let service = service();
    let missing = service.router().item_uri(404);
    let item_watch = service.notifier().subscribe(&missing);
    let collection_watch = service
        .notifier()
        .subscribe(&service.router().collection_uri());

    assert_eq!(service.delete(&missing, Selection::all()).unwrap(), 0);
    assert!(item_watch.try_recv().is_none());
    assert!(collection_watch.try_recv().is_none());
}

#[test]
fn deleting_existing_item_notifies_item_and_collection_once() {
    let service = service();
    let uri = insert_apples(&service);
    let item_watch = service.notifier().subscribe(&uri);
    let collection_watch = service
        .notifier()
        .subscribe(&service.router().collection_uri());

    assert_eq!(service.delete(&uri, Selection::all()).unwrap(), 1);

    assert_eq!(item_watch.try_recv().map(|event| event.uri), Some(uri.clone()));
    assert!(item_watch.try_recv().is_none());
    assert_eq!(collection_watch.try_recv().map(|event| event.uri), Some(uri));
    assert!(collection_watch.try_recv().is_none());
}

#[test]
fn insert_notifies_collection_and_existing_item_watchers() {
    let service = service();
    let first = insert_apples(&service);
    let item_watch = service.notifier().subscribe(&first);
    let collection_watch = service
        .notifier()
        .subscribe(&service.router().collection_uri());

    insert_apples(&service);

    let event = collection_watch
        .recv_timeout(Duration::from_millis(100))
        .unwrap();
    assert_eq!(event.uri, service.router().collection_uri());
    assert_eq!(item_watch.drain(), 1);
}

#[test]
fn update_notifies_only_when_rows_change() {
    let service = service();
    let uri = insert_apples(&service);
    let watch = service.notifier().subscribe(&uri);
    let values = ProductValues::new().with(ProductColumn::Quantity, 4);

    let none_matched = service
        .update(
            &service.router().collection_uri(),
            &values,
            Selection::new("name = ?", ["Pears"]),
        )
        .unwrap();
    assert_eq!(none_matched, 0);
    assert!(watch.try_recv().is_none());

    assert_eq!(service.update(&uri, &values, Selection::all()).unwrap(), 1);
    assert_eq!(watch.drain(), 1);
}

#[test]
fn unrelated_items_are_not_notified() {
    let service = service();
    let first = insert_apples(&service);
    let second = insert_apples(&service);
    let first_watch = service.notifier().subscribe(&first);

    service.delete(&second, Selection::all()).unwrap();
    assert!(first_watch.try_recv().is_none());
}

#[test]
fn query_cursor_becomes_stale_after_write() {
    let service = service();
    insert_apples(&service);
    let cursor = service
        .query(
            &service.router().collection_uri(),
            &[],
            Selection::all(),
            SortOrder::new(),
        )
        .unwrap();
    assert!(!cursor.is_stale());

    insert_apples(&service);
    assert!(cursor.is_stale());
    assert!(!cursor.is_stale());
}

#[test]
fn dropping_cursor_cancels_its_subscription() {
    let service = service();
    let uri = insert_apples(&service);
    let cursor = service
        .query(&uri, &[], Selection::all(), SortOrder::new())
        .unwrap();
    assert_eq!(service.notifier().subscriber_count(), 1);

    drop(cursor);
    assert_eq!(service.notifier().subscriber_count(), 0);
}

#[test]
fn cursor_subscription_outlives_iteration() {
    let service = service();
    let uri = insert_apples(&service);
    let cursor = service
        .query(&uri, &[], Selection::all(), SortOrder::new())
        .unwrap();
    let subscription = cursor.into_subscription();

    let values = ProductValues::new().with(ProductColumn::Price, 250);
    service.update(&uri, &values, Selection::all()).unwrap();
    assert_eq!(subscription.try_recv().map(|event| event.uri), Some(uri));
}
