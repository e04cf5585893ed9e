use inventory_core::{
    ChangeNotifier, ContentUri, FieldErrorReason, InsertOutcome, ProductColumn, ProductService,
    ProductType, ProductValues, ProviderError, ResourceRouter, Selection, StorageAdapter, Value,
};
use std::sync::Arc;

fn service() -> ProductService {
    ProductService::new(
        Arc::new(StorageAdapter::in_memory()),
        Arc::new(ChangeNotifier::default()),
        ResourceRouter::products(),
    )
}

fn apples() -> ProductValues {
    ProductValues::for_product("Apples", "Acme", "555-0100", ProductType::Grocery, 10, 200)
}

fn insert(service: &ProductService, values: &ProductValues) -> ContentUri {
    match service
        .insert(&service.router().collection_uri(), values)
        .unwrap()
    {
        InsertOutcome::Created(uri) => uri,
        InsertOutcome::NoRowCreated => panic!("expected a created row"),
    }
}

fn field_error(err: ProviderError) -> (ProductColumn, FieldErrorReason) {
    match err {
        ProviderError::InvalidField(err) => (err.field, err.reason),
        other => panic!("expected field error, got {other}"),
    }
}

#[test]
fn negative_quantity_update_on_item_is_rejected() {
    let service = service();
    let item = service.router().item_uri(5);
    let values = ProductValues::new().with(ProductColumn::Quantity, -1);

    let err = service.update(&item, &values, Selection::all()).unwrap_err();
    let (field, reason) = field_error(err);
    assert_eq!(field, ProductColumn::Quantity);
    assert_eq!(reason, FieldErrorReason::Negative(-1));
}

#[test]
fn unknown_type_update_on_item_is_rejected() {
    let service = service();
    let item = service.router().item_uri(5);
    let values = ProductValues::new().with(ProductColumn::Type, 9);

    let err = service.update(&item, &values, Selection::all()).unwrap_err();
    let (field, reason) = field_error(err);
    assert_eq!(field, ProductColumn::Type);
    assert_eq!(reason, FieldErrorReason::InvalidType(9));
}

#[test]
fn rejected_insert_leaves_store_and_subscribers_untouched() {
    let service = service();
    insert(&service, &apples());
    let subscription = service.notifier().subscribe(&service.router().collection_uri());

    let values = apples().with(ProductColumn::Price, -5);
    let (field, _) = field_error(
        service
            .insert(&service.router().collection_uri(), &values)
            .unwrap_err(),
    );
    assert_eq!(field, ProductColumn::Price);
    assert_eq!(service.count(&Selection::all()).unwrap(), 1);
    assert!(subscription.try_recv().is_none());
}

#[test]
fn rejected_update_changes_no_field() {
    let service = service();
    let uri = insert(&service, &apples());

    let values = ProductValues::new()
        .with(ProductColumn::Name, "Green Apples")
        .with(ProductColumn::Quantity, -3);
    let err = service.update(&uri, &values, Selection::all()).unwrap_err();
    let (field, _) = field_error(err);
    assert_eq!(field, ProductColumn::Quantity);

    let rows = service
        .query(&uri, &[ProductColumn::Name], Selection::all(), Default::default())
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        rows[0].get(ProductColumn::Name),
        Some(&Value::Text("Apples".to_string()))
    );
}

#[test]
fn first_failing_field_in_column_order_is_reported() {
    let service = service();
    let values = ProductValues::new()
        .with(ProductColumn::Price, -1)
        .with(ProductColumn::Type, 7);

    let (field, _) = field_error(
        service
            .update(&service.router().collection_uri(), &values, Selection::all())
            .unwrap_err(),
    );
    assert_eq!(field, ProductColumn::Type);
}

#[test]
fn null_name_is_rejected_on_update() {
    let service = service();
    let uri = insert(&service, &apples());
    let mut values = ProductValues::new();
    values.put_null(ProductColumn::Name);

    let err = service.update(&uri, &values, Selection::all()).unwrap_err();
    let (field, reason) = field_error(err);
    assert_eq!(field, ProductColumn::Name);
    assert_eq!(reason, FieldErrorReason::Null);
}

#[test]
fn caller_supplied_id_is_rejected() {
    let service = service();
    let values = apples().with(ProductColumn::Id, 99);

    let (field, reason) = field_error(
        service
            .insert(&service.router().collection_uri(), &values)
            .unwrap_err(),
    );
    assert_eq!(field, ProductColumn::Id);
    assert_eq!(reason, FieldErrorReason::Immutable);
}

#[test]
fn numeric_text_is_coerced_and_stored_as_integer() {
    let service = service();
    let values = apples()
        .with(ProductColumn::Quantity, "12")
        .with(ProductColumn::Type, " 2 ");
    let uri = insert(&service, &values);

    let product = service
        .query(&uri, &[], Selection::all(), Default::default())
        .unwrap()
        .collect_products()
        .unwrap()
        .remove(0);
    assert_eq!(product.quantity, 12);
    assert_eq!(product.kind, ProductType::Goods);
}

#[test]
fn non_numeric_price_is_rejected() {
    let service = service();
    let values = apples().with(ProductColumn::Price, "cheap");

    let (field, reason) = field_error(
        service
            .insert(&service.router().collection_uri(), &values)
            .unwrap_err(),
    );
    assert_eq!(field, ProductColumn::Price);
    assert_eq!(reason, FieldErrorReason::NotAnInteger("cheap".to_string()));
}
