//! Lists and pages of records.

mod common;

use common::{LineItem, Order};
use forma_core::{CamelCase, Context, Error, HydrationError};
use forma_engine::{Collection, Engine, Pagination, Paginator};
use serde_json::{json, Value};

/// A page fetched from somewhere other than JSON.
struct Fetched {
    rows: Vec<Value>,
}

impl Paginator for Fetched {
    fn items(&self) -> Vec<Value> {
        self.rows.clone()
    }

    fn total(&self) -> u64 {
        25
    }

    fn per_page(&self) -> u64 {
        self.rows.len() as u64
    }

    fn current_page(&self) -> u64 {
        3
    }
}

fn item(sku: &str, quantity: i64) -> LineItem {
    LineItem {
        sku: sku.to_string(),
        quantity,
    }
}

#[test]
fn array_hydrates_in_order() {
    let engine = Engine::new();
    let items: Collection<LineItem> = engine
        .hydrate_list(
            json!([{"sku": "AAA", "quantity": 1}, {"sku": "BBB", "quantity": "2"}]),
            &Context::new(),
        )
        .unwrap();
    assert_eq!(items.items(), &[item("AAA", 1), item("BBB", 2)]);
    assert!(items.pagination().is_none());
}

#[test]
fn page_object_keeps_its_counters() {
    let engine = Engine::new();
    let page: Collection<LineItem> = engine
        .hydrate_list(
            json!({
                "data": [{"sku": "AAA", "quantity": 1}],
                "meta": {"total": 11, "per_page": 5, "current_page": 2}
            }),
            &Context::new(),
        )
        .unwrap();
    assert_eq!(page.len(), 1);
    let pagination = page.pagination().unwrap();
    assert_eq!(pagination.total, 11);
    assert_eq!(pagination.current_page, 2);
    assert_eq!(pagination.last_page(), 3);
}

#[test]
fn top_level_counters_and_items_key() {
    let engine = Engine::new();
    let page: Collection<LineItem> = engine
        .hydrate_list(
            json!({"items": [{"sku": "AAA", "quantity": 1}], "total": 1, "perPage": 20, "page": 1}),
            &Context::new(),
        )
        .unwrap();
    assert_eq!(
        page.pagination(),
        Some(&Pagination {
            per_page: 20,
            total: 1,
            current_page: 1
        })
    );
}

#[test]
fn object_without_total_is_not_a_page() {
    let engine = Engine::new();
    let err = engine
        .hydrate_list::<LineItem>(json!({"data": []}), &Context::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Hydration(HydrationError::UnsupportedInput { .. })
    ));
}

#[test]
fn item_errors_carry_the_index() {
    let engine = Engine::new();
    let err = engine
        .hydrate_list::<LineItem>(
            json!([{"sku": "AAA", "quantity": 1}, {"sku": "BBB", "quantity": "lots"}]),
            &Context::new(),
        )
        .unwrap_err();
    match err {
        Error::Cast(e) => assert_eq!(e.path().to_string(), "1.quantity"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn item_violations_carry_the_index() {
    let engine = Engine::new();
    let err = engine
        .hydrate_list::<Order>(
            json!([
                {"number": "o-1", "items": []},
                {"number": "o-2", "items": [{"sku": "X", "quantity": 1}]}
            ]),
            &Context::new(),
        )
        .unwrap_err();
    assert_eq!(
        err.violations().unwrap().paths(),
        vec!["1.items.0.sku".to_string()]
    );
}

#[test]
fn hooks_run_for_every_item() {
    let engine = Engine::new();
    let orders: Collection<Order> = engine
        .hydrate_collection(
            vec![
                json!({"order_no": "o-1", "items": [{"sku": "AAA", "quantity": 2}]}),
                json!({"order_no": "o-2", "items": []}),
            ],
            &Context::new(),
        )
        .unwrap();
    let summary: Vec<(&str, i64)> = orders.iter().map(|o| (o.number.as_str(), o.units)).collect();
    assert_eq!(summary, vec![("o-1", 2), ("o-2", 0)]);
}

#[test]
fn custom_paginator() {
    let engine = Engine::new();
    let fetched = Fetched {
        rows: vec![json!({"sku": "AAA", "quantity": 1}), json!({"sku": "BBB", "quantity": 1})],
    };
    let page: Collection<LineItem> = engine.hydrate_page(&fetched, &Context::new()).unwrap();
    let pagination = page.pagination().unwrap();
    assert_eq!(pagination.last_page(), 13);
    assert_eq!(pagination.current_page, 3);
}

#[test]
fn plain_collection_normalizes_to_an_array() {
    let engine = Engine::new();
    let items = Collection::new(vec![item("AAA", 1), item("BBB", 2)]);
    let out = engine.normalize_collection(&items, &Context::new()).unwrap();
    assert_eq!(
        out,
        json!([{"sku": "AAA", "quantity": 1}, {"sku": "BBB", "quantity": 2}])
    );
}

#[test]
fn paginated_collection_normalizes_to_data_and_meta() {
    let engine = Engine::new();
    let page = Collection::paginated(
        vec![item("AAA", 1)],
        Pagination {
            per_page: 1,
            total: 2,
            current_page: 1,
        },
    );
    let out = engine.normalize_collection(&page, &Context::new()).unwrap();
    assert_eq!(
        out,
        json!({
            "data": [{"sku": "AAA", "quantity": 1}],
            "meta": {"per_page": 1, "total": 2, "current_page": 1, "last_page": 2}
        })
    );
}

#[test]
fn context_applies_to_every_item() {
    let engine = Engine::new();
    let context = Context::new().with_naming(CamelCase);
    let users: Collection<common::User> = engine
        .hydrate_collection(vec![common::user_json(), common::user_json()], &Context::new())
        .unwrap();
    let out = engine.normalize_collection(&users, &context).unwrap();
    for user in out.as_array().unwrap() {
        assert_eq!(user["firstName"], json!("Ann"));
        assert!(user.get("password").is_none());
    }
}
