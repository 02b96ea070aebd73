use super::*;
use crate::context::QueryConfig;
use crate::entity::Record;
use crate::executor::{ConditionalWrite, QueryExecutor};
use crate::memory::MemoryExecutor;
use crate::query_builder::{OrderSpec, QueryFilter, SelectQuery, SortOrder};
use crate::transcoder::NamingConvention;
use async_trait::async_trait;
use entity_derive::{entity, Entity};
use serde_json::{json, Value};

#[entity]
#[table(name = "users")]
struct User {
    #[conflict_key]
    email: String,
    name: String,
}

#[entity]
#[table(name = "people")]
struct Person {
    first_name: String,
    age: i64,
}

#[entity]
struct Item {
    id: i64,
    label: String,
}

#[entity]
struct Task {
    id: i64,
    status: String,
}

#[entity]
#[table(name = "memberships")]
struct Membership {
    #[conflict_key]
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[conflict_key]
    email: String,
    role: String,
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn user(email: &str, name: &str) -> User {
    User {
        email: email.to_string(),
        name: name.to_string(),
    }
}

fn person(first_name: &str, age: i64) -> Person {
    Person {
        first_name: first_name.to_string(),
        age,
    }
}

fn users(executor: &Arc<MemoryExecutor>) -> ModelBase<User> {
    ModelBase::for_entity(executor.clone()).unwrap()
}

/// Delegates to a [`MemoryExecutor`] but reports every update as touching no rows
struct VanishingUpdates(MemoryExecutor);

#[async_trait]
impl QueryExecutor for VanishingUpdates {
    async fn select(
        &self,
        table: &ValidatedTableName,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, ModelError> {
        self.0.select(table, query).await
    }

    async fn insert(&self, table: &ValidatedTableName, record: &Record) -> Result<(), ModelError> {
        self.0.insert(table, record).await
    }

    async fn update(
        &self,
        _table: &ValidatedTableName,
        _filter: &QueryFilter,
        _values: &Record,
    ) -> Result<Vec<Record>, ModelError> {
        Ok(Vec::new())
    }

    async fn delete(&self, table: &ValidatedTableName, filter: &QueryFilter) -> Result<u64, ModelError> {
        self.0.delete(table, filter).await
    }

    fn describe(&self) -> &'static str {
        "vanishing"
    }
}

// Construction

#[test]
fn test_for_entity_uses_declared_table_and_keys() {
    let model = users(&Arc::new(MemoryExecutor::new()));
    assert_eq!(model.table_name(), "users");
    assert_eq!(
        model.conflict_keys().map(|k| k.as_slice().to_vec()),
        Some(vec!["email".to_string()])
    );
}

#[test]
fn test_for_entity_without_table_is_a_configuration_error() {
    let err = ModelBase::<Item>::for_entity(Arc::new(MemoryExecutor::new())).unwrap_err();
    assert!(matches!(err, ModelError::Configuration { .. }));
}

#[test]
fn test_unknown_conflict_key_is_rejected() {
    let err = ModelBase::<User>::new(Arc::new(MemoryExecutor::new()), "users", &["emailAddress"])
        .unwrap_err();
    assert!(matches!(err, ModelError::Configuration { message, .. } if message.contains("emailAddress")));
}

#[test]
fn test_duplicate_conflict_key_is_rejected() {
    let err = ModelBase::<User>::new(Arc::new(MemoryExecutor::new()), "users", &["email", "email"])
        .unwrap_err();
    assert!(matches!(err, ModelError::Configuration { .. }));
}

#[test]
fn test_invalid_table_name_is_rejected() {
    let err = ModelBase::<User>::new(Arc::new(MemoryExecutor::new()), "users; DROP", &[])
        .unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
}

// Reads

#[tokio::test]
async fn test_fetch_all_without_filter_orders_by_age_desc() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone()).unwrap();
    for (name, age) in [("a", 30), ("b", 10), ("c", 20)] {
        people.create(person(name, age), None).await.unwrap();
    }

    let config = QueryConfig::new().sort("age", SortOrder::Desc);
    let ages: Vec<i64> = people
        .fetch_all(None, Some(config))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.age)
        .collect();
    assert_eq!(ages, vec![30, 20, 10]);
}

#[tokio::test]
async fn test_fetch_all_with_no_matches_is_empty() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor).unwrap();

    let found = people
        .fetch_all(Some(&PersonPartial::new().first_name("nobody")), None)
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_fetch_all_applies_limit_after_ordering() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor).unwrap();
    for (name, age) in [("a", 30), ("b", 10), ("c", 20)] {
        people.create(person(name, age), None).await.unwrap();
    }

    let config = QueryConfig::new()
        .order_by(OrderSpec::new().asc("age"))
        .limit(2);
    let names: Vec<String> = people
        .fetch_all(None, Some(config))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.first_name)
        .collect();
    assert_eq!(names, vec!["b", "c"]);
}

#[tokio::test]
async fn test_fetch_one_stores_under_snake_case_and_reads_back_camel_case() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone()).unwrap();

    people.create(person("Jo", 40), None).await.unwrap();

    assert_eq!(
        executor.rows("people").await,
        vec![record(json!({"first_name": "Jo", "age": 40}))]
    );
    let found = people
        .fetch_one(&PersonPartial::new().first_name("Jo"), None)
        .await
        .unwrap();
    assert_eq!(found, Some(person("Jo", 40)));
}

#[tokio::test]
async fn test_fetch_one_returns_none_when_nothing_matches() {
    let people = ModelBase::<Person>::for_entity(Arc::new(MemoryExecutor::new())).unwrap();
    let found = people
        .fetch_one(&PersonPartial::new().age(1), None)
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_fetch_one_returns_first_of_several_in_requested_order() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor).unwrap();
    people.create(person("Jo", 20), None).await.unwrap();
    people.create(person("Jo", 50), None).await.unwrap();

    let config = QueryConfig::new().sort("age", SortOrder::Desc);
    let found = people
        .fetch_one(&PersonPartial::new().first_name("Jo"), Some(config))
        .await
        .unwrap();
    assert_eq!(found, Some(person("Jo", 50)));
}

#[tokio::test]
async fn test_fetch_one_unique_rejects_several_matches() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor).unwrap();
    for age in [1, 2, 3] {
        people.create(person("Jo", age), None).await.unwrap();
    }

    let err = people
        .fetch_one(
            &PersonPartial::new().first_name("Jo"),
            Some(QueryConfig::new().unique()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.found_rows(), Some(3));
}

// Writes

#[tokio::test]
async fn test_create_then_fetch_by_conflict_keys_round_trips() {
    let executor = Arc::new(MemoryExecutor::new());
    let model = users(&executor);

    let created = model.create(user("a@x.com", "A"), None).await.unwrap();
    assert_eq!(created, user("a@x.com", "A"));

    let found = model
        .fetch_one(&UserPartial::new().email("a@x.com"), None)
        .await
        .unwrap();
    assert_eq!(found, Some(user("a@x.com", "A")));
}

#[tokio::test]
async fn test_create_surfaces_collaborator_errors_unchanged() {
    let executor = Arc::new(MemoryExecutor::new().with_unique("users", &["email"]));
    let model = users(&executor);

    model.create(user("a@x.com", "A"), None).await.unwrap();
    let err = model.create(user("a@x.com", "B"), None).await.unwrap_err();

    assert!(err.is_collaborator());
    assert_eq!(executor.rows("users").await.len(), 1);
}

#[tokio::test]
async fn test_update_returns_every_updated_row() {
    let executor = Arc::new(MemoryExecutor::new());
    let tasks = ModelBase::<Task>::new(executor.clone(), "tasks", &[]).unwrap();
    for (id, status) in [(1, "pending"), (2, "pending"), (3, "pending"), (4, "done")] {
        tasks
            .create(
                Task {
                    id,
                    status: status.to_string(),
                },
                None,
            )
            .await
            .unwrap();
    }

    let updated = tasks
        .update(
            Some(&TaskPartial::new().status("pending")),
            &TaskPartial::new().status("done"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 3);
    assert!(updated.iter().all(|t| t.status == "done"));

    let before = executor.rows("tasks").await;
    let none = tasks
        .update(
            Some(&TaskPartial::new().status("none-match")),
            &TaskPartial::new().status("done"),
            None,
        )
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(executor.rows("tasks").await, before);
}

#[tokio::test]
async fn test_update_without_filter_touches_every_row() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor).unwrap();
    people.create(person("a", 1), None).await.unwrap();
    people.create(person("b", 2), None).await.unwrap();

    let updated = people
        .update(None, &PersonPartial::new().age(9), None)
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|p| p.age == 9));
}

#[tokio::test]
async fn test_update_with_no_values_fails_before_io() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone()).unwrap();
    people.create(person("a", 1), None).await.unwrap();

    let err = people
        .update(None, &PersonPartial::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Configuration { .. }));
}

#[tokio::test]
async fn test_update_one_changes_the_single_match() {
    let executor = Arc::new(MemoryExecutor::new());
    let model = users(&executor);
    model.create(user("a@x.com", "A"), None).await.unwrap();
    model.create(user("b@x.com", "B"), None).await.unwrap();

    let updated = model
        .update_one(
            &UserPartial::new().email("a@x.com"),
            &UserPartial::new().name("Ann"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated, user("a@x.com", "Ann"));

    let other = model
        .fetch_one(&UserPartial::new().email("b@x.com"), None)
        .await
        .unwrap();
    assert_eq!(other, Some(user("b@x.com", "B")));
}

#[tokio::test]
async fn test_update_one_rejects_zero_and_several_matches_without_writing() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone()).unwrap();
    people.create(person("Jo", 1), None).await.unwrap();
    people.create(person("Jo", 2), None).await.unwrap();
    let before = executor.rows("people").await;

    let several = people
        .update_one(
            &PersonPartial::new().first_name("Jo"),
            &PersonPartial::new().age(99),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(several.found_rows(), Some(2));

    let zero = people
        .update_one(
            &PersonPartial::new().first_name("Al"),
            &PersonPartial::new().age(99),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(zero.found_rows(), Some(0));

    assert_eq!(executor.rows("people").await, before);
}

#[tokio::test]
async fn test_update_one_reports_a_vanished_row_as_postcondition() {
    let inner = MemoryExecutor::new();
    inner
        .seed("people", vec![record(json!({"first_name": "Jo", "age": 1}))])
        .await;
    let people = ModelBase::<Person>::for_entity(Arc::new(VanishingUpdates(inner))).unwrap();

    let err = people
        .update_one(
            &PersonPartial::new().first_name("Jo"),
            &PersonPartial::new().age(2),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Postcondition { operation: "update_one", .. }));
}

// Upsert

#[tokio::test]
async fn test_upsert_inserts_then_updates_the_same_row() {
    let executor = Arc::new(MemoryExecutor::new());
    let model = users(&executor);

    let first = model.upsert(user("a@x.com", "A"), None).await.unwrap();
    assert_eq!(first, user("a@x.com", "A"));
    assert_eq!(
        executor.rows("users").await,
        vec![record(json!({"email": "a@x.com", "name": "A"}))]
    );

    let second = model.upsert(user("a@x.com", "B"), None).await.unwrap();
    assert_eq!(second, user("a@x.com", "B"));
    assert_eq!(
        executor.rows("users").await,
        vec![record(json!({"email": "a@x.com", "name": "B"}))]
    );
}

#[tokio::test]
async fn test_sequential_upserts_converge_to_one_row_per_identity() {
    for atomic in [false, true] {
        let executor = Arc::new(MemoryExecutor::new().with_atomic_writes(atomic));
        let model = users(&executor);

        for name in ["A", "B", "C", "D"] {
            model.upsert(user("a@x.com", name), None).await.unwrap();
            model.upsert(user("b@x.com", name), None).await.unwrap();
        }

        let rows = executor.rows("users").await;
        assert_eq!(rows.len(), 2, "atomic = {}", atomic);
        let latest = model
            .fetch_one(&UserPartial::new().email("a@x.com"), None)
            .await
            .unwrap();
        assert_eq!(latest, Some(user("a@x.com", "D")), "atomic = {}", atomic);
    }
}

#[tokio::test]
async fn test_upsert_without_conflict_keys_fails_before_io() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone()).unwrap();

    let err = people.upsert(person("Jo", 1), None).await.unwrap_err();
    assert!(matches!(err, ModelError::Configuration { .. }));
    assert!(executor.rows("people").await.is_empty());
}

#[tokio::test]
async fn test_upsert_with_missing_conflict_key_value_fails_before_io() {
    let executor = Arc::new(MemoryExecutor::new());
    let model = ModelBase::<Membership>::for_entity(executor.clone()).unwrap();

    let err = model
        .upsert(
            Membership {
                tenant_id: None,
                email: "a@x.com".to_string(),
                role: "admin".to_string(),
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Configuration { message, .. } if message.contains("tenantId")));
    assert!(executor.rows("memberships").await.is_empty());
}

#[tokio::test]
async fn test_upsert_matches_on_every_conflict_key() {
    let executor = Arc::new(MemoryExecutor::new());
    let model = ModelBase::<Membership>::for_entity(executor.clone()).unwrap();
    let membership = |tenant: &str, role: &str| Membership {
        tenant_id: Some(tenant.to_string()),
        email: "a@x.com".to_string(),
        role: role.to_string(),
    };

    model.upsert(membership("t1", "member"), None).await.unwrap();
    model.upsert(membership("t2", "member"), None).await.unwrap();
    model.upsert(membership("t1", "admin"), None).await.unwrap();

    let rows = executor.rows("memberships").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&record(json!({"tenant_id": "t1", "email": "a@x.com", "role": "admin"}))));
    assert!(rows.contains(&record(json!({"tenant_id": "t2", "email": "a@x.com", "role": "member"}))));
}

#[tokio::test]
async fn test_upsert_reports_a_vanished_row_as_postcondition() {
    let inner = MemoryExecutor::new();
    inner
        .seed("users", vec![record(json!({"email": "a@x.com", "name": "A"}))])
        .await;
    let model = ModelBase::<User>::for_entity(Arc::new(VanishingUpdates(inner))).unwrap();

    let err = model.upsert(user("a@x.com", "B"), None).await.unwrap_err();
    assert!(matches!(err, ModelError::Postcondition { operation: "upsert", .. }));
}

#[tokio::test]
async fn test_upsert_over_duplicate_identities_fails_without_writing() {
    let executor = Arc::new(MemoryExecutor::new());
    let seeded = vec![
        record(json!({"email": "a@x.com", "name": "A1"})),
        record(json!({"email": "a@x.com", "name": "A2"})),
    ];
    executor.seed("users", seeded.clone()).await;
    let model = users(&executor);

    let err = model.upsert(user("a@x.com", "B"), None).await.unwrap_err();
    assert!(matches!(err, ModelError::Cardinality { operation: "upsert", .. }));
    assert_eq!(err.found_rows(), Some(2));
    assert_eq!(executor.rows("users").await, seeded);
}

// Removal

fn items(executor: &Arc<MemoryExecutor>) -> ModelBase<Item> {
    ModelBase::new(executor.clone(), "items", &[]).unwrap()
}

async fn seed_items(executor: &MemoryExecutor) {
    executor
        .seed(
            "items",
            vec![
                record(json!({"id": 5, "label": "first"})),
                record(json!({"id": 5, "label": "second"})),
                record(json!({"id": 6, "label": "third"})),
            ],
        )
        .await;
}

#[tokio::test]
async fn test_remove_one_with_duplicates_fails_and_keeps_both_rows() {
    for atomic in [false, true] {
        let executor = Arc::new(MemoryExecutor::new().with_atomic_writes(atomic));
        seed_items(&executor).await;

        let err = items(&executor)
            .remove_one(&ItemPartial::new().id(5), None)
            .await
            .unwrap_err();
        assert_eq!(err.found_rows(), Some(2), "atomic = {}", atomic);
        assert_eq!(executor.rows("items").await.len(), 3, "atomic = {}", atomic);
    }
}

#[tokio::test]
async fn test_remove_one_with_no_match_fails() {
    for atomic in [false, true] {
        let executor = Arc::new(MemoryExecutor::new().with_atomic_writes(atomic));
        seed_items(&executor).await;

        let err = items(&executor)
            .remove_one(&ItemPartial::new().id(7), None)
            .await
            .unwrap_err();
        assert_eq!(err.found_rows(), Some(0), "atomic = {}", atomic);
        assert_eq!(executor.rows("items").await.len(), 3, "atomic = {}", atomic);
    }
}

#[tokio::test]
async fn test_remove_one_returns_the_removed_row() {
    for atomic in [false, true] {
        let executor = Arc::new(MemoryExecutor::new().with_atomic_writes(atomic));
        seed_items(&executor).await;

        let removed = items(&executor)
            .remove_one(&ItemPartial::new().id(6), None)
            .await
            .unwrap();
        assert_eq!(
            removed,
            Item {
                id: 6,
                label: "third".to_string()
            }
        );
        let remaining = executor.rows("items").await;
        assert_eq!(remaining.len(), 2, "atomic = {}", atomic);
        assert!(remaining.iter().all(|row| row["id"] == json!(5)));
    }
}

#[tokio::test]
async fn test_remove_all_returns_what_was_deleted() {
    let executor = Arc::new(MemoryExecutor::new());
    seed_items(&executor).await;

    let config = QueryConfig::new().sort("label", SortOrder::Desc);
    let removed = items(&executor)
        .remove_all(Some(&ItemPartial::new().id(5)), Some(config))
        .await
        .unwrap();
    let labels: Vec<_> = removed.into_iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["second", "first"]);
    assert_eq!(
        executor.rows("items").await,
        vec![record(json!({"id": 6, "label": "third"}))]
    );

    let rest = items(&executor).remove_all(None, None).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert!(executor.rows("items").await.is_empty());
}

// Execution context

#[tokio::test]
async fn test_transaction_overrides_the_default_executor() {
    let default = Arc::new(MemoryExecutor::new());
    let tx = MemoryExecutor::new();
    let model = users(&default);

    let config = || QueryConfig::new().transaction(&tx);
    model.create(user("a@x.com", "A"), Some(config())).await.unwrap();
    model.upsert(user("a@x.com", "B"), Some(config())).await.unwrap();

    assert!(default.rows("users").await.is_empty());
    assert_eq!(
        tx.rows("users").await,
        vec![record(json!({"email": "a@x.com", "name": "B"}))]
    );

    let outside = model
        .fetch_one(&UserPartial::new().email("a@x.com"), None)
        .await
        .unwrap();
    assert_eq!(outside, None);

    let inside = model
        .remove_one(&UserPartial::new().email("a@x.com"), Some(config()))
        .await
        .unwrap();
    assert_eq!(inside, user("a@x.com", "B"));
    assert!(tx.rows("users").await.is_empty());
}

#[test]
fn test_execution_context_resolution() {
    let default = MemoryExecutor::new();
    let tx = MemoryExecutor::new().with_atomic_writes(true);

    assert!(!ExecutionContext::resolve(&default, None).is_transaction());
    let ctx = ExecutionContext::resolve(&default, Some(&tx as &dyn QueryExecutor));
    assert!(ctx.is_transaction());
    assert_eq!(format!("{:?}", ctx), "Transaction(memory)");
}

// Transcoding

#[tokio::test]
async fn test_alternate_transcoder_changes_storage_names_only() {
    let executor = Arc::new(MemoryExecutor::new());
    let people = ModelBase::<Person>::for_entity(executor.clone())
        .unwrap()
        .with_transcoder(CaseTranscoder::new(
            NamingConvention::Camel,
            NamingConvention::UpperSnake,
        ));

    people.create(person("Jo", 3), None).await.unwrap();
    assert_eq!(
        executor.rows("people").await,
        vec![record(json!({"FIRST_NAME": "Jo", "AGE": 3}))]
    );

    let config = QueryConfig::new().sort("firstName", SortOrder::Asc);
    let found = people
        .fetch_all(Some(&PersonPartial::new().age(3)), Some(config))
        .await
        .unwrap();
    assert_eq!(found, vec![person("Jo", 3)]);
}

#[tokio::test]
async fn test_storage_only_columns_are_not_decoded() {
    let executor = Arc::new(MemoryExecutor::new());
    executor
        .seed(
            "people",
            vec![record(json!({
                "first_name": "Jo",
                "age": 3,
                "created_at": "2024-01-01T00:00:00Z"
            }))],
        )
        .await;
    let people = ModelBase::<Person>::for_entity(executor).unwrap();

    let found = people.fetch_all(None, None).await.unwrap();
    assert_eq!(found, vec![person("Jo", 3)]);
}

#[test]
fn test_conditional_write_names() {
    let filter = QueryFilter::new();
    let record = Record::new();
    let columns = vec!["email".to_string()];
    assert_eq!(
        ConditionalWrite::DeleteExactlyOne { filter: &filter }.name(),
        "delete_exactly_one"
    );
    assert_eq!(
        ConditionalWrite::Upsert {
            conflict_columns: &columns,
            record: &record
        }
        .name(),
        "upsert"
    );
}
