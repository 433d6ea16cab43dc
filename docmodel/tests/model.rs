mod support;

use docmodel::{
    bson::{Bson, Document, doc},
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize};

use support::{Call, RecordingBackend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Task {
    title: String,
    x: i32,
}

fn task(title: &str, x: i32) -> Task {
    Task {
        title: title.to_string(),
        x,
    }
}

fn tagged(id: &str) -> Document {
    doc! { "_id": { "$oid": id } }
}

#[tokio::test]
async fn create_assigns_id_and_find_returns_it() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Task>("tasks");

    let created = tasks.create(task("write", 1)).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.document, task("write", 1));

    let found = tasks
        .find(FindParams::new().filter(doc! { "_id": created.id.clone() }))
        .await
        .unwrap();
    assert_eq!(found, Some(task("write", 1)));

    let with_id = store
        .model::<Identified<Task>>("tasks")
        .find(FindParams::new().filter(doc! { "_id": created.id.clone() }))
        .await
        .unwrap();
    assert_eq!(with_id, Some(created));
}

#[tokio::test]
async fn find_sends_tagged_id_without_touching_caller_filter() {
    let store = DataStore::new(RecordingBackend::default());
    let tasks = store.model::<Task>("tasks");
    let params = FindParams::new().filter(doc! { "_id": "A", "x": 1 });

    tasks.find(params.clone()).await.unwrap();

    assert_eq!(params.filter, Some(doc! { "_id": "A", "x": 1 }));
    assert_eq!(
        store.backend().calls(),
        vec![Call::FindOne(docmodel::request::FindOne {
            filter: Some(doc! { "_id": { "$oid": "A" }, "x": 1 }),
            ..Default::default()
        })]
    );
}

#[tokio::test]
async fn update_without_match_returns_none_and_changes_nothing() {
    let store = DataStore::new(RecordingBackend::default());
    let tasks = store.model::<Task>("tasks");
    tasks.create(task("keep", 0)).await.unwrap();
    let before = store.backend().store.snapshot("tasks").await;

    let updated = tasks
        .update(UpdateParams::new(
            doc! { "title": "nonexistent-value" },
            doc! { "x": 1 },
        ))
        .await
        .unwrap();

    assert_eq!(updated, None);
    assert_eq!(store.backend().store.snapshot("tasks").await, before);
    assert!(
        !store
            .backend()
            .calls()
            .iter()
            .any(|call| matches!(call, Call::FindOne(_)))
    );
}

#[tokio::test]
async fn update_returns_state_read_after_write() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Identified<Task>>("tasks");
    tasks
        .create(Identified::new("A", task("write", 0)))
        .await
        .unwrap();

    let updated = tasks
        .update(UpdateParams::new(doc! { "_id": "A" }, doc! { "x": 5 }))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, "A");
    assert_eq!(updated.document.x, 5);

    let found = tasks
        .find(FindParams::new().filter(doc! { "_id": "A" }))
        .await
        .unwrap();
    assert_eq!(found, Some(updated));
}

#[tokio::test]
async fn update_that_changes_nothing_returns_none() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Task>("tasks");
    let created = tasks.create(task("write", 3)).await.unwrap();

    let updated = tasks
        .update(UpdateParams::new(doc! { "_id": created.id.clone() }, doc! { "x": 3 }))
        .await
        .unwrap();

    assert_eq!(updated, None);
}

#[tokio::test]
async fn delete_is_keyed_by_the_found_id_only() {
    let store = DataStore::new(RecordingBackend::default());
    let tasks = store.model::<Task>("tasks");
    let first = tasks.create(task("chore", 1)).await.unwrap();
    tasks.create(task("chore", 2)).await.unwrap();
    store.backend().clear();

    let deleted = tasks
        .delete(DeleteParams::new(doc! { "title": "chore" }))
        .await
        .unwrap();

    assert_eq!(deleted, Some(task("chore", 1)));

    let deletes: Vec<Document> = store
        .backend()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::DeleteOne(request) => Some(request.filter),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, vec![tagged(&first.id)]);

    let remaining = store.backend().store.snapshot("tasks").await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get("x"), Some(&Bson::Int32(2)));
}

#[tokio::test]
async fn delete_without_match_issues_no_delete() {
    let store = DataStore::new(RecordingBackend::default());
    let tasks = store.model::<Task>("tasks");

    let deleted = tasks
        .delete(DeleteParams::new(doc! { "title": "missing" }))
        .await
        .unwrap();

    assert_eq!(deleted, None);
    assert!(
        store
            .backend()
            .calls()
            .iter()
            .all(|call| !matches!(call, Call::DeleteOne(_)))
    );
}

#[tokio::test]
async fn count_on_empty_collection_is_unexpected_empty_result() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Task>("tasks");

    let err = tasks.count().await.unwrap_err();

    assert!(matches!(err, DataApiError::UnexpectedEmptyResult(_)));
}

#[tokio::test]
async fn count_and_count_where() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Task>("tasks");
    let first = tasks.create(task("a", 1)).await.unwrap();
    tasks.create(task("b", 2)).await.unwrap();
    tasks.create(task("c", 2)).await.unwrap();

    assert_eq!(tasks.count().await.unwrap(), 3);
    assert_eq!(tasks.count_where(doc! { "x": 2 }).await.unwrap(), 2);
    assert_eq!(tasks.count_where(doc! { "_id": first.id.clone() }).await.unwrap(), 1);
}

#[tokio::test]
async fn find_many_forwards_sort_and_paging() {
    let store = DataStore::new(InMemoryStore::new());
    let tasks = store.model::<Task>("tasks");
    for (title, x) in [("a", 3), ("b", 1), ("c", 2)] {
        tasks.create(task(title, x)).await.unwrap();
    }

    let page = tasks
        .find_many(
            FindManyParams::new()
                .filter(doc! { "x": { "$gte": 1 } })
                .sort(doc! { "x": 1 })
                .skip(1)
                .limit(1),
        )
        .await
        .unwrap();

    assert_eq!(page, vec![task("c", 2)]);
}

#[tokio::test]
async fn models_share_one_backend_but_not_collections() {
    let store = DataStore::new(InMemoryStore::new());
    store.model::<Task>("tasks").create(task("t", 1)).await.unwrap();
    store
        .documents("notes")
        .create(doc! { "body": "hello" })
        .await
        .unwrap();

    assert_eq!(store.model::<Task>("tasks").count().await.unwrap(), 1);
    assert_eq!(store.documents("notes").count().await.unwrap(), 1);

    store.shutdown().await.unwrap();
}
