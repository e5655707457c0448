use async_trait::async_trait;
use relic_record::{
    AdapterError, Attributes, Direction, FetchOptions, FetchedRecord, GetRecordOptions,
    PersistenceAdapter, RecordError, RecordSchema, RelationshipDefinition, RelationshipSnapshot,
    TypeRegistration, TypeRegistry,
};
use relic_testing::fixtures::{self, COMIC_ID};
use relic_testing::{init_test_logging, AdapterCall, HookRecorder, MemoryAdapter};
use serde_json::{json, Value};

fn object(value: Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

fn seeded() -> (TypeRegistry, MemoryAdapter) {
    init_test_logging();
    let adapter = MemoryAdapter::new();
    adapter.seed("Comic", COMIC_ID, object(fixtures::comic()));

    let mut links = RelationshipSnapshot::new();
    links.set_list(
        Direction::Has,
        "Character",
        vec![fixtures::character(), fixtures::second_character()],
    );
    links.set_list(Direction::BelongsTo, "Creator", vec![fixtures::creator()]);
    adapter.seed_links("Comic", COMIC_ID, links);

    let registry = fixtures::comic_registry(&adapter).unwrap();
    (registry, adapter)
}

#[tokio::test]
async fn test_fetch_without_include() {
    let (registry, adapter) = seeded();
    let comic = registry.create("Comic", json!({"id": COMIC_ID})).unwrap();

    let fetched = comic.fetch(FetchOptions::new()).await.unwrap();

    assert_eq!(adapter.call_count(), 1);
    match adapter.last_call() {
        Some(AdapterCall::Get { attributes, options }) => {
            assert_eq!(attributes["id"], json!(COMIC_ID));
            assert!(options.include.is_none());
        }
        other => panic!("Expected get call, got {:?}", other),
    }

    assert_eq!(fetched.id(), Some(COMIC_ID));
    assert_eq!(fetched.get("pageCount"), Some(&json!(32)));
    assert!(fetched
        .relationships()
        .get(Direction::Has, "Character")
        .is_empty());
    assert!(fetched
        .relationships()
        .get(Direction::BelongsTo, "Creator")
        .is_empty());
    assert_eq!(comic.get("pageCount"), Some(&Value::Null));
}

#[tokio::test]
async fn test_fetch_with_include() {
    let (registry, adapter) = seeded();
    let comic = registry.create("Comic", json!({"id": COMIC_ID})).unwrap();

    let fetched = comic
        .fetch(FetchOptions::include("hasCharacter belongsToCreator"))
        .await
        .unwrap();

    match adapter.last_call() {
        Some(AdapterCall::Get { options, .. }) => {
            assert_eq!(
                options.include,
                Some(vec![
                    RelationshipDefinition::has("Character"),
                    RelationshipDefinition::belongs_to("Creator"),
                ])
            );
            assert_eq!(
                serde_json::to_value(&options).unwrap(),
                json!({"include": [
                    {"direction": "has", "type": "Character"},
                    {"direction": "belongsTo", "type": "Creator"}
                ]})
            );
        }
        other => panic!("Expected get call, got {:?}", other),
    }

    let characters = fetched.relationships().get(Direction::Has, "Character");
    assert_eq!(characters.len(), 2);
    assert_eq!(characters[0].type_name(), "Character");
    assert_eq!(characters[0].get("name"), Some(&json!("Amiko")));

    let creators = fetched.relationships().get(Direction::BelongsTo, "Creator");
    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0].type_name(), "Creator");
    assert_eq!(creators[0].get("firstName"), Some(&json!("Chris")));
}

#[tokio::test]
async fn test_fetch_with_include_and_no_items() {
    init_test_logging();
    let adapter = MemoryAdapter::new();
    adapter.seed("Comic", COMIC_ID, object(fixtures::comic()));
    let registry = fixtures::comic_registry(&adapter).unwrap();

    let fetched = registry
        .create("Comic", json!({"id": COMIC_ID}))
        .unwrap()
        .fetch(FetchOptions::include("hasCharacter belongsToCreator"))
        .await
        .unwrap();

    assert_eq!(fetched.relationships().get(Direction::Has, "Character").len(), 0);
    assert_eq!(fetched.relationships().get(Direction::BelongsTo, "Creator").len(), 0);
}

#[tokio::test]
async fn test_blank_include_is_treated_as_absent() {
    let (registry, adapter) = seeded();
    let comic = registry.create("Comic", json!({"id": COMIC_ID})).unwrap();

    comic.fetch(FetchOptions::include("  ")).await.unwrap();

    match adapter.last_call() {
        Some(AdapterCall::Get { options, .. }) => assert!(options.include.is_none()),
        other => panic!("Expected get call, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_rejects_undeclared_include() {
    let (registry, adapter) = seeded();
    let comic = registry.create("Comic", json!({"id": COMIC_ID})).unwrap();

    match comic.fetch(FetchOptions::include("hasCharacter hasSeries")).await {
        Err(RecordError::UndeclaredRelationship { type_name, definition }) => {
            assert_eq!(type_name, "Comic");
            assert_eq!(definition, "hasSeries");
        }
        other => panic!("Expected undeclared relationship, got {:?}", other),
    }
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn test_fetch_without_id_fails_before_adapter() {
    let (registry, adapter) = seeded();
    let comic = registry.create("Comic", json!({"title": "X"})).unwrap();

    match comic.fetch(FetchOptions::new()).await {
        Err(RecordError::MissingId { type_name, operation }) => {
            assert_eq!(type_name, "Comic");
            assert_eq!(operation, "fetch");
        }
        other => panic!("Expected missing id, got {:?}", other),
    }
    assert_eq!(adapter.call_count(), 0);
}

#[tokio::test]
async fn test_fetch_unknown_record_propagates_adapter_error() {
    let (registry, _adapter) = seeded();
    let comic = registry.create("Comic", json!({"id": "99999"})).unwrap();

    let result = comic.fetch(FetchOptions::new()).await;
    assert!(matches!(
        result,
        Err(RecordError::Adapter(AdapterError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_before_fetch_hook_runs_first() {
    init_test_logging();
    let adapter = MemoryAdapter::new();
    adapter.seed("Comic", COMIC_ID, object(fixtures::comic()));
    let recorder = HookRecorder::new();
    recorder.fail(HookRecorder::BEFORE_FETCH, "not allowed");
    let registry = fixtures::comic_registry_with_hooks(&adapter, recorder.hooks()).unwrap();

    let result = registry
        .create("Comic", json!({"id": COMIC_ID}))
        .unwrap()
        .fetch(FetchOptions::new())
        .await;

    assert!(matches!(result, Err(RecordError::Hook(_))));
    assert_eq!(recorder.names(), vec![HookRecorder::BEFORE_FETCH]);
    assert_eq!(recorder.calls()[0].attributes["id"], json!(COMIC_ID));
    assert_eq!(adapter.call_count(), 0);
}

/// Serves one payload regardless of the requested record
struct StaticPayload(Value);

#[async_trait]
impl PersistenceAdapter for StaticPayload {
    async fn get_record(
        &self,
        _attributes: &Attributes,
        _options: &GetRecordOptions,
    ) -> Result<FetchedRecord, AdapterError> {
        FetchedRecord::from_value(self.0.clone())
            .map_err(|e| AdapterError::storage(e.to_string()))
    }
}

#[tokio::test]
async fn test_payload_without_id_keeps_requested_id() {
    init_test_logging();
    let registry = TypeRegistry::new();
    registry
        .register(
            TypeRegistration::new(
                RecordSchema::builder("Creator")
                    .defaults(json!({"firstName": null, "lastName": null}))
                    .build()
                    .unwrap(),
            )
            .adapter(StaticPayload(json!({"firstName": "Chris", "lastName": "Claremont"}))),
        )
        .unwrap();

    let creator = registry
        .create("Creator", json!({"id": 44}))
        .unwrap()
        .fetch(FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(creator.id(), Some("44"));
    assert_eq!(creator.get("firstName"), Some(&json!("Chris")));
}

#[tokio::test]
async fn test_payload_relationship_blocks_are_materialized() {
    init_test_logging();
    let registry = TypeRegistry::new();
    registry
        .register(
            TypeRegistration::new(fixtures::comic_schema().unwrap()).adapter(StaticPayload(json!({
                "id": COMIC_ID,
                "title": "Fetched",
                "relationships": [
                    {"direction": "has", "type": "Character", "items": ["1009151", {"id": "1009718"}]}
                ]
            }))),
        )
        .unwrap();
    registry.register(fixtures::character_schema().unwrap()).unwrap();
    registry.register(fixtures::creator_schema().unwrap()).unwrap();

    let comic = registry
        .create("Comic", json!({"id": COMIC_ID}))
        .unwrap()
        .fetch(FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(comic.get("title"), Some(&json!("Fetched")));
    let ids: Vec<_> = comic
        .relationships()
        .get(Direction::Has, "Character")
        .iter()
        .map(|c| c.id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["1009151", "1009718"]);
    assert!(comic
        .relationships()
        .get(Direction::BelongsTo, "Creator")
        .is_empty());
}

#[tokio::test]
async fn test_undeclared_fetched_columns_are_dropped() {
    init_test_logging();
    let registry = TypeRegistry::new();
    registry
        .register(
            TypeRegistration::new(
                RecordSchema::builder("Creator")
                    .defaults(json!({"firstName": null}))
                    .build()
                    .unwrap(),
            )
            .adapter(StaticPayload(json!({
                "id": "44",
                "type": "Creator",
                "firstName": "Chris",
                "updatedAt": "2024-01-01"
            }))),
        )
        .unwrap();

    let creator = registry
        .create("Creator", json!({"id": "44"}))
        .unwrap()
        .fetch(FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(creator.get("firstName"), Some(&json!("Chris")));
    assert!(!creator.has("updatedAt"));
    assert!(!creator.to_flat_attributes().contains_key("updatedAt"));
}
