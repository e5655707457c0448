//! Comic-book fixtures: a `Character` / `Comic` / `Creator` registry and
//! JSON records to populate it with.

use relic_record::{LifecycleHooks, RecordSchema, TypeRegistration, TypeRegistry};
use serde_json::{json, Value};

use crate::{MemoryAdapter, TestError, TestResult};

pub const CHARACTER_ID: &str = "1009151";
pub const SECOND_CHARACTER_ID: &str = "1009718";
pub const COMIC_ID: &str = "13722";
pub const CREATOR_ID: &str = "44";

/// Character 1009151, belonging to comic 13722
pub fn character() -> Value {
    json!({
        "id": 1009151,
        "name": "Amiko",
        "description": "",
        "modified": "2011-03-30T16:20:01-0400",
        "thumbnail": {
            "path": "http://i.annihil.us/u/prod/marvel/i/mg/b/40/image_not_available",
            "extension": "jpg"
        },
        "resourceURI": "http://gateway.marvel.com/v1/public/characters/1009151",
        "urls": [
            {"type": "detail", "url": "http://marvel.com/characters/2809/amiko"},
            {"type": "wiki", "url": "http://marvel.com/universe/Amiko"}
        ],
        "relationships": {
            "belongsTo": {
                "Comic": [
                    {"id": "13722", "title": "X-Men: Kitty Pryde - Shadow & Flame (2005) #4"}
                ]
            }
        }
    })
}

/// Character 1009718, without relationships
pub fn second_character() -> Value {
    json!({
        "id": "1009718",
        "name": "Wolverine",
        "description": "Born with super-human senses and the power to heal.",
        "modified": "2016-05-02T12:21:44-0400",
        "resourceURI": "http://gateway.marvel.com/v1/public/characters/1009718",
        "urls": [
            {"type": "detail", "url": "http://marvel.com/characters/66/wolverine"}
        ]
    })
}

/// Comic 13722, attributes only
pub fn comic() -> Value {
    json!({
        "id": "13722",
        "title": "X-Men: Kitty Pryde - Shadow & Flame (2005) #4",
        "pageCount": 32
    })
}

/// Creator 44
pub fn creator() -> Value {
    json!({
        "id": 44,
        "firstName": "Chris",
        "lastName": "Claremont",
        "thumbnail": {
            "path": "http://i.annihil.us/u/prod/marvel/i/mg/6/60/4c0032ae1f6ad",
            "extension": "jpg"
        }
    })
}

/// Look a fixture up by `<type>-<id>` name
pub fn fixture(name: &str) -> TestResult<Value> {
    match name {
        "character-1009151" => Ok(character()),
        "character-1009718" => Ok(second_character()),
        "comic-13722" => Ok(comic()),
        "creator-44" => Ok(creator()),
        _ => Err(TestError::Setup(format!("no fixture named {}", name))),
    }
}

/// Copy of a fixture without its id, as a new record would carry
pub fn without_id(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    value
}

/// Copy of a fixture without its relationships
pub fn without_relationships(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("relationships");
    }
    value
}

pub fn character_schema() -> TestResult<RecordSchema> {
    Ok(RecordSchema::builder("Character")
        .defaults(json!({
            "name": null,
            "description": null,
            "modified": null,
            "thumbnail": null,
            "resourceURI": null,
            "urls": []
        }))
        .relationships("belongsToComic")
        .build()?)
}

pub fn comic_schema() -> TestResult<RecordSchema> {
    Ok(RecordSchema::builder("Comic")
        .defaults(json!({"title": null, "pageCount": null}))
        .relationships("hasCharacter belongsToCreator")
        .build()?)
}

pub fn creator_schema() -> TestResult<RecordSchema> {
    Ok(RecordSchema::builder("Creator")
        .defaults(json!({"firstName": null, "lastName": null, "thumbnail": null}))
        .relationships("hasComic")
        .build()?)
}

/// Registry with all three types stored in `adapter`
pub fn comic_registry(adapter: &MemoryAdapter) -> TestResult<TypeRegistry> {
    comic_registry_with_hooks(adapter, LifecycleHooks::new())
}

/// Registry with all three types stored in `adapter`, each running `hooks`
pub fn comic_registry_with_hooks(
    adapter: &MemoryAdapter,
    hooks: LifecycleHooks,
) -> TestResult<TypeRegistry> {
    let registry = TypeRegistry::new()
        .with_adapter(adapter.clone())
        .with_hooks(hooks);

    registry.register(character_schema()?)?;
    registry.register(comic_schema()?)?;
    registry.register(creator_schema()?)?;
    Ok(registry)
}

/// Registry whose `Comic` type alone uses `adapter` and `hooks`
pub fn comic_registry_with_comic_overrides(
    adapter: &MemoryAdapter,
    hooks: LifecycleHooks,
) -> TestResult<TypeRegistry> {
    let registry = TypeRegistry::new();

    registry.register(character_schema()?)?;
    registry.register(
        TypeRegistration::new(comic_schema()?)
            .adapter(adapter.clone())
            .hooks(hooks),
    )?;
    registry.register(creator_schema()?)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_construct() {
        let adapter = MemoryAdapter::new();
        let registry = comic_registry(&adapter).unwrap();

        let amiko = registry.create("Character", character()).unwrap();
        assert_eq!(amiko.id(), Some(CHARACTER_ID));
        assert_eq!(amiko.relationships().belongs_to()["Comic"].len(), 1);

        for name in ["character-1009718", "comic-13722", "creator-44"] {
            let value = fixture(name).unwrap();
            let type_name = match name.split('-').next() {
                Some("character") => "Character",
                Some("comic") => "Comic",
                _ => "Creator",
            };
            assert!(registry.create(type_name, value).is_ok());
        }
    }

    #[test]
    fn test_unknown_fixture() {
        assert!(matches!(fixture("series-1"), Err(TestError::Setup(_))));
    }
}
