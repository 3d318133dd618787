//! Cross-module tests: resolution, the facade and their storage contract

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::query::ResourceQuery;
use crate::storage::{
    NewResource, OpenStore, ResourceFilter, SqliteStore, StorageError, StorageResult, TagStore,
};
use crate::tag::{
    ClassSpec, Relation, RelationKey, Resolver, Resource, ResourceFields, ResourceId, ResourceSpec,
    Role, TagEngine, TagError,
};

/// A store whose every method fails; proves code paths that must not
/// touch storage.
struct UnreachableStore;

fn untouchable() -> StorageError {
    StorageError::Io(std::io::Error::other("store must not be touched"))
}

impl TagStore for UnreachableStore {
    fn find_resource(&self, _: &ResourceFilter) -> StorageResult<Option<Resource>> {
        Err(untouchable())
    }
    fn insert_resource(&self, _: &NewResource) -> StorageResult<Option<ResourceId>> {
        Err(untouchable())
    }
    fn update_resource(&self, _: ResourceId, _: &NewResource) -> StorageResult<usize> {
        Err(untouchable())
    }
    fn delete_resource(&self, _: ResourceId) -> StorageResult<usize> {
        Err(untouchable())
    }
    fn find_resources(&self, _: &ResourceQuery) -> StorageResult<Vec<Resource>> {
        Err(untouchable())
    }
    fn fetch_relation(&self, _: &RelationKey) -> StorageResult<Option<Relation>> {
        Err(untouchable())
    }
    fn create_relation(&self, _: &RelationKey) -> StorageResult<usize> {
        Err(untouchable())
    }
    fn delete_relation(&self, _: &RelationKey) -> StorageResult<usize> {
        Err(untouchable())
    }
}

/// Delegates to an inner store but pretends the first `misses` lookups
/// found nothing, simulating a concurrent writer sneaking in between the
/// resolver's lookup and its insert.
struct RacingStore {
    inner: SqliteStore,
    misses: AtomicUsize,
}

impl TagStore for RacingStore {
    fn find_resource(&self, filter: &ResourceFilter) -> StorageResult<Option<Resource>> {
        let remaining = self.misses.load(Ordering::SeqCst);
        if remaining > 0 {
            self.misses.store(remaining - 1, Ordering::SeqCst);
            return Ok(None);
        }
        self.inner.find_resource(filter)
    }
    fn insert_resource(&self, attrs: &NewResource) -> StorageResult<Option<ResourceId>> {
        self.inner.insert_resource(attrs)
    }
    fn update_resource(&self, id: ResourceId, attrs: &NewResource) -> StorageResult<usize> {
        self.inner.update_resource(id, attrs)
    }
    fn delete_resource(&self, id: ResourceId) -> StorageResult<usize> {
        self.inner.delete_resource(id)
    }
    fn find_resources(&self, query: &ResourceQuery) -> StorageResult<Vec<Resource>> {
        self.inner.find_resources(query)
    }
    fn fetch_relation(&self, key: &RelationKey) -> StorageResult<Option<Relation>> {
        self.inner.fetch_relation(key)
    }
    fn create_relation(&self, key: &RelationKey) -> StorageResult<usize> {
        self.inner.create_relation(key)
    }
    fn delete_relation(&self, key: &RelationKey) -> StorageResult<usize> {
        self.inner.delete_relation(key)
    }
}

fn test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

fn resource_count(store: &SqliteStore) -> usize {
    store.find_resources(&ResourceQuery::new()).unwrap().len()
}

fn raw_key(s: i64, p: i64, o: i64, c: i64) -> RelationKey {
    RelationKey::new(
        ResourceId::new(s),
        ResourceId::new(p),
        ResourceId::new(o),
        ResourceId::new(c),
    )
    .unwrap()
}

#[test]
fn reserved_ids_resolve_without_storage() {
    let store = UnreachableStore;
    let resolver = Resolver::new(&store);

    let root = resolver.fetch_by_id(ResourceId::ROOT).unwrap().unwrap();
    assert_eq!(root.value.as_deref(), Some("taggg"));
    assert_eq!(root.class, Some(ResourceId::ROOT));

    let class = resolver.fetch(&ResourceSpec::from(2)).unwrap().unwrap();
    assert_eq!(class.value.as_deref(), Some("class"));
}

#[test]
fn non_positive_ids_never_match() {
    let store = UnreachableStore;
    let resolver = Resolver::new(&store);

    assert_eq!(resolver.fetch_by_id(ResourceId::EMPTY).unwrap(), None);
    assert_eq!(resolver.fetch_by_id(ResourceId::new(-5)).unwrap(), None);
}

#[test]
fn unknown_id_is_not_found() {
    let store = test_store();
    let resolver = Resolver::new(store.as_ref());

    assert_eq!(resolver.fetch(&ResourceSpec::from(999999)).unwrap(), None);
}

#[test]
fn fetch_never_creates() {
    let store = test_store();
    let resolver = Resolver::new(store.as_ref());
    let before = resource_count(&store);

    assert_eq!(resolver.fetch(&ResourceSpec::parse("dc:title")).unwrap(), None);
    assert_eq!(resolver.fetch(&ResourceSpec::parse("loose-value")).unwrap(), None);
    assert_eq!(resource_count(&store), before);
}

#[test]
fn resolve_or_create_deduplicates_by_content() {
    let store = test_store();
    let resolver = Resolver::new(store.as_ref());
    let fields = ResourceSpec::parse("dc:title").to_fields().unwrap();
    let before = resource_count(&store);

    let first = resolver.resolve_or_create(&fields).unwrap();
    assert!(first.was_created());

    let second = resolver.resolve_or_create(&fields).unwrap();
    assert!(!second.was_created());
    assert_eq!(second.resource().id, first.resource().id);

    // One class resource plus one value resource, created once
    assert_eq!(resource_count(&store), before + 2);
}

#[test]
fn class_auto_creation_files_under_the_meta_class() {
    let store = test_store();
    let resolver = Resolver::new(store.as_ref());
    let fields = ResourceSpec::parse("dc:title").to_fields().unwrap();

    let title = resolver.resolve_or_create(&fields).unwrap().into_resource();

    let dc = resolver.fetch_class("dc").unwrap().unwrap();
    assert_eq!(dc.class, Some(ResourceId::CLASS));
    assert_eq!(title.class, Some(dc.id));
}

#[test]
fn duplicate_uri_insert_resolves_to_the_winner() {
    let inner = SqliteStore::open_in_memory().unwrap();
    let winner = inner
        .insert_resource(&NewResource {
            uri: Some("http://x/".to_string()),
            ..Default::default()
        })
        .unwrap()
        .unwrap();

    // The resolver's first lookup misses, its insert is ignored because
    // the uri already exists, and the follow-up fetch finds the winner.
    let store = RacingStore {
        inner,
        misses: AtomicUsize::new(1),
    };
    let resolver = Resolver::new(&store);
    let resolved = resolver
        .resolve_or_create(&ResourceFields::new().with_uri("http://x/"))
        .unwrap();

    assert!(!resolved.was_created());
    assert_eq!(resolved.resource().id, winner);
}

#[test]
fn invalid_class_id_is_rejected() {
    let store = test_store();
    let resolver = Resolver::new(store.as_ref());
    let fields = ResourceFields::new()
        .with_class(ClassSpec::Id(ResourceId::new(-1)))
        .with_value("x");

    assert!(matches!(
        resolver.fetch_fields(&fields),
        Err(TagError::InvalidClass(_))
    ));
    assert!(matches!(
        resolver.resolve_or_create(&fields),
        Err(TagError::InvalidClass(_))
    ));
}

#[test]
fn write_exists_erase_roundtrip() {
    let store = test_store();
    let engine = TagEngine::new(store);

    engine.write(1, "dc:title", "Hello", 1).unwrap();
    assert!(engine.exists(1, "dc:title", "Hello", 1).unwrap());

    engine.erase(1, "dc:title", "Hello", 1).unwrap();
    assert!(!engine.exists(1, "dc:title", "Hello", 1).unwrap());
}

#[test]
fn write_is_idempotent() {
    let store = test_store();
    let engine = TagEngine::new(store);

    engine.write(1, "dc:title", "Hello", 1).unwrap();
    engine.write(1, "dc:title", "Hello", 1).unwrap();

    // A single erase clears the single underlying row
    engine.erase(1, "dc:title", "Hello", 1).unwrap();
    assert!(!engine.exists(1, "dc:title", "Hello", 1).unwrap());

    // Erasing again is still fine
    engine.erase(1, "dc:title", "Hello", 1).unwrap();
}

#[test]
fn empty_subject_never_writes_a_relation() {
    let store = test_store();
    let engine = TagEngine::new(store.clone());

    engine.write(ResourceSpec::Empty, 1, 2, ResourceSpec::Empty).unwrap();
    assert_eq!(store.fetch_relation(&raw_key(0, 1, 2, 0)).unwrap(), None);
}

#[test]
fn empty_predicate_and_object_never_write_a_relation() {
    let store = test_store();
    let engine = TagEngine::new(store.clone());

    engine.write(1, ResourceSpec::Empty, ResourceSpec::Empty, 2).unwrap();
    assert_eq!(store.fetch_relation(&raw_key(1, 0, 0, 2)).unwrap(), None);
}

#[test]
fn partial_resource_creation_persists_on_failure() {
    let store = test_store();
    let engine = TagEngine::new(store.clone());

    // Subject and predicate resolve (creating the predicate resource)
    // before the object id fails the call
    let err = engine
        .write(1, "dangling-value", ResourceSpec::from(999999), 1)
        .unwrap_err();
    assert!(matches!(err, TagError::InvalidId(id) if id.raw() == 999999));

    let resolver = Resolver::new(store.as_ref());
    assert!(resolver
        .fetch(&ResourceSpec::parse("dangling-value"))
        .unwrap()
        .is_some());
}

#[test]
fn roles_resolve_in_declaration_order() {
    let store = test_store();
    let engine = TagEngine::new(store.clone());

    // The subject fails first, so the predicate resource is never created
    let err = engine
        .write(ResourceSpec::from(999999), "never-created", ResourceSpec::Empty, 1)
        .unwrap_err();
    assert!(matches!(err, TagError::InvalidId(_)));

    let resolver = Resolver::new(store.as_ref());
    assert_eq!(
        resolver.fetch(&ResourceSpec::parse("never-created")).unwrap(),
        None
    );
}

#[test]
fn erase_by_id_does_not_require_existence() {
    let store = test_store();
    let engine = TagEngine::new(store);

    engine.erase(999, 998, ResourceSpec::Empty, ResourceSpec::Empty).unwrap();
}

#[test]
fn erase_of_unknown_resource_is_a_noop_success() {
    let store = test_store();
    let engine = TagEngine::new(store.clone());

    engine
        .erase(
            1,
            "no-such-class:no-such-value",
            ResourceSpec::Empty,
            ResourceSpec::Empty,
        )
        .unwrap();

    // No resource was created as a side effect of the erase
    let resolver = Resolver::new(store.as_ref());
    assert_eq!(resolver.fetch_class("no-such-class").unwrap(), None);
}

#[test]
fn exists_of_unknown_resource_is_false() {
    let store = test_store();
    let engine = TagEngine::new(store);

    assert!(!engine
        .exists(1, "no-such-class:no-such-value", ResourceSpec::Empty, ResourceSpec::Empty)
        .unwrap());
}

#[test]
fn negative_id_surfaces_as_invalid_role_id_on_erase() {
    let store = test_store();
    let engine = TagEngine::new(store);

    let err = engine
        .erase(ResourceSpec::from(-3), 1, ResourceSpec::Empty, ResourceSpec::Empty)
        .unwrap_err();
    assert!(matches!(
        err,
        TagError::InvalidRoleId {
            role: Role::Subject,
            ..
        }
    ));
}

#[test]
fn negative_id_surfaces_as_invalid_id_on_write() {
    let store = test_store();
    let engine = TagEngine::new(store);

    let err = engine
        .write(ResourceSpec::from(-3), 1, ResourceSpec::Empty, ResourceSpec::Empty)
        .unwrap_err();
    assert!(matches!(err, TagError::InvalidId(id) if id.raw() == -3));
}

#[test]
fn structured_record_and_uri_string_address_the_same_resource() {
    let store = test_store();
    let engine = TagEngine::new(store);

    engine
        .write(
            ResourceFields::new().with_uri("http://google.com/"),
            "dc:description",
            "web search engine",
            1,
        )
        .unwrap();

    assert!(engine
        .exists("uri:http://google.com/", "dc:description", "web search engine", 1)
        .unwrap());
}

#[test]
fn empty_string_is_a_resolvable_value() {
    let store = test_store();
    let engine = TagEngine::new(store);

    engine.write(1, "", ResourceSpec::Empty, 1).unwrap();
    assert!(engine.exists(1, "", ResourceSpec::Empty, 1).unwrap());
}

#[test]
fn write_calls_chain() {
    fn tag_both(engine: &TagEngine) -> crate::tag::TagResult<()> {
        engine.write(1, "a:b", "c", 1)?.write(1, "d:e", "f", 1)?;
        Ok(())
    }

    let store = test_store();
    let engine = TagEngine::new(store);

    tag_both(&engine).unwrap();
    assert!(engine.exists(1, "a:b", "c", 1).unwrap());
    assert!(engine.exists(1, "d:e", "f", 1).unwrap());
}

#[test]
fn engine_fetch_honors_the_configured_query() {
    let store = test_store();
    let engine = TagEngine::new(store).with_fetch_query(ResourceQuery::new().limit(2));

    // Three reserved resources exist; the limit caps the report
    assert_eq!(engine.fetch().unwrap().len(), 2);
}
