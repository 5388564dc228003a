//! End-to-end behaviour of `get`, `is_` and `can`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use abacus::{
    Actor, CacheEntry, Engine, Error, Expected, Principal, Registry, Request, RoleError, RoleSet,
    Value,
};

#[derive(Debug)]
struct User {
    id: u64,
    age: i64,
}

impl Actor for User {
    type Id = u64;

    fn actor_id(&self) -> u64 {
        self.id
    }
}

fn bob(age: i64) -> User {
    User { id: 7, age }
}

fn counting_engine(calls: &Arc<AtomicUsize>) -> Engine<User> {
    let counter = Arc::clone(calls);
    let registry = Registry::new().with_principal(
        "user",
        Principal::new().with_init(move |entry: &CacheEntry, user: &User, _: Option<&()>| {
            counter.fetch_add(1, Ordering::SeqCst);
            entry.set_attribute("age", user.age);
            entry.set_attribute("name", "bob");
            Ok(None)
        }),
    );
    Engine::new(registry).without_audit()
}

#[test]
fn init_runs_once_per_actor() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);
    let user = bob(30);

    assert_eq!(engine.get("user", &user, "age", None).unwrap(), Some(Value::Int(30)));
    assert_eq!(
        engine.get("user", &user, "name", None).unwrap(),
        Some(Value::from("bob"))
    );
    engine.is_("user", &user, "age", 30, None).unwrap();
    assert!(engine.can("user", &user, "anything", None, None).unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn init_is_not_rerun_for_null_attributes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);
    let user = bob(30);

    assert_eq!(engine.get("user", &user, "missing", None).unwrap(), None);
    assert_eq!(engine.get("user", &user, "missing", None).unwrap(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn assertion_chain_short_circuits() {
    let ran = Arc::new(AtomicUsize::new(0));
    let second = Arc::clone(&ran);
    let third = Arc::clone(&ran);

    let registry = Registry::new().with_principal(
        "user",
        Principal::new()
            .with_assertion("delete", |_: &Request<'_, User>| Ok(false))
            .with_assertion("delete", move |_: &Request<'_, User>| {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            })
            .with_assertion("delete", move |_: &Request<'_, User>| {
                third.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
    );
    let engine: Engine<User> = Engine::new(registry).without_audit();

    assert!(!engine.can("user", &bob(30), "delete", None, None).unwrap());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn raised_denial_stops_the_chain() {
    let ran = Arc::new(AtomicUsize::new(0));
    let after = Arc::clone(&ran);

    let registry = Registry::new().with_principal(
        "user",
        Principal::new()
            .with_assertion("delete", |request: &Request<'_, User>| {
                Err(request.deny("not owner"))
            })
            .with_assertion("delete", move |_: &Request<'_, User>| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
    );
    let engine: Engine<User> = Engine::new(registry).without_audit();

    let err = engine.can("user", &bob(30), "delete", None, None).unwrap_err();
    assert_eq!(err.reasons(), ["not owner"]);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn deny_reason_round_trip() {
    let entry = CacheEntry::new();
    entry.set_deny_reason("delete", "not owner");

    assert_eq!(entry.get_deny_reason("delete"), vec!["not owner".to_string()]);
    assert_eq!(entry.get_deny_reason("update"), Vec::<String>::new());
}

#[test]
fn predicate_form_of_is() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);
    let adult = || Expected::matching(|v| v.and_then(Value::as_int).is_some_and(|age| age >= 18));

    let err = engine.is_("user", &bob(17), "age", adult(), None).unwrap_err();
    assert!(err.is_permission_denied());

    let other = User { id: 8, age: 18 };
    assert!(engine.is_("user", &other, "age", adult(), None).is_ok());
}

#[test]
fn denial_without_reasons_still_raises() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(&calls);

    let err = engine.is_("user", &bob(30), "is_admin", true, None).unwrap_err();
    match err {
        Error::PermissionDenied {
            key,
            reasons,
            message,
        } => {
            assert_eq!(key, "is_admin");
            assert!(reasons.is_empty());
            assert!(message.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn role_ordering() {
    let roles = RoleSet::builder("StaffRoles")
        .role("ROOT", 1)
        .role("ADMIN", 5)
        .role("USER", 10)
        .build()
        .unwrap();
    let root = roles.get("ROOT").unwrap();
    let admin = roles.get("ADMIN").unwrap();
    let user = roles.get("USER").unwrap();

    assert!(root < admin && admin < user);
    assert!(!(user <= admin));

    let err = RoleSet::builder("Broken")
        .role("X", 1)
        .role("Y", 1)
        .build()
        .unwrap_err();
    assert!(matches!(err, RoleError::DuplicateRank { .. }));
}

#[test]
fn empty_registry_is_permissive() {
    let engine: Engine<User> = Engine::new(Registry::new()).without_audit();

    assert!(engine.can("unknown_type", &bob(30), "anything", None, None).unwrap());
    assert_eq!(engine.get("unknown_type", &bob(30), "age", None).unwrap(), None);
}

#[test]
fn missing_and_null_attributes_both_read_as_none() {
    let registry = Registry::new().with_principal(
        "user",
        Principal::new().with_init(|entry: &CacheEntry, _: &User, _: Option<&()>| {
            entry.put_attribute("manager", None);
            Ok(None)
        }),
    );
    let engine: Engine<User> = Engine::new(registry).without_audit();
    let user = bob(30);

    assert_eq!(engine.get("user", &user, "manager", None).unwrap(), None);
    assert_eq!(engine.get("user", &user, "never_written", None).unwrap(), None);
}

#[test]
fn collaborator_errors_propagate_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("directory unavailable")]
    struct DirectoryDown;

    let registry = Registry::new().with_principal(
        "user",
        Principal::new()
            .with_init(|_: &CacheEntry, _: &User, _: Option<&()>| Err(Error::collaborator(DirectoryDown))),
    );
    let engine: Engine<User> = Engine::new(registry).without_audit();

    let err = engine.get("user", &bob(30), "age", None).unwrap_err();
    assert_eq!(err.to_string(), "directory unavailable");
    match err {
        Error::Collaborator(inner) => assert!(inner.is::<DirectoryDown>()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn resource_and_context_reach_assertions() {
    struct Document {
        owner: u64,
    }

    struct Session {
        elevated: bool,
    }

    let registry: Registry<User, Document, Session> = Registry::new().with_principal(
        "user",
        Principal::new()
            .with_init(|entry: &CacheEntry, _: &User, context: Option<&Session>| {
                entry.set_attribute("elevated", context.is_some_and(|s| s.elevated));
                Ok(None)
            })
            .with_assertion("edit", |request: &Request<'_, User, Document, Session>| {
                let owns = request
                    .resource()
                    .is_some_and(|doc| doc.owner == request.actor().id);
                if owns {
                    return Ok(true);
                }
                request.is_("elevated", true)
            }),
    );
    let engine = Engine::new(registry).without_audit();

    let own = Document { owner: 7 };
    let foreign = Document { owner: 99 };
    let session = Session { elevated: true };

    assert!(engine.can("user", &bob(30), "edit", Some(&own), None).unwrap());
    assert!(engine.can("user", &bob(30), "edit", Some(&foreign), None).is_err());

    let elevated = User { id: 8, age: 30 };
    assert!(
        engine
            .can("user", &elevated, "edit", Some(&foreign), Some(&session))
            .unwrap()
    );
}
