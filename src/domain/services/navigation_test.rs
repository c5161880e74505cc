use std::sync::Arc;

use anyhow::Result;

use super::Router;
use super::LANDING_PATH;
use crate::domain::models::Navigation;
use crate::domain::models::RouteName;
use crate::domain::models::Storage;
use crate::domain::models::StorageArc;
use crate::domain::models::TOKEN_KEY;
use crate::domain::models::USER_KEY;
use crate::domain::services::fake_gateway::FakeGateway;
use crate::domain::services::SessionStore;
use crate::infrastructure::storage::memory::MemoryStorage;

fn session(storage: &StorageArc) -> SessionStore {
    return SessionStore::new(Arc::new(FakeGateway::default()), storage.clone());
}

fn signed_in_storage() -> Result<StorageArc> {
    let storage: StorageArc = Arc::new(MemoryStorage::default());
    storage.set_item(TOKEN_KEY, "t1")?;
    storage.set_item(USER_KEY, r#"{"id":1}"#)?;
    return Ok(storage);
}

#[test]
fn it_resolves_static_routes() {
    let router = Router::default();

    assert_eq!(router.resolve("/").map(|e| return e.route.name), Some(RouteName::Home));
    assert_eq!(
        router.resolve("/todos/").map(|e| return e.route.name),
        Some(RouteName::TodoList)
    );
    assert_eq!(router.resolve("/nope"), None);
}

#[test]
fn it_passes_the_id_segment_through() {
    let router = Router::default();
    let res = router.resolve("/todo/42?tab=details").unwrap();

    assert_eq!(res.route.name, RouteName::TodoDetail);
    assert_eq!(res.id, Some("42".to_string()));
    assert_eq!(res.path, "/todo/42");
}

#[test]
fn it_lets_guests_open_auth_pages() {
    let storage: StorageArc = Arc::new(MemoryStorage::default());
    let session = session(&storage);

    let res = Router::default().navigate("/login", &session).unwrap();

    match res {
        Navigation::Proceed(target) => assert_eq!(target.route.name, RouteName::Login),
        Navigation::Redirect(_) => panic!("guest should not be redirected"),
    }
}

#[test]
fn it_redirects_signed_in_users_from_auth_pages() -> Result<()> {
    let storage = signed_in_storage()?;
    let session = session(&storage);

    let res = Router::default().navigate("/register", &session);

    assert_eq!(res, Some(Navigation::Redirect(LANDING_PATH.to_string())));
    return Ok(());
}

#[test]
fn it_lets_signed_in_users_open_other_pages() -> Result<()> {
    let storage = signed_in_storage()?;
    let session = session(&storage);

    let res = Router::default().navigate("/todo/7", &session);

    assert!(matches!(res, Some(Navigation::Proceed(_))));
    return Ok(());
}

#[test]
fn it_rehydrates_before_deciding() -> Result<()> {
    let storage: StorageArc = Arc::new(MemoryStorage::default());
    let session = session(&storage);
    assert!(!session.is_authenticated());

    storage.set_item(TOKEN_KEY, "t1")?;
    storage.set_item(USER_KEY, r#"{"id":1}"#)?;
    let res = Router::default().navigate("/login", &session);

    assert_eq!(res, Some(Navigation::Redirect(LANDING_PATH.to_string())));
    assert!(session.is_authenticated());
    return Ok(());
}

#[test]
fn it_treats_corrupt_sessions_as_guests() -> Result<()> {
    let storage: StorageArc = Arc::new(MemoryStorage::default());
    storage.set_item(TOKEN_KEY, "t1")?;
    storage.set_item(USER_KEY, "garbage")?;
    let session = session(&storage);

    let res = Router::default().navigate("/login", &session);

    assert!(matches!(res, Some(Navigation::Proceed(_))));
    assert_eq!(storage.get_item(TOKEN_KEY), None);
    return Ok(());
}
