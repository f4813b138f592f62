//! End-to-end tests of the sync pipeline against in-memory bridges
//!
//! A valid token is stored up front, so the only HTTP traffic is the group
//! feed, the contact feed and photo downloads.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    Clock, Contact, ContactStore, FixedClock, HttpClient, HttpRequest, HttpResponse, Localizer,
    MessageKey, SettingValue, SettingsStore, UserId,
};
use core_auth::{AuthManager, OAuthClient, OAuthToken, TokenStore};
use core_runtime::config::{FeedSettings, OAuthClientSettings};
use core_runtime::i18n::EnglishCatalog;
use core_sync::SyncOrchestrator;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const NOW: i64 = 1_700_000_000;
const USER: UserId = UserId::new(7);

const GROUPS: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:gd='http://schemas.google.com/g/2005'>
  <entry gd:etag='"YDwqeyI."'>
    <id>http://www.google.com/m8/feeds/groups/ada%40example.org/base/6</id>
    <title>System Group: My Contacts</title>
  </entry>
</feed>"#;

const CONTACTS: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:gd='http://schemas.google.com/g/2005'>
  <entry>
    <id>http://www.google.com/m8/feeds/contacts/ada%40example.org/base/1</id>
    <title>Charles Babbage</title>
    <gd:name><gd:givenName>Charles</gd:givenName><gd:familyName>Babbage</gd:familyName></gd:name>
    <link rel='http://schemas.google.com/contacts/2008/rel#photo' type='image/*'
          href='https://feeds.example.test/photos/media/1' gd:etag='"abc"'/>
    <gd:email rel='http://schemas.google.com/g/2005#home' address='charles@home.example'/>
    <gd:email rel='http://schemas.google.com/g/2005#work' address='charles@work.example'/>
  </entry>
  <entry>
    <id>http://www.google.com/m8/feeds/contacts/ada%40example.org/base/2</id>
    <title></title>
    <gd:phoneNumber>+44 20 7946 0000</gd:phoneNumber>
  </entry>
  <entry>
    <id>http://www.google.com/m8/feeds/contacts/ada%40example.org/base/3</id>
    <title>Mary Somerville</title>
    <link rel='http://schemas.google.com/contacts/2008/rel#photo' type='image/*'
          href='https://feeds.example.test/photos/media/3'/>
  </entry>
</feed>"#;

const EMPTY_FEED: &str = "<feed xmlns='http://www.w3.org/2005/Atom'><title>Contacts</title></feed>";

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct MemorySettings {
    values: Mutex<HashMap<(UserId, String), SettingValue>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, user: UserId, key: &str) -> BridgeResult<Option<SettingValue>> {
        Ok(self.values.lock().await.get(&(user, key.to_string())).cloned())
    }

    async fn save(
        &self,
        user: UserId,
        updates: Vec<(String, Option<SettingValue>)>,
    ) -> BridgeResult<()> {
        let mut values = self.values.lock().await;
        for (key, value) in updates {
            match value {
                Some(value) => values.insert((user, key), value),
                None => values.remove(&(user, key)),
            };
        }
        Ok(())
    }
}

/// Answers by URL: group feed, contact feed, photos
struct FeedServer {
    groups: BridgeResult<HttpResponse>,
    contacts: BridgeResult<HttpResponse>,
    requests: Mutex<Vec<String>>,
}

impl FeedServer {
    fn new(groups: BridgeResult<HttpResponse>, contacts: BridgeResult<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            groups,
            contacts,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn healthy() -> Arc<Self> {
        Self::new(xml(200, GROUPS), xml(200, CONTACTS))
    }

    async fn requested(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }
}

fn xml(status: u16, body: &str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
}

fn replay(response: &BridgeResult<HttpResponse>) -> BridgeResult<HttpResponse> {
    match response {
        Ok(response) => Ok(response.clone()),
        Err(_) => Err(BridgeError::ConnectionFailed("connection refused".into())),
    }
}

#[async_trait]
impl HttpClient for FeedServer {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Bearer ya29.live")
        );
        self.requests.lock().await.push(request.url.clone());

        if request.url.contains("/groups/default/full") {
            replay(&self.groups)
        } else if request.url.contains("/contacts/default/full") {
            replay(&self.contacts)
        } else if request.url.contains("/photos/media/") {
            Ok(HttpResponse::new(200, vec![0xFF, 0xD8, 0xFF, 0xE0]))
        } else {
            Ok(HttpResponse::new(404, Vec::new()))
        }
    }
}

#[derive(Default)]
struct MemoryContacts {
    contacts: Mutex<HashMap<UserId, Vec<Contact>>>,
}

#[async_trait]
impl ContactStore for MemoryContacts {
    async fn delete_all(&self, user: UserId) -> BridgeResult<u64> {
        let removed = self.contacts.lock().await.remove(&user);
        Ok(removed.map(|c| c.len() as u64).unwrap_or(0))
    }

    async fn insert(&self, user: UserId, contact: &Contact, _update: bool) -> BridgeResult<()> {
        self.contacts
            .lock()
            .await
            .entry(user)
            .or_default()
            .push(contact.clone());
        Ok(())
    }

    async fn list(&self, user: UserId) -> BridgeResult<Vec<Contact>> {
        Ok(self
            .contacts
            .lock()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }
}

mock! {
    pub Store {}

    #[async_trait]
    impl ContactStore for Store {
        async fn delete_all(&self, user: UserId) -> BridgeResult<u64>;
        async fn insert(&self, user: UserId, contact: &Contact, update: bool) -> BridgeResult<()>;
        async fn list(&self, user: UserId) -> BridgeResult<Vec<Contact>>;
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn authorized(settings: Arc<MemorySettings>, http: Arc<dyn HttpClient>) -> Arc<AuthManager> {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_unix(NOW));
    let token_store = TokenStore::new(settings);
    token_store
        .save_token(
            USER,
            &OAuthToken::new("ya29.live", Some("1//refresh".to_string()), 3600, NOW - 60),
        )
        .await
        .unwrap();

    Arc::new(AuthManager::new(
        token_store,
        OAuthClient::new(OAuthClientSettings::new("client-id", "client-secret"), http, clock.clone()),
        clock,
        Arc::new(EnglishCatalog),
    ))
}

async fn orchestrator(http: Arc<FeedServer>, store: Arc<dyn ContactStore>) -> SyncOrchestrator {
    let auth = authorized(Arc::new(MemorySettings::default()), http.clone()).await;
    SyncOrchestrator::new(
        auth,
        provider_google_contacts::FeedClient::new(
            http,
            FeedSettings::default().with_base_url("https://feeds.example.test/m8/feeds"),
        ),
        store,
        Arc::new(EnglishCatalog),
    )
}

fn stale() -> Contact {
    Contact {
        name: "Stale Entry".to_string(),
        ..Default::default()
    }
}

fn message(key: MessageKey) -> String {
    EnglishCatalog.message(key)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_sync_replaces_stored_contacts() {
    let http = FeedServer::healthy();
    let store = Arc::new(MemoryContacts::default());
    store.insert(USER, &stale(), false).await.unwrap();
    let orchestrator = orchestrator(http.clone(), store.clone()).await;

    let result = orchestrator.sync(USER).await;

    assert!(result.success);
    assert_eq!(result.message, "2 contacts found.");

    let contacts = store.list(USER).await.unwrap();
    let names: Vec<_> = contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Charles Babbage", "Mary Somerville"]);

    let charles = &contacts[0];
    assert_eq!(charles.firstname, "Charles");
    assert_eq!(charles.values("email:home"), ["charles@home.example"]);
    assert_eq!(charles.values("email:work"), ["charles@work.example"]);
    assert_eq!(charles.photo.as_deref(), Some([0xFF, 0xD8, 0xFF, 0xE0].as_slice()));

    // Photo link without etag is never fetched
    assert_eq!(contacts[1].photo, None);
    assert_eq!(http.requested("/photos/media/").await, 1);
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let store = Arc::new(MemoryContacts::default());
    let orchestrator = orchestrator(FeedServer::healthy(), store.clone()).await;

    let first = orchestrator.sync(USER).await;
    let after_first = store.list(USER).await.unwrap();
    let second = orchestrator.sync(USER).await;
    let after_second = store.list(USER).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 2);
}

#[tokio::test]
async fn test_contact_request_carries_group_id() {
    let http = FeedServer::healthy();
    let orchestrator = orchestrator(http.clone(), Arc::new(MemoryContacts::default())).await;

    orchestrator.sync(USER).await;

    let requests = http.requests.lock().await;
    assert!(requests[0].ends_with("/groups/default/full?v=3.0"));
    assert!(requests[1].contains("max-results=9999&v=3.0&group=http%3A%2F%2Fwww.google.com"));
}

#[tokio::test]
async fn test_feed_failures_leave_storage_untouched() {
    let cases = [
        (FeedServer::new(xml(401, ""), xml(200, CONTACTS)), MessageKey::GoogleAuthFailed),
        (FeedServer::new(xml(403, ""), xml(200, CONTACTS)), MessageKey::GoogleForbidden),
        (FeedServer::new(xml(500, ""), xml(200, CONTACTS)), MessageKey::GoogleUnreachable),
        (FeedServer::new(xml(200, GROUPS), xml(401, "")), MessageKey::GoogleAuthFailed),
        (FeedServer::new(xml(200, GROUPS), xml(403, "")), MessageKey::GoogleForbidden),
        (FeedServer::new(xml(200, GROUPS), xml(503, "")), MessageKey::GoogleUnreachable),
        (
            FeedServer::new(
                xml(200, GROUPS),
                Err(BridgeError::ConnectionFailed("reset".into())),
            ),
            MessageKey::GoogleUnreachable,
        ),
    ];

    for (http, key) in cases {
        let store = Arc::new(MemoryContacts::default());
        store.insert(USER, &stale(), false).await.unwrap();
        let orchestrator = orchestrator(http, store.clone()).await;

        let result = orchestrator.sync(USER).await;

        assert!(!result.success);
        assert_eq!(result.message, message(key));
        assert_eq!(store.list(USER).await.unwrap(), vec![stale()]);
    }
}

#[tokio::test]
async fn test_empty_feed_does_not_touch_storage() {
    let mut store = MockStore::new();
    store.expect_delete_all().times(0);
    store.expect_insert().times(0);

    let http = FeedServer::new(xml(200, GROUPS), xml(200, EMPTY_FEED));
    let orchestrator = orchestrator(http, Arc::new(store)).await;

    let result = orchestrator.sync(USER).await;

    assert!(result.success);
    assert_eq!(result.message, "0 contacts found.");
}

#[tokio::test]
async fn test_missing_default_group() {
    let store = Arc::new(MemoryContacts::default());
    store.insert(USER, &stale(), false).await.unwrap();
    let http = FeedServer::new(xml(200, EMPTY_FEED), xml(200, CONTACTS));
    let orchestrator = orchestrator(http.clone(), store.clone()).await;

    let result = orchestrator.sync(USER).await;

    assert!(!result.success);
    assert_eq!(result.message, message(MessageKey::NoDefaultGroup));
    assert_eq!(http.requested("/contacts/default/full").await, 0);
    assert_eq!(store.list(USER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_auth_failure_is_reported_before_any_feed_request() {
    let http = FeedServer::healthy();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_unix(NOW));
    let auth = Arc::new(AuthManager::new(
        TokenStore::new(Arc::new(MemorySettings::default())),
        OAuthClient::new(
            OAuthClientSettings::new("client-id", "client-secret"),
            http.clone(),
            clock.clone(),
        ),
        clock,
        Arc::new(EnglishCatalog),
    ));
    let orchestrator = SyncOrchestrator::new(
        auth.clone(),
        provider_google_contacts::FeedClient::new(http.clone(), FeedSettings::default()),
        Arc::new(MemoryContacts::default()),
        Arc::new(EnglishCatalog),
    );

    let result = orchestrator.sync(USER).await;

    assert!(!result.success);
    assert_eq!(result.message, auth.authenticate(USER).await.message);
    assert_eq!(result.message, message(MessageKey::NoAuthCode));
    assert!(http.requests.lock().await.is_empty());
}
