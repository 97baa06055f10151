#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use chirp::config::Settings;
use chirp::store::{MemoryStore, Store, StoreError};
use chirp::AppState;
use serde_json::{json, Value};

pub const SECRET: &str = "integration-test-signing-secret";

pub struct TestApp {
    pub address: String,
    pub state: AppState,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(MemoryStore::new()), Settings::development(SECRET))
}

pub fn spawn_app_with(store: Arc<dyn Store>, settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let state = AppState::new(store, settings);

    let server = chirp::run(listener, state.clone()).expect("Failed to build server");
    tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        state,
    }
}

/// A browser-like client: keeps whatever cookies the server sets.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, client: &reqwest::Client, username: &str, password: &str) -> reqwest::Response {
        client
            .post(self.url("/api/users/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to register")
    }

    pub async fn login(&self, client: &reqwest::Client, username: &str, password: &str) -> reqwest::Response {
        client
            .post(self.url("/api/users/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to login")
    }

    /// Registers `username` on a fresh client and returns that client.
    pub async fn signed_in(&self, username: &str) -> reqwest::Client {
        let client = client();
        let resp = self.register(&client, username, "secret1").await;
        assert_eq!(resp.status(), 201);
        client
    }

    pub async fn create_post(&self, client: &reqwest::Client, content: &str) -> reqwest::Response {
        client
            .post(self.url("/api/posts"))
            .json(&json!({ "content": content }))
            .send()
            .await
            .expect("Failed to create post")
    }

    pub async fn edit_post(&self, client: &reqwest::Client, id: &str, content: &str) -> reqwest::Response {
        client
            .put(self.url(&format!("/api/posts/{}", id)))
            .json(&json!({ "content": content }))
            .send()
            .await
            .expect("Failed to edit post")
    }

    pub async fn delete_post(&self, client: &reqwest::Client, id: &str) -> reqwest::Response {
        client
            .delete(self.url(&format!("/api/posts/{}", id)))
            .send()
            .await
            .expect("Failed to delete post")
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = reqwest::get(self.url(path)).await.expect("Failed to GET");
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap_or(Value::Null))
    }
}

/// A store whose every call fails, for exercising the 500 path.
pub struct BrokenStore;

fn broken() -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable"))
}

impl Store for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(broken())
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
        Err(broken())
    }

    fn insert(&self, _key: &str, _value: &[u8]) -> Result<bool, StoreError> {
        Err(broken())
    }

    fn replace(&self, _key: &str, _value: &[u8]) -> Result<bool, StoreError> {
        Err(broken())
    }

    fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(broken())
    }

    fn get_keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(broken())
    }
}

/// Memory store whose `get_keys` blocks until [`GatedStore::open`] is called.
pub struct GatedStore {
    inner: MemoryStore,
    entered: AtomicBool,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            entered: AtomicBool::new(false),
            open: Mutex::new(false),
            opened: Condvar::new(),
        }
    }

    /// Whether some request is currently parked in `get_keys`.
    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl Store for GatedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn insert(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.inner.insert(key, value)
    }

    fn replace(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.inner.replace(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key)
    }

    fn get_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.entered.store(true, Ordering::SeqCst);
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.inner.get_keys(prefix)
    }
}
