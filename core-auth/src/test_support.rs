//! In-memory fakes of the bridges the auth layer talks through

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{HttpClient, HttpRequest, HttpResponse, SettingValue, SettingsStore, UserId};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<(UserId, String), SettingValue>>,
    fail_saves: bool,
}

impl MemorySettings {
    /// Store whose `save` always fails; reads still work
    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Default::default()
        }
    }

    pub async fn put(&self, user: UserId, key: &str, value: SettingValue) {
        self.values
            .lock()
            .await
            .insert((user, key.to_string()), value);
    }

    pub async fn snapshot(&self, user: UserId) -> HashMap<String, SettingValue> {
        self.values
            .lock()
            .await
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, user: UserId, key: &str) -> BridgeResult<Option<SettingValue>> {
        Ok(self
            .values
            .lock()
            .await
            .get(&(user, key.to_string()))
            .cloned())
    }

    async fn save(
        &self,
        user: UserId,
        updates: Vec<(String, Option<SettingValue>)>,
    ) -> BridgeResult<()> {
        if self.fail_saves {
            return Err(BridgeError::DatabaseError("disk full".to_string()));
        }

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

/// Replays queued responses and records every request
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Mutex<VecDeque<BridgeResult<HttpResponse>>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn new(responses: Vec<BridgeResult<HttpResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn json(status: u16, body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn form(&self, index: usize) -> HashMap<String, String> {
        let requests = self.requests.lock().await;
        let body = requests[index].body.clone().unwrap_or_default();
        serde_urlencoded::from_bytes(&body).unwrap()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::ConnectionFailed("no scripted response".into())))
    }
}
