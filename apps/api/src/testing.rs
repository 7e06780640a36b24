//! In-memory fakes for every external collaborator, with call recording.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::creations::CreationStore;
use crate::documents::{DocumentError, DocumentReader};
use crate::identity::{IdentityError, IdentityProvider};
use crate::llm_client::{ChatModel, CompletionOptions, LlmError};
use crate::media::{object_name, HostedImage, ImageEdit, ImageGenerator, ImageHost, MediaError};
use crate::models::creation::{Creation, NewCreation};
use crate::models::user::{Caller, Entitlement};
use crate::state::AppState;

pub const PREMIUM_TOKEN: &str = "premium-token";
pub const FREE_TOKEN: &str = "free-token";

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeIdentity {
    tokens: Mutex<HashMap<String, String>>,
    entitlements: Mutex<HashMap<String, Entitlement>>,
    usage_writes: Mutex<Vec<(String, u32)>>,
    fail_usage_writes: AtomicBool,
}

impl FakeIdentity {
    pub fn add_user(&self, token: &str, user_id: &str, entitlement: Entitlement) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), user_id.to_string());
        self.set_entitlement(user_id, entitlement);
    }

    pub fn set_entitlement(&self, user_id: &str, entitlement: Entitlement) {
        self.entitlements
            .lock()
            .unwrap()
            .insert(user_id.to_string(), entitlement);
    }

    pub fn free_usage(&self, user_id: &str) -> u32 {
        self.entitlements.lock().unwrap()[user_id].free_usage
    }

    pub fn usage_writes(&self) -> Vec<(String, u32)> {
        self.usage_writes.lock().unwrap().clone()
    }

    pub fn fail_usage_writes(&self) {
        self.fail_usage_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn authenticate(&self, token: &str) -> Result<Caller, IdentityError> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .map(|user_id| Caller {
                user_id: user_id.clone(),
            })
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))
    }

    async fn entitlement(&self, user_id: &str) -> Result<Entitlement, IdentityError> {
        self.entitlements
            .lock()
            .unwrap()
            .get(user_id)
            .copied()
            .ok_or_else(|| IdentityError::Api {
                status: 404,
                message: format!("user {user_id} not found"),
            })
    }

    async fn record_free_usage(&self, user_id: &str, free_usage: u32) -> Result<(), IdentityError> {
        if self.fail_usage_writes.load(Ordering::SeqCst) {
            return Err(IdentityError::Api {
                status: 500,
                message: "metadata write failed".to_string(),
            });
        }
        self.usage_writes
            .lock()
            .unwrap()
            .push((user_id.to_string(), free_usage));
        if let Some(e) = self.entitlements.lock().unwrap().get_mut(user_id) {
            e.free_usage = free_usage;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeChat {
    reply: Mutex<Result<String, String>>,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self {
            reply: Mutex::new(Ok("generated text".to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeChat {
    pub fn reply_with(&self, text: &str) {
        *self.reply.lock().unwrap() = Ok(text.to_string());
    }

    pub fn fail_with(&self, message: &str) {
        *self.reply.lock().unwrap() = Err(message.to_string());
    }

    pub fn calls(&self) -> Vec<(String, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options));
        self.reply
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| LlmError::Api {
                status: 503,
                message,
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Media
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeImageGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeImageGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Bytes, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Api {
                status: 402,
                message: "no credits left".to_string(),
            });
        }
        Ok(Bytes::from_static(b"\x89PNG fake"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub size: usize,
    pub file_name: String,
    pub edit: Option<ImageEdit>,
}

#[derive(Default)]
pub struct FakeImageHost {
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl FakeImageHost {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(
        &self,
        image: Bytes,
        file_name: &str,
        edit: Option<&ImageEdit>,
    ) -> Result<HostedImage, MediaError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(RecordedUpload {
            size: image.len(),
            file_name: file_name.to_string(),
            edit: edit.cloned(),
        });
        let public_id = format!("asset_{}", uploads.len());
        Ok(HostedImage {
            secure_url: format!("https://cdn.test/{public_id}.png"),
            public_id,
        })
    }

    fn edited_url(&self, public_id: &str, edit: &ImageEdit) -> Result<String, MediaError> {
        match edit {
            ImageEdit::RemoveBackground => Ok(format!("https://cdn.test/nobg/{public_id}")),
            ImageEdit::RemoveObject(object) => {
                Ok(format!("https://cdn.test/remove:{}/{public_id}", object_name(object)?))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Documents
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDocuments {
    calls: AtomicUsize,
}

impl FakeDocuments {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentReader for FakeDocuments {
    async fn extract_text(&self, _pdf: Bytes) -> Result<String, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Jane Doe\nSenior Rust Engineer".to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<Vec<NewCreation>>,
    fail_inserts: AtomicBool,
}

impl FakeStore {
    pub fn rows(&self) -> Vec<NewCreation> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    fn to_row(id: usize, c: &NewCreation) -> Creation {
        Creation {
            id: id as i64 + 1,
            user_id: c.user_id.clone(),
            prompt: c.prompt.clone(),
            content: c.content.clone(),
            creation_type: c.creation_type.as_str().to_string(),
            publish: c.publish,
            created_at: chrono::Utc::now(),
        }
    }
}

#[async_trait]
impl CreationStore for FakeStore {
    async fn insert(&self, creation: &NewCreation) -> Result<i64, sqlx::Error> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push(creation.clone());
        Ok(rows.len() as i64)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Creation>, sqlx::Error> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(i, c)| Self::to_row(i, c))
            .collect())
    }

    async fn list_published(&self) -> Result<Vec<Creation>, sqlx::Error> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| c.publish)
            .map(|(i, c)| Self::to_row(i, c))
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Harness
// ────────────────────────────────────────────────────────────────────────────

/// `AppState` wired to fakes, with handles kept for assertions.
///
/// Users: `user_premium` (token `PREMIUM_TOKEN`) and `user_free` with zero
/// uses (token `FREE_TOKEN`).
pub struct TestHarness {
    pub state: AppState,
    pub identity: Arc<FakeIdentity>,
    pub llm: Arc<FakeChat>,
    pub image_generator: Arc<FakeImageGenerator>,
    pub image_host: Arc<FakeImageHost>,
    pub documents: Arc<FakeDocuments>,
    pub store: Arc<FakeStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        let identity = Arc::new(FakeIdentity::default());
        identity.add_user(PREMIUM_TOKEN, "user_premium", Entitlement::premium());
        identity.add_user(FREE_TOKEN, "user_free", Entitlement::free(0));

        let llm = Arc::new(FakeChat::default());
        let image_generator = Arc::new(FakeImageGenerator::default());
        let image_host = Arc::new(FakeImageHost::default());
        let documents = Arc::new(FakeDocuments::default());
        let store = Arc::new(FakeStore::default());

        let state = AppState {
            identity: identity.clone(),
            llm: llm.clone(),
            image_generator: image_generator.clone(),
            image_host: image_host.clone(),
            documents: documents.clone(),
            creations: store.clone(),
        };

        Self {
            state,
            identity,
            llm,
            image_generator,
            image_host,
            documents,
            store,
        }
    }

    /// Total outbound provider calls across every provider fake.
    pub fn provider_calls(&self) -> usize {
        self.llm.calls().len()
            + self.image_generator.calls()
            + self.image_host.uploads().len()
            + self.documents.calls()
    }
}
