//! In-memory collaborators for tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;

use super::{ArtifactSource, Backend, CompilationResult, Compiler, DocumentStore, Toolchain};
use crate::core::{BackendError, Document, DocumentId};
use crate::preview::ArtifactRef;

// =============================================================================
// Toolchain
// =============================================================================

pub(crate) struct FakeToolchain {
    installed: AtomicBool,
    checks: AtomicUsize,
}

impl FakeToolchain {
    pub(crate) fn new(installed: bool) -> Self {
        Self {
            installed: AtomicBool::new(installed),
            checks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }

    pub(crate) fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn is_installed(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.installed.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Store
// =============================================================================

pub(crate) struct FakeStore {
    docs: Mutex<Vec<Document>>,
    fail_writes: AtomicBool,
    updates: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn with_documents(docs: Vec<Document>) -> Self {
        Self {
            docs: Mutex::new(docs),
            fail_writes: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
        }
    }

    /// Make every following write fail with a storage error.
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Change a stored document behind the session's back.
    pub(crate) fn overwrite(&self, id: &DocumentId, content: &str) {
        if let Some(doc) = self.docs.lock().iter_mut().find(|d| &d.id == id) {
            doc.set_content(content);
        }
    }

    pub(crate) fn content_of(&self, id: &DocumentId) -> Option<String> {
        self.docs
            .lock()
            .iter()
            .find(|d| &d.id == id)
            .map(|d| d.content.clone())
    }

    pub(crate) fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("disk is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn list(&self) -> Result<Vec<Document>, BackendError> {
        Ok(self.docs.lock().clone())
    }

    async fn get(&self, id: &DocumentId) -> Result<Document, BackendError> {
        self.docs
            .lock()
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.clone()))
    }

    async fn create(&self, title: &str) -> Result<Document, BackendError> {
        self.check_writable()?;
        let doc = Document::new(title, format!("\\title{{{title}}}\n"));
        self.docs.lock().insert(0, doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: &DocumentId, content: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut docs = self.docs.lock();
        let doc = docs
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        doc.set_content(content);
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), BackendError> {
        self.check_writable()?;
        self.docs.lock().retain(|d| &d.id != id);
        Ok(())
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Compiler whose results and completion times tests control.
///
/// Scripts are keyed by the content snapshot a call compiles, since spawned
/// calls do not start in the order they were issued.
pub(crate) struct FakeCompiler {
    calls: Mutex<Vec<(DocumentId, String)>>,
    responses: Mutex<FxHashMap<String, Result<CompilationResult, BackendError>>>,
    holds: Mutex<FxHashMap<String, Arc<Notify>>>,
    exports: Mutex<Vec<(String, PathBuf)>>,
    discards: Mutex<Vec<String>>,
}

impl FakeCompiler {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(FxHashMap::default()),
            holds: Mutex::new(FxHashMap::default()),
            exports: Mutex::new(Vec::new()),
            discards: Mutex::new(Vec::new()),
        }
    }

    /// Script the result of the next call that compiles `content`.
    pub(crate) fn respond(&self, content: &str, result: Result<CompilationResult, BackendError>) {
        self.responses.lock().insert(content.to_string(), result);
    }

    /// Keep calls compiling `content` pending until the returned handle is
    /// notified.
    pub(crate) fn hold(&self, content: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .insert(content.to_string(), Arc::clone(&notify));
        notify
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn calls(&self) -> Vec<(DocumentId, String)> {
        self.calls.lock().clone()
    }

    /// Artifact locator and destination of every export.
    pub(crate) fn exports(&self) -> Vec<(String, PathBuf)> {
        self.exports.lock().clone()
    }

    pub(crate) fn discards(&self) -> Vec<String> {
        self.discards.lock().clone()
    }

    pub(crate) fn locator_for(id: &DocumentId) -> String {
        format!("/fake/{id}.pdf")
    }
}

#[async_trait]
impl Compiler for FakeCompiler {
    async fn compile(
        &self,
        id: &DocumentId,
        content: &str,
    ) -> Result<CompilationResult, BackendError> {
        self.calls.lock().push((id.clone(), content.to_string()));

        let hold = self.holds.lock().get(content).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let scripted = self.responses.lock().remove(content);
        scripted.unwrap_or_else(|| Ok(CompilationResult::succeeded(Self::locator_for(id), vec![])))
    }

    async fn export(&self, artifact: &ArtifactRef, destination: &Path) -> Result<(), BackendError> {
        self.exports
            .lock()
            .push((artifact.locator().to_string(), destination.to_path_buf()));
        Ok(())
    }

    async fn discard(&self, artifact: &str) {
        self.discards.lock().push(artifact.to_string());
    }
}

// =============================================================================
// Artifacts
// =============================================================================

pub(crate) struct FakeArtifacts {
    files: Mutex<FxHashMap<String, Vec<u8>>>,
    fallback: Option<Vec<u8>>,
    fetches: AtomicUsize,
}

impl FakeArtifacts {
    /// Fetching an unknown locator fails.
    pub(crate) fn new() -> Self {
        Self {
            files: Mutex::new(FxHashMap::default()),
            fallback: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Fetching an unknown locator returns `bytes`.
    pub(crate) fn with_fallback(bytes: &[u8]) -> Self {
        Self {
            fallback: Some(bytes.to_vec()),
            ..Self::new()
        }
    }

    pub(crate) fn put(&self, locator: &str, bytes: Vec<u8>) {
        self.files.lock().insert(locator.to_string(), bytes);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for FakeArtifacts {
    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .get(reference.locator())
            .cloned()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| BackendError::Fetch(format!("{}: no such file", reference.locator())))
    }
}

// =============================================================================
// Bundle
// =============================================================================

pub(crate) struct FakeBackend {
    pub(crate) toolchain: Arc<FakeToolchain>,
    pub(crate) store: Arc<FakeStore>,
    pub(crate) compiler: Arc<FakeCompiler>,
    pub(crate) artifacts: Arc<FakeArtifacts>,
}

impl FakeBackend {
    pub(crate) fn new(docs: Vec<Document>) -> Self {
        Self {
            toolchain: Arc::new(FakeToolchain::new(true)),
            store: Arc::new(FakeStore::with_documents(docs)),
            compiler: Arc::new(FakeCompiler::new()),
            artifacts: Arc::new(FakeArtifacts::with_fallback(b"%PDF-1.5")),
        }
    }

    pub(crate) fn backend(&self) -> Backend {
        Backend {
            toolchain: self.toolchain.clone(),
            store: self.store.clone(),
            compiler: self.compiler.clone(),
            artifacts: self.artifacts.clone(),
        }
    }
}
