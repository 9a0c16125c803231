//! JSON-file document store.
//!
//! All documents live in a single `documents.json`. The file is the source of
//! truth: every call re-reads it, and writes replace it atomically through a
//! sibling temp file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::DocumentStore;
use crate::core::{BackendError, Document, DocumentId};

const TEMPLATE: &str = r"\documentclass{article}
\usepackage[utf8]{inputenc}

\title{%TITLE%}
\author{}
\date{\today}

\begin{document}

\maketitle

\section{Introduction}

Start writing your document here...

\end{document}";

/// Starter content for a new document titled `title`.
pub fn default_content(title: &str) -> String {
    TEMPLATE.replace("%TITLE%", title)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    documents: Vec<Document>,
}

struct Inner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Inner {
    fn load(&self) -> Result<Vec<Document>, BackendError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackendError::storage("failed to read documents", e)),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: StoreFile = serde_json::from_str(&text).map_err(|e| {
            BackendError::storage(&format!("corrupt store {}", self.path.display()), e)
        })?;
        Ok(file.documents)
    }

    fn save(&self, documents: Vec<Document>) -> Result<(), BackendError> {
        let json = serde_json::to_string_pretty(&StoreFile { documents })
            .map_err(|e| BackendError::storage("failed to encode documents", e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| BackendError::storage("failed to write documents", e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| BackendError::storage("failed to replace documents", e))
    }
}

/// [`DocumentStore`] backed by a JSON file.
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<Inner>,
}

impl JsonStore {
    /// Open (or prepare) the store at `path`. The file itself is created on
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
        Ok(Self {
            inner: Arc::new(Inner {
                path,
                lock: Mutex::new(()),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run `f` on a fresh snapshot under the store lock, writing the
    /// snapshot back when `f` marks it dirty.
    async fn transact<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Document>) -> Result<(T, bool), BackendError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let _guard = inner.lock.lock();
            let mut docs = inner.load()?;
            let (value, dirty) = f(&mut docs)?;
            if dirty {
                inner.save(docs)?;
            }
            Ok(value)
        })
        .await
        .map_err(|e| BackendError::storage("store task failed", e))?
    }
}

#[async_trait]
impl DocumentStore for JsonStore {
    async fn list(&self) -> Result<Vec<Document>, BackendError> {
        self.transact(|docs| {
            let mut docs = std::mem::take(docs);
            docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok((docs, false))
        })
        .await
    }

    async fn get(&self, id: &DocumentId) -> Result<Document, BackendError> {
        let id = id.clone();
        self.transact(move |docs| {
            let doc = docs
                .iter()
                .find(|d| d.id == id)
                .cloned()
                .ok_or(BackendError::NotFound(id))?;
            Ok((doc, false))
        })
        .await
    }

    async fn create(&self, title: &str) -> Result<Document, BackendError> {
        let doc = Document::new(title, default_content(title));
        self.transact(move |docs| {
            docs.push(doc.clone());
            Ok((doc, true))
        })
        .await
    }

    async fn update(&self, id: &DocumentId, content: &str) -> Result<(), BackendError> {
        let id = id.clone();
        let content = content.to_string();
        self.transact(move |docs| {
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or(BackendError::NotFound(id))?;
            doc.content = content;
            doc.touch(Utc::now());
            Ok(((), true))
        })
        .await
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), BackendError> {
        let id = id.clone();
        self.transact(move |docs| {
            let before = docs.len();
            docs.retain(|d| d.id != id);
            Ok(((), docs.len() != before))
        })
        .await
    }
}
