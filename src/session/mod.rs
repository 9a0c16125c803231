//! Document Session Manager - the open document set and the active pointer.
//!
//! Only this type mutates documents. Every mutation goes through the store
//! first and touches memory only after the store accepted it, so a failed
//! call leaves the session exactly as it was.

use std::sync::Arc;

use crate::backend::DocumentStore;
use crate::core::{BackendError, Document, DocumentId};

/// Effect of a delete on the active pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub was_active: bool,
    /// Active document after the delete.
    pub active: Option<DocumentId>,
}

pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    documents: Vec<Document>,
    active: Option<DocumentId>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            documents: Vec::new(),
            active: None,
        }
    }

    /// Replace the open set with the store's listing.
    ///
    /// Keeps the active document if it still exists, otherwise activates
    /// the first one.
    pub async fn load_all(&mut self) -> Result<(), BackendError> {
        let documents = self.store.list().await?;
        self.documents = documents;

        let keep = self
            .active
            .as_ref()
            .is_some_and(|id| self.position(id).is_some());
        if !keep {
            self.active = self.documents.first().map(|d| d.id.clone());
        }
        Ok(())
    }

    /// Create a document, put it first and make it active.
    pub async fn create(&mut self, title: &str) -> Result<&Document, BackendError> {
        let doc = self.store.create(title).await?;
        self.active = Some(doc.id.clone());
        self.documents.insert(0, doc);
        Ok(&self.documents[0])
    }

    /// Make `id` active, loading its current state from storage.
    pub async fn select(&mut self, id: &DocumentId) -> Result<&Document, BackendError> {
        let fresh = self.store.get(id).await?;
        let index = match self.position(id) {
            Some(index) => {
                self.documents[index] = fresh;
                index
            }
            None => {
                self.documents.insert(0, fresh);
                0
            }
        };
        self.active = Some(id.clone());
        Ok(&self.documents[index])
    }

    /// Persist new content, then apply it in memory.
    pub async fn update(&mut self, id: &DocumentId, content: &str) -> Result<(), BackendError> {
        let index = self
            .position(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        self.store.update(id, content).await?;
        self.documents[index].set_content(content);
        Ok(())
    }

    /// Delete `id`. An active document falls back to the first remaining one.
    pub async fn delete(&mut self, id: &DocumentId) -> Result<Deletion, BackendError> {
        self.store.delete(id).await?;
        self.documents.retain(|d| &d.id != id);

        let was_active = self.active.as_ref() == Some(id);
        if was_active {
            self.active = self.documents.first().map(|d| d.id.clone());
        }
        Ok(Deletion {
            was_active,
            active: self.active.clone(),
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.position(id).map(|index| &self.documents[index])
    }

    pub fn active_id(&self) -> Option<&DocumentId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: &DocumentId) -> bool {
        self.active.as_ref() == Some(id)
    }

    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| &d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeStore;

    fn two_docs() -> (Arc<FakeStore>, SessionManager, DocumentId, DocumentId) {
        let a = Document::new("Resume", "a");
        let b = Document::new("Letter", "b");
        let (ida, idb) = (a.id.clone(), b.id.clone());
        let store = Arc::new(FakeStore::with_documents(vec![a, b]));
        let session = SessionManager::new(store.clone());
        (store, session, ida, idb)
    }

    #[tokio::test]
    async fn test_load_all_activates_first() {
        let (_store, mut session, a, _b) = two_docs();
        session.load_all().await.unwrap();
        assert_eq!(session.documents().len(), 2);
        assert_eq!(session.active_id(), Some(&a));
    }

    #[tokio::test]
    async fn test_create_prepends_and_activates() {
        let (_store, mut session, _a, _b) = two_docs();
        session.load_all().await.unwrap();

        let id = session.create("Cover").await.unwrap().id.clone();
        assert_eq!(session.documents()[0].id, id);
        assert_eq!(session.active_id(), Some(&id));
        assert_eq!(session.documents().len(), 3);
    }

    #[tokio::test]
    async fn test_select_reads_storage() {
        let (store, mut session, _a, b) = two_docs();
        session.load_all().await.unwrap();

        store.overwrite(&b, "changed elsewhere");
        let doc = session.select(&b).await.unwrap();
        assert_eq!(doc.content, "changed elsewhere");
        assert_eq!(session.active_id(), Some(&b));
    }

    #[tokio::test]
    async fn test_select_unknown_leaves_state() {
        let (_store, mut session, a, _b) = two_docs();
        session.load_all().await.unwrap();

        let missing = DocumentId::new("missing");
        let err = session.select(&missing).await.unwrap_err();
        assert_eq!(err, BackendError::NotFound(missing));
        assert_eq!(session.active_id(), Some(&a));
    }

    #[tokio::test]
    async fn test_update_applies_after_store() {
        let (store, mut session, a, _b) = two_docs();
        session.load_all().await.unwrap();
        let before = session.active().unwrap().updated_at;

        session.update(&a, "new body").await.unwrap();
        assert_eq!(session.active().unwrap().content, "new body");
        assert!(session.active().unwrap().updated_at >= before);
        assert_eq!(store.content_of(&a).as_deref(), Some("new body"));
    }

    #[tokio::test]
    async fn test_failed_update_changes_nothing() {
        let (store, mut session, a, _b) = two_docs();
        session.load_all().await.unwrap();
        store.fail_writes(true);

        let err = session.update(&a, "lost").await.unwrap_err();
        assert!(matches!(err, BackendError::Storage(_)));
        assert_eq!(session.active().unwrap().content, "a");
    }

    #[tokio::test]
    async fn test_delete_active_falls_back() {
        let (_store, mut session, a, b) = two_docs();
        session.load_all().await.unwrap();

        let deletion = session.delete(&a).await.unwrap();
        assert_eq!(
            deletion,
            Deletion {
                was_active: true,
                active: Some(b.clone()),
            }
        );

        let deletion = session.delete(&b).await.unwrap();
        assert!(deletion.was_active);
        assert_eq!(deletion.active, None);
        assert!(session.active().is_none());
    }

    #[tokio::test]
    async fn test_delete_inactive_keeps_active() {
        let (_store, mut session, a, b) = two_docs();
        session.load_all().await.unwrap();

        let deletion = session.delete(&b).await.unwrap();
        assert!(!deletion.was_active);
        assert_eq!(session.active_id(), Some(&a));
    }
}
