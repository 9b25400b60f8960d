// ABOUTME: Concurrency-safe in-memory directory of running ICode instances
// ABOUTME: Maps identity to instance record, sandbox handle, and per-instance execution gate

use crate::error::{ApiError, Result};
use ivm_core::{ICode, ICodeStatus};
use ivm_sandbox::SandboxHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Snapshot of one registry entry handed out to orchestrators
#[derive(Clone)]
pub struct ICodeEntry {
    pub icode: ICode,
    pub handle: SandboxHandle,
    /// Serializes calls dispatched into this instance's sandbox
    pub gate: Arc<Mutex<()>>,
}

struct RegisteredICode {
    icode: ICode,
    handle: SandboxHandle,
    gate: Arc<Mutex<()>>,
    seq: u64,
}

impl RegisteredICode {
    fn snapshot(&self) -> ICodeEntry {
        ICodeEntry {
            icode: self.icode.clone(),
            handle: self.handle.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

/// In-memory registry of running instances
///
/// The structural lock is never held across sandbox or network awaits; every
/// operation is a short critical section, so inserts and removes appear
/// atomic to readers.
#[derive(Default)]
pub struct ICodeRegistry {
    entries: RwLock<HashMap<String, RegisteredICode>>,
    next_seq: AtomicU64,
}

impl ICodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new instance; fails with `Conflict` if the identity exists
    pub async fn register(&self, icode: ICode, handle: SandboxHandle) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&icode.id) {
            return Err(ApiError::Conflict(icode.id.clone()));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            icode.id.clone(),
            RegisteredICode {
                icode,
                handle,
                gate: Arc::new(Mutex::new(())),
                seq,
            },
        );
        Ok(())
    }

    /// Remove an entry, transferring ownership of its handle to the caller
    pub async fn unregister(&self, id: &str) -> Option<ICodeEntry> {
        let mut entries = self.entries.write().await;
        entries.remove(id).map(|stored| stored.snapshot())
    }

    /// Point-in-time snapshot of one entry
    pub async fn get(&self, id: &str) -> Option<ICodeEntry> {
        let entries = self.entries.read().await;
        entries.get(id).map(RegisteredICode::snapshot)
    }

    /// Atomically move an instance from one status to another
    ///
    /// Returns false when the instance is unknown or not in `from`; exactly
    /// one of several racing callers observes the transition.
    pub async fn transition(&self, id: &str, from: ICodeStatus, to: ICodeStatus) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(stored) if stored.icode.status == from => {
                stored.icode.status = to;
                true
            }
            _ => false,
        }
    }

    /// Snapshot of all instances, ordered by registration time
    pub async fn list(&self) -> Vec<ICode> {
        let entries = self.entries.read().await;
        let mut all: Vec<&RegisteredICode> = entries.values().collect();
        all.sort_by_key(|stored| stored.seq);
        all.into_iter().map(|stored| stored.icode.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn icode(id: &str) -> ICode {
        ICode {
            id: id.to_string(),
            repository_name: "learn-icode".to_string(),
            git_url: "github.com/junbeomlee/learn-icode".to_string(),
            path: format!("/tmp/{id}"),
            status: ICodeStatus::Running,
            deployed_at: Utc::now(),
        }
    }

    fn handle(id: &str) -> SandboxHandle {
        SandboxHandle::new(id, format!("/tmp/{id}"))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ICodeRegistry::new();
        registry.register(icode("a"), handle("sbx-a")).await.unwrap();

        let entry = registry.get("a").await.unwrap();
        assert_eq!(entry.icode.id, "a");
        assert_eq!(entry.handle.id(), "sbx-a");
        assert!(registry.get("b").await.is_none());
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let registry = ICodeRegistry::new();
        registry.register(icode("a"), handle("sbx-a")).await.unwrap();

        let err = registry.register(icode("a"), handle("sbx-a2")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(id) if id == "a"));

        // The original entry is untouched
        assert_eq!(registry.get("a").await.unwrap().handle.id(), "sbx-a");
    }

    #[tokio::test]
    async fn test_list_preserves_registration_order() {
        let registry = ICodeRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(icode(id), handle(id)).await.unwrap();
        }

        let ids: Vec<String> = registry.list().await.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = ICodeRegistry::new();
        registry.register(icode("a"), handle("sbx-a")).await.unwrap();

        let removed = registry.unregister("a").await.unwrap();
        assert_eq!(removed.icode.id, "a");
        assert!(registry.get("a").await.is_none());
        assert!(registry.unregister("a").await.is_none());
    }

    #[tokio::test]
    async fn test_transition_is_exclusive() {
        let registry = ICodeRegistry::new();
        registry.register(icode("a"), handle("sbx-a")).await.unwrap();

        assert!(
            registry
                .transition("a", ICodeStatus::Running, ICodeStatus::Stopping)
                .await
        );
        // Second caller loses the race
        assert!(
            !registry
                .transition("a", ICodeStatus::Running, ICodeStatus::Stopping)
                .await
        );
        assert_eq!(registry.get("a").await.unwrap().icode.status, ICodeStatus::Stopping);

        assert!(
            !registry
                .transition("missing", ICodeStatus::Running, ICodeStatus::Stopping)
                .await
        );
    }

    #[tokio::test]
    async fn test_gate_survives_unregister() {
        let registry = ICodeRegistry::new();
        registry.register(icode("a"), handle("sbx-a")).await.unwrap();

        let entry = registry.get("a").await.unwrap();
        let _guard = entry.gate.lock().await;
        registry.unregister("a").await.unwrap();
        // Holding the gate after removal must not panic or deadlock
    }
}
