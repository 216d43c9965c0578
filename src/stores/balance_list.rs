//! Balance list screen state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{Busy, Generation};
use crate::api::BalanceService;
use crate::error::Result;
use crate::models::Balance;
use crate::reactive::Signal;

/// State for the balance list: the fetched list, a loading flag, an error
/// banner, and the confirm-then-delete flow.
///
/// The cells are independent, so a stale list stays visible under an error.
pub struct BalanceListStore {
    service: Arc<dyn BalanceService>,
    balances: Signal<Vec<Balance>>,
    loading: Signal<bool>,
    error: Signal<Option<String>>,
    pending_delete: Signal<Option<i64>>,
    deleting: Signal<BTreeSet<i64>>,
    generation: Generation,
}

impl BalanceListStore {
    pub fn new(service: Arc<dyn BalanceService>) -> Self {
        Self {
            service,
            balances: Signal::default(),
            loading: Signal::new(false),
            error: Signal::new(None),
            pending_delete: Signal::new(None),
            deleting: Signal::default(),
            generation: Generation::default(),
        }
    }

    pub fn balances(&self) -> &Signal<Vec<Balance>> {
        &self.balances
    }

    pub fn loading(&self) -> &Signal<bool> {
        &self.loading
    }

    pub fn error(&self) -> &Signal<Option<String>> {
        &self.error
    }

    /// Id awaiting the user's confirmation, if any.
    pub fn pending_delete(&self) -> &Signal<Option<i64>> {
        &self.pending_delete
    }

    /// Ids with a delete call in flight.
    pub fn deleting(&self) -> &Signal<BTreeSet<i64>> {
        &self.deleting
    }

    pub fn is_deleting(&self, id: i64) -> bool {
        self.deleting.with(|ids| ids.contains(&id))
    }

    pub fn is_empty(&self) -> bool {
        self.balances.with(Vec::is_empty)
    }

    /// Fetch the list from the server.
    ///
    /// On success the list is replaced in server order. On failure the
    /// previous list is kept and the error banner is set. When loads overlap,
    /// only the most recently issued one writes its outcome.
    pub async fn load(&self) -> Result<()> {
        let ticket = self.generation.next();
        let _busy = Busy::raise_for(&self.loading, &self.generation, ticket);
        self.error.set(None);

        let result = self.service.list().await;

        if !self.generation.is_current(ticket) {
            tracing::debug!(name: "balances.load.stale", ticket, "discarding superseded response");
            return result.map(|_| ());
        }

        match result {
            Ok(balances) => {
                tracing::debug!(name: "balances.load.ok", count = balances.len(), "balances loaded");
                self.balances.set(balances);
                Ok(())
            }
            Err(err) => {
                tracing::error!(name: "balances.load.failed", error = %err, status = ?err.status, "Error loading balances");
                self.error
                    .set(Some(format!("Failed to load balances: {}", err.message)));
                Err(err)
            }
        }
    }

    /// Reload the list.
    pub async fn refresh(&self) -> Result<()> {
        self.load().await
    }

    /// Ask for confirmation before deleting `id`. Replaces any earlier request.
    pub fn request_delete(&self, id: i64) {
        self.pending_delete.set(Some(id));
    }

    /// Drop the pending confirmation without touching anything else.
    pub fn cancel_delete(&self) {
        self.pending_delete.set(None);
    }

    /// Delete `id` on the server and, on success, remove it from the list.
    ///
    /// An id missing from the local list is still sent; the server decides.
    pub async fn confirm_delete(&self, id: i64) -> Result<()> {
        self.pending_delete.set(None);
        self.deleting.update(|ids| {
            ids.insert(id);
        });
        self.error.set(None);

        let result = self.service.delete(id).await;

        match &result {
            Ok(()) => {
                tracing::info!(name: "balances.delete.ok", id, "balance deleted");
                self.balances.update(|balances| {
                    if let Some(index) = balances.iter().position(|b| b.id == id) {
                        balances.remove(index);
                    }
                });
            }
            Err(err) => {
                tracing::error!(name: "balances.delete.failed", id, error = %err, status = ?err.status, "Error deleting balance");
                self.error.set(Some(err.message.clone()));
            }
        }

        self.deleting.update(|ids| {
            ids.remove(&id);
        });
        result
    }
}

impl fmt::Debug for BalanceListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BalanceListStore")
            .field("balances", &self.balances)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("pending_delete", &self.pending_delete)
            .field("deleting", &self.deleting)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::stores::testing::{FakeBalances, balance};
    use std::sync::Mutex;

    fn store() -> (Arc<FakeBalances>, BalanceListStore) {
        let fake = Arc::new(FakeBalances::default());
        let store = BalanceListStore::new(Arc::clone(&fake) as Arc<dyn BalanceService>);
        (fake, store)
    }

    fn seeded() -> Vec<Balance> {
        vec![
            balance(1, "2025-01", 1000.0),
            balance(2, "2025-02", 1100.0),
            balance(3, "2025-03", 1050.0),
        ]
    }

    #[tokio::test]
    async fn test_load_replaces_list_in_server_order() {
        let (fake, store) = store();
        let reply = vec![balance(9, "2025-05", 5.0), balance(4, "2025-01", 1.0)];
        fake.list.push(Ok(reply.clone()));

        store.load().await.unwrap();

        assert_eq!(store.balances().get(), reply);
        assert!(!store.loading().get());
        assert_eq!(store.error().get(), None);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_list() {
        let (fake, store) = store();
        fake.list.push(Ok(seeded()));
        fake.list
            .push(Err(DomainError::new("Server error occurred", Some(500))));

        store.load().await.unwrap();
        let err = store.load().await.unwrap_err();

        assert_eq!(err.status, Some(500));
        assert_eq!(store.balances().get(), seeded());
        assert!(!store.loading().get());
        assert_eq!(
            store.error().get().as_deref(),
            Some("Failed to load balances: Server error occurred")
        );
    }

    #[tokio::test]
    async fn test_loading_flag_tracks_in_flight_call() {
        let (fake, store) = store();
        let reply = fake.list.defer();

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&transitions);
        let _sub = store
            .loading()
            .subscribe(move |loading| sink.lock().unwrap().push(*loading));

        let check = async {
            tokio::task::yield_now().await;
            assert!(store.loading().get());
            reply.send(Ok(seeded())).unwrap();
        };
        let (result, ()) = tokio::join!(store.load(), check);

        result.unwrap();
        assert!(!store.loading().get());
        assert_eq!(*transitions.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let (fake, store) = store();
        let first = fake.list.defer();
        let second = fake.list.defer();

        let deliver = async {
            tokio::task::yield_now().await;
            second.send(Ok(vec![balance(2, "2025-02", 2.0)])).unwrap();
            tokio::task::yield_now().await;
            first.send(Ok(vec![balance(1, "2025-01", 1.0)])).unwrap();
        };
        let (a, b, ()) = tokio::join!(store.load(), store.load(), deliver);

        a.unwrap();
        b.unwrap();
        assert_eq!(store.balances().get(), vec![balance(2, "2025-02", 2.0)]);
        assert!(!store.loading().get());
    }

    #[test]
    fn test_request_delete_overwrites_and_cancel_clears() {
        let (fake, store) = store();

        store.request_delete(1);
        store.request_delete(2);
        assert_eq!(store.pending_delete().get(), Some(2));

        store.cancel_delete();
        assert_eq!(store.pending_delete().get(), None);
        assert!(fake.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_delete_removes_exactly_one() {
        let (fake, store) = store();
        fake.list.push(Ok(seeded()));
        fake.delete.push(Ok(()));
        store.load().await.unwrap();

        store.request_delete(2);
        store.confirm_delete(2).await.unwrap();

        let ids: Vec<i64> = store.balances().get().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.pending_delete().get(), None);
        assert!(!store.is_deleting(2));
        assert_eq!(*fake.deleted.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_deleting_flag_set_while_in_flight() {
        let (fake, store) = store();
        let reply = fake.delete.defer();

        let check = async {
            tokio::task::yield_now().await;
            assert!(store.is_deleting(7));
            reply.send(Ok(())).unwrap();
        };
        let (result, ()) = tokio::join!(store.confirm_delete(7), check);

        result.unwrap();
        assert!(!store.is_deleting(7));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_list() {
        let (fake, store) = store();
        fake.list.push(Ok(seeded()));
        fake.delete
            .push(Err(DomainError::new("Balance not found", Some(404))));
        store.load().await.unwrap();

        let err = store.confirm_delete(42).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.balances().get(), seeded());
        assert_eq!(store.error().get().as_deref(), Some("Balance not found"));
        assert!(store.deleting().get().is_empty());
    }
}
