//! Per-screen reactive state stores.
//!
//! Each store owns a set of [`Signal`](crate::reactive::Signal) cells and
//! exposes async commands that call a resource client and fold the outcome
//! back into those cells. Loading flags are cleared on every path.
//!
//! - [`BalanceListStore`]: list, refresh and confirm-then-delete
//! - [`AddBalanceStore`]: validated single-flight create
//! - [`MetricsStore`]: current month plus joined delta/summary range queries
//! - [`ChatStore`]: append-only conversation with the assistant

mod add_balance;
mod balance_list;
mod chat;
mod metrics;

#[cfg(test)]
mod testing;

pub use add_balance::{AddBalanceStore, BalanceField, CREATE_FAILED_MESSAGE, SubmitOutcome};
pub use balance_list::BalanceListStore;
pub use chat::ChatStore;
pub use metrics::{LoadError, MetricsStore, default_range};

use std::sync::atomic::{AtomicU64, Ordering};

use crate::reactive::Signal;

/// Screen a store asks the shell to navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Balances,
    AddBalance,
    Metrics,
    Chat,
}

/// Request sequencing for commands that may overlap.
///
/// Each issued call takes a ticket; only the holder of the newest ticket may
/// write results back.
#[derive(Debug, Default)]
pub(crate) struct Generation(AtomicU64);

impl Generation {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::Acquire) == ticket
    }
}

/// A raised busy flag, lowered again when the guard is dropped.
///
/// Commands hold one across their await points so the flag comes back down
/// on every exit, including when the command future itself is dropped. A
/// guard tied to a [`Generation`] ticket only lowers the flag while that
/// ticket is still the newest; a superseded call leaves it to its successor.
pub(crate) struct Busy<'a> {
    flag: &'a Signal<bool>,
    owner: Option<(&'a Generation, u64)>,
}

impl<'a> Busy<'a> {
    pub(crate) fn raise(flag: &'a Signal<bool>) -> Self {
        flag.set(true);
        Self { flag, owner: None }
    }

    pub(crate) fn raise_for(flag: &'a Signal<bool>, generation: &'a Generation, ticket: u64) -> Self {
        flag.set(true);
        Self {
            flag,
            owner: Some((generation, ticket)),
        }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let owns_flag = self
            .owner
            .is_none_or(|(generation, ticket)| generation.is_current(ticket));
        if owns_flag && self.flag.get() {
            self.flag.set(false);
        }
    }
}
