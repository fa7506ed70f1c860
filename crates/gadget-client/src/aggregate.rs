//! # Aggregate Data Context
//!
//! Loads every backend collection at once and publishes them as one
//! [`Snapshot`].
//!
//! ## Load Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Load Cycle N                                  │
//! │                                                                         │
//! │  load() ── cycle = ++issued ── loading = true                           │
//! │     │                                                                   │
//! │     ├── no token? ───────────────────────────► empty snapshot           │
//! │     │                                                                   │
//! │     ▼  tokio::join! (fan-out)                                           │
//! │  ┌──────────┬──────────────┬──────────┬───────┬────────────┬────────┐  │
//! │  │ products │ transactions │ expenses │ users │ categories │ brands │  │
//! │  └────┬─────┴──────┬───────┴────┬─────┴───┬───┴─────┬──────┴───┬────┘  │
//! │       ▼            ▼            ▼         ▼         ▼          ▼       │
//! │     Ok(v)        Err(e)       Ok(v)     Ok(v)     Ok(v)      Ok(v)     │
//! │       │            │ warn!, []                                          │
//! │       └────────────┴─────────► Branches ──► Snapshot { cycle: N }      │
//! │                                                  │                      │
//! │                    N > published cycle? ─── yes ─┴─► publish            │
//! │                                          └── no ────► drop (stale)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! The snapshot is an `Arc<Snapshot>` replaced whole through a
//! `tokio::sync::watch` channel, so readers see either the old value or the
//! new one. The check "is this cycle newer than what's published" and the
//! publish itself happen inside one `send_if_modified` closure, under the
//! channel's lock.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use gadget_core::{Brand, Category, Expense, Product, Snapshot, Transaction, User};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ClientResult;
use crate::gateway::{Backend, Resource};
use crate::normalize;
use crate::session::SessionHandle;

// =============================================================================
// Published State
// =============================================================================

/// What subscribers see.
#[derive(Debug, Clone, Default)]
pub struct ContextState {
    pub snapshot: Arc<Snapshot>,
    /// True while any load cycle is in flight.
    pub loading: bool,
}

// =============================================================================
// Branch Results
// =============================================================================

/// Outcome of one branch: the normalized collection or why it failed.
pub type BranchResult<T> = ClientResult<Vec<T>>;

/// The settled outcome of all six branches of one cycle.
#[derive(Debug)]
pub struct Branches {
    pub products: BranchResult<Product>,
    pub transactions: BranchResult<Transaction>,
    pub expenses: BranchResult<Expense>,
    pub users: BranchResult<User>,
    pub categories: BranchResult<Category>,
    pub brands: BranchResult<Brand>,
}

impl Branches {
    /// Resources whose branch failed, in fetch order.
    pub fn failed(&self) -> Vec<Resource> {
        let outcomes = [
            (Resource::Products, self.products.is_err()),
            (Resource::Transactions, self.transactions.is_err()),
            (Resource::Expenses, self.expenses.is_err()),
            (Resource::Users, self.users.is_err()),
            (Resource::Categories, self.categories.is_err()),
            (Resource::Brands, self.brands.is_err()),
        ];
        outcomes
            .into_iter()
            .filter_map(|(r, failed)| failed.then_some(r))
            .collect()
    }

    /// Merges into a snapshot. A failed branch becomes an empty collection.
    pub fn into_snapshot(self, cycle: u64) -> Snapshot {
        Snapshot {
            products: settle(Resource::Products, cycle, self.products),
            transactions: settle(Resource::Transactions, cycle, self.transactions),
            expenses: settle(Resource::Expenses, cycle, self.expenses),
            users: settle(Resource::Users, cycle, self.users),
            categories: settle(Resource::Categories, cycle, self.categories),
            brands: settle(Resource::Brands, cycle, self.brands),
            cycle,
        }
    }
}

fn settle<T>(resource: Resource, cycle: u64, result: BranchResult<T>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) if e.is_retryable() => {
            warn!(resource = %resource, cycle, error = %e, "Branch unavailable, showing it as empty");
            Vec::new()
        }
        Err(e) => {
            error!(resource = %resource, cycle, error = %e, "Branch rejected, showing it as empty");
            Vec::new()
        }
    }
}

/// What a call to [`DataContext::load`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub cycle: u64,
    /// False when a newer cycle had already been published.
    pub applied: bool,
    pub failed: Vec<Resource>,
}

// =============================================================================
// Data Context
// =============================================================================

pub struct DataContext {
    backend: Arc<dyn Backend>,
    session: SessionHandle,
    state: watch::Sender<ContextState>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
}

impl DataContext {
    pub fn new(backend: Arc<dyn Backend>, session: SessionHandle) -> Self {
        let (state, _) = watch::channel(ContextState::default());
        DataContext {
            backend,
            session,
            state,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// A receiver that sees every published snapshot and loading change.
    pub fn subscribe(&self) -> watch::Receiver<ContextState> {
        self.state.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.borrow().snapshot.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Runs one load cycle and publishes its result unless it went stale.
    ///
    /// Without a session token the cycle publishes an empty snapshot; that's
    /// the signed-out state, not an error.
    pub async fn load(&self) -> LoadOutcome {
        let cycle = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::enter(self);

        let (snapshot, failed) = if self.session.token().await.is_some() {
            debug!(cycle, "Loading all collections");
            let branches = self.fetch_all().await;
            let failed = branches.failed();
            (branches.into_snapshot(cycle), failed)
        } else {
            debug!(cycle, "No session, publishing empty snapshot");
            (
                Snapshot {
                    cycle,
                    ..Snapshot::default()
                },
                Vec::new(),
            )
        };

        in_flight.settle();

        let mut applied = false;
        self.state.send_if_modified(|s| {
            let mut changed = false;
            if cycle > s.snapshot.cycle {
                s.snapshot = Arc::new(snapshot);
                applied = true;
                changed = true;
            }
            let loading = self.in_flight.load(Ordering::SeqCst) > 0;
            if s.loading != loading {
                s.loading = loading;
                changed = true;
            }
            changed
        });

        if applied {
            info!(cycle, failed = failed.len(), "Snapshot published");
        } else {
            debug!(cycle, "Dropping stale load cycle");
        }

        LoadOutcome {
            cycle,
            applied,
            failed,
        }
    }

    /// Re-runs [`load`](Self::load). There is no diffing; the snapshot is
    /// replaced whole.
    pub async fn refresh(&self) -> LoadOutcome {
        self.load().await
    }

    /// Publishes an empty snapshot and makes every in-flight cycle stale.
    pub fn clear(&self) {
        let cycle = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.snapshot = Arc::new(Snapshot {
                cycle,
                ..Snapshot::default()
            });
        });
        debug!(cycle, "Context cleared");
    }

    /// Republishes `loading` from the in-flight count.
    fn publish_loading(&self) {
        self.state.send_if_modified(|s| {
            let loading = self.in_flight.load(Ordering::SeqCst) > 0;
            let changed = s.loading != loading;
            s.loading = loading;
            changed
        });
    }

    async fn fetch_all(&self) -> Branches {
        let (products, transactions, expenses, users, categories, brands) = tokio::join!(
            self.fetch(Resource::Products, normalize::products),
            self.fetch(Resource::Transactions, normalize::transactions),
            self.fetch(Resource::Expenses, normalize::expenses),
            self.fetch(Resource::Users, normalize::users),
            self.fetch(Resource::Categories, normalize::categories),
            self.fetch(Resource::Brands, normalize::brands),
        );

        Branches {
            products,
            transactions,
            expenses,
            users,
            categories,
            brands,
        }
    }

    async fn fetch<T>(
        &self,
        resource: Resource,
        normalize: fn(&Value) -> ClientResult<Vec<T>>,
    ) -> BranchResult<T> {
        let raw = self.backend.list(resource).await?;
        normalize(&raw)
    }
}

/// Counts one cycle as in flight. A `load` future dropped before it settles
/// (aborted task, losing `select!` arm) still gives its count back here.
struct InFlight<'a> {
    context: &'a DataContext,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn enter(context: &'a DataContext) -> Self {
        context.in_flight.fetch_add(1, Ordering::SeqCst);
        context.publish_loading();
        InFlight {
            context,
            settled: false,
        }
    }

    /// Gives the count back; the caller publishes `loading` with its result.
    fn settle(mut self) {
        self.settled = true;
        self.context.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.context.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.context.publish_loading();
            debug!("Load cycle dropped before settling");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
