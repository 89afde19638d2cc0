//! Live, ranked views of the bindings matching one requested type.
//!
//! Entries are ordered by rank (descending), then by the registration ordinal
//! of the publisher that offered them, then by the order they were offered.
//! A binding identity is held at most once; later offers of the same binding
//! are ignored unless the registration holding it has been retired.

use lodestar_api::{Binding, BindingSubscriber, Rank, RankedBinding, TypeRef};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Ordinal and token used for offers that do not come through a locator pairing.
const DIRECT_ORDINAL: u64 = u64::MAX;
const DIRECT_TOKEN: u64 = u64::MAX;

/// The registration an offer comes from.
///
/// `token` is unique per registration. `ordinal` orders offers and survives
/// a replacement of the registration.
#[derive(Clone)]
pub(crate) struct Origin {
    token: u64,
    ordinal: u64,
    live: Arc<AtomicBool>,
}

impl Origin {
    pub(crate) fn new(token: u64, ordinal: u64) -> Self {
        Self {
            token,
            ordinal,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn direct() -> Self {
        Self::new(DIRECT_TOKEN, DIRECT_ORDINAL)
    }

    pub(crate) fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn retire(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn is_direct(&self) -> bool {
        self.token == DIRECT_TOKEN
    }

    /// Whether a binding held under `self` passes to an offer from `other`.
    fn yields_to(&self, other: &Origin) -> bool {
        self.token != other.token && !self.is_live()
    }
}

/// Observer of committed changes to a live view.
///
/// Callbacks run on the thread that made the change, after the view lock is released.
pub trait BindingListener: Send + Sync {
    fn added(&self, binding: &RankedBinding);
    fn removed(&self, binding: &Arc<Binding>);
}

enum Event {
    Added(RankedBinding),
    Removed(Arc<Binding>),
}

struct Entry {
    binding: Arc<Binding>,
    rank: Rank,
    origin: Origin,
    seq: u64,
}

impl Entry {
    fn order_key(&self) -> (Reverse<Rank>, u64, u64) {
        (Reverse(self.rank), self.origin.ordinal, self.seq)
    }

    fn ranked(&self) -> RankedBinding {
        RankedBinding {
            binding: Arc::clone(&self.binding),
            rank: self.rank,
        }
    }
}

fn identity(binding: &Arc<Binding>) -> usize {
    Arc::as_ptr(binding) as usize
}

#[derive(Default)]
struct ViewState {
    entries: Vec<Entry>,
    held: HashSet<usize>,
    next_seq: u64,
    generation: u64,
    closed: bool,
    listeners: Vec<Arc<dyn BindingListener>>,
    pending: Vec<Event>,
}

impl ViewState {
    fn position(&self, binding: &Arc<Binding>) -> Option<usize> {
        self.entries.iter().position(|e| Arc::ptr_eq(&e.binding, binding))
    }

    fn insert(&mut self, binding: Arc<Binding>, rank: Rank, origin: &Origin) -> bool {
        if !self.held.insert(identity(&binding)) {
            // Held by a retired registration whose withdrawal has not run yet
            match self.position(&binding) {
                Some(pos) if self.entries[pos].origin.yields_to(origin) => {
                    let stale = self.entries.remove(pos);
                    if !self.listeners.is_empty() {
                        self.pending.push(Event::Removed(stale.binding));
                    }
                }
                _ => return false,
            }
        }
        let entry = Entry {
            binding,
            rank,
            origin: origin.clone(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let key = entry.order_key();
        let pos = self.entries.partition_point(|e| e.order_key() < key);
        if !self.listeners.is_empty() {
            self.pending.push(Event::Added(entry.ranked()));
        }
        self.entries.insert(pos, entry);
        self.generation += 1;
        true
    }

    /// Drop `binding`. A registration only removes what it offered itself.
    fn remove(&mut self, binding: &Arc<Binding>, origin: &Origin) -> bool {
        let Some(pos) = self.position(binding) else {
            return false;
        };
        if !origin.is_direct() && self.entries[pos].origin.token != origin.token {
            return false;
        }
        let entry = self.entries.remove(pos);
        self.held.remove(&identity(binding));
        if !self.listeners.is_empty() {
            self.pending.push(Event::Removed(entry.binding));
        }
        self.generation += 1;
        true
    }

    fn clear(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.held.clear();
        if entries.is_empty() {
            return;
        }
        if !self.listeners.is_empty() {
            self.pending.extend(entries.into_iter().map(|e| Event::Removed(e.binding)));
        }
        self.generation += 1;
    }

    fn bindings(&self) -> Vec<Arc<Binding>> {
        self.entries.iter().map(|e| Arc::clone(&e.binding)).collect()
    }

    fn take_dispatch(&mut self) -> Dispatch {
        if self.pending.is_empty() {
            return Dispatch::default();
        }
        Dispatch {
            listeners: self.listeners.clone(),
            events: std::mem::take(&mut self.pending),
        }
    }
}

#[derive(Default)]
struct Dispatch {
    listeners: Vec<Arc<dyn BindingListener>>,
    events: Vec<Event>,
}

impl Dispatch {
    fn run(self) {
        for event in &self.events {
            for listener in &self.listeners {
                match event {
                    Event::Added(ranked) => listener.added(ranked),
                    Event::Removed(binding) => listener.removed(binding),
                }
            }
        }
    }
}

/// Subscriber handed to a publisher for one pairing.
///
/// Holds the view lock for its whole lifetime and stamps every offer with
/// the registration it comes from.
struct Pairing<'a> {
    requested: &'a TypeRef,
    origin: &'a Origin,
    state: RefCell<&'a mut ViewState>,
}

impl BindingSubscriber for Pairing<'_> {
    fn requested(&self) -> &TypeRef {
        self.requested
    }

    fn add(&self, binding: Arc<Binding>, rank: Rank) {
        self.state.borrow_mut().insert(binding, rank, self.origin);
    }

    fn remove(&self, binding: &Arc<Binding>) -> bool {
        self.state.borrow_mut().remove(binding, self.origin)
    }

    fn bindings(&self) -> Vec<Arc<Binding>> {
        self.state.borrow().bindings()
    }
}

/// Merged, ranked view of every binding matching one requested type.
pub struct LiveBindings {
    id: u64,
    requested: TypeRef,
    state: Mutex<ViewState>,
}

impl LiveBindings {
    /// A standalone view; a locator creates its own through `add_subscriber`.
    pub fn new(requested: TypeRef) -> Self {
        Self::with_id(0, requested)
    }

    pub(crate) fn with_id(id: u64, requested: TypeRef) -> Self {
        Self {
            id,
            requested,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn requested(&self) -> &TypeRef {
        &self.requested
    }

    /// Ranked entries as of now.
    pub fn snapshot(&self) -> Vec<RankedBinding> {
        self.state.lock().entries.iter().map(Entry::ranked).collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<RankedBinding> {
        self.snapshot().into_iter()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Highest ranked binding, if any.
    pub fn first(&self) -> Option<RankedBinding> {
        self.state.lock().entries.first().map(Entry::ranked)
    }

    /// Bumped on every committed change.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Register a listener. Current entries are reported as added first.
    pub fn watch(&self, listener: Arc<dyn BindingListener>) {
        let current = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.listeners.push(Arc::clone(&listener));
            state.entries.iter().map(Entry::ranked).collect::<Vec<_>>()
        };
        for ranked in &current {
            listener.added(ranked);
        }
    }

    pub fn unwatch(&self, listener: &Arc<dyn BindingListener>) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        state.listeners.len() != before
    }

    /// Run one publisher pairing under the view lock.
    ///
    /// Returns false without calling `f` once the view is closed.
    pub(crate) fn pair<F>(&self, origin: &Origin, f: F) -> bool
    where
        F: FnOnce(&dyn BindingSubscriber),
    {
        let dispatch = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            {
                let pairing = Pairing {
                    requested: &self.requested,
                    origin,
                    state: RefCell::new(&mut *state),
                };
                f(&pairing);
            }
            state.take_dispatch()
        };
        dispatch.run();
        true
    }

    /// Close the view: run the final withdrawal, then drop whatever is left.
    pub(crate) fn close<F>(&self, withdraw: F) -> bool
    where
        F: FnOnce(&dyn BindingSubscriber),
    {
        let dispatch = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            {
                let direct = Origin::direct();
                let pairing = Pairing {
                    requested: &self.requested,
                    origin: &direct,
                    state: RefCell::new(&mut *state),
                };
                withdraw(&pairing);
            }
            state.clear();
            state.closed = true;
            let dispatch = state.take_dispatch();
            state.listeners.clear();
            dispatch
        };
        dispatch.run();
        true
    }
}

impl BindingSubscriber for LiveBindings {
    fn requested(&self) -> &TypeRef {
        &self.requested
    }

    fn add(&self, binding: Arc<Binding>, rank: Rank) {
        let dispatch = {
            let mut state = self.state.lock();
            state.insert(binding, rank, &Origin::direct());
            state.take_dispatch()
        };
        dispatch.run();
    }

    fn remove(&self, binding: &Arc<Binding>) -> bool {
        let (removed, dispatch) = {
            let mut state = self.state.lock();
            let removed = state.remove(binding, &Origin::direct());
            (removed, state.take_dispatch())
        };
        dispatch.run();
        removed
    }

    fn bindings(&self) -> Vec<Arc<Binding>> {
        self.state.lock().bindings()
    }
}
