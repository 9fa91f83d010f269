//! Execution slots multiplexed over one transport client.
//!
//! An [`AsyncClient`] owns an arena of slots, each holding one outstanding
//! request and the sink its outcome goes to. Slots advance one non-blocking
//! step per [`AsyncClient::process`] call; finished slots are removed and
//! delivered by [`AsyncClient::handle_remove`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem;
use std::rc::{Rc, Weak};

use firelink_http::{HttpExecutor, HttpRequest, HttpResponse, Method};

use crate::config::ClientConfig;
use crate::error::FirebaseError;
use crate::query::QueryParams;
use crate::result::{AsyncResult, ResultSink};

pub type SlotId = u64;

/// Everything needed to put one request on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRequest {
    /// Scheme and authority, e.g. `https://firestore.googleapis.com`.
    pub origin: String,
    pub host: String,
    /// Absolute path, starting with `/v1/projects/`.
    pub path: String,
    pub method: Method,
    pub query: QueryParams,
    pub body: Option<String>,
    pub token: String,
    pub uid: String,
    /// False when a blocking caller waits on this slot.
    pub is_async: bool,
}

impl SlotRequest {
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, String::len)
    }

    pub fn to_http_request(&self) -> HttpRequest {
        let mut request = HttpRequest::new(self.method, format!("{}{}", self.origin, self.path));
        request.query = self.query.pairs().to_vec();
        request.body = self.body.clone();
        if !self.token.is_empty() {
            request = request.with_header("Authorization", format!("Bearer {}", self.token));
        }
        request
    }
}

enum SlotState {
    Queued(HttpRequest),
    InFlight,
    Done(Result<HttpResponse, firelink_http::Error>),
}

/// One outstanding request bound to a client.
pub(crate) struct ExecutionSlot {
    id: SlotId,
    uid: String,
    state: SlotState,
    sink: ResultSink,
}

impl ExecutionSlot {
    fn is_done(&self) -> bool {
        matches!(self.state, SlotState::Done(_))
    }

    fn is_in_flight(&self) -> bool {
        matches!(self.state, SlotState::InFlight)
    }

    /// One step: start a queued request or poll an in-flight one.
    fn advance(&mut self, executor: &mut dyn HttpExecutor) {
        self.state = match mem::replace(&mut self.state, SlotState::InFlight) {
            SlotState::Queued(request) => match executor.start(self.id, request) {
                Ok(()) => SlotState::InFlight,
                Err(error) => {
                    tracing::debug!(slot = self.id, %error, "request failed to start");
                    SlotState::Done(Err(error))
                }
            },
            SlotState::InFlight => match executor.poll(self.id) {
                Some(outcome) => SlotState::Done(outcome),
                None => SlotState::InFlight,
            },
            done @ SlotState::Done(_) => done,
        };
    }

    fn finish(self) {
        let result = match self.state {
            SlotState::Done(outcome) => AsyncResult::from_outcome(self.uid, outcome),
            SlotState::Queued(_) | SlotState::InFlight => {
                AsyncResult::from_error(self.uid, FirebaseError::OperationCancelled)
            }
        };
        self.sink.deliver(result);
    }
}

pub(crate) struct ClientState {
    executor: Box<dyn HttpExecutor>,
    config: ClientConfig,
    slots: BTreeMap<SlotId, ExecutionSlot>,
    next_slot_id: SlotId,
    stopped: bool,
}

impl ClientState {
    fn drain(&mut self) -> Vec<ExecutionSlot> {
        let slots = mem::take(&mut self.slots);
        for slot in slots.values() {
            if slot.is_in_flight() {
                self.executor.cancel(slot.id);
            }
        }
        slots.into_values().collect()
    }
}

impl Drop for ClientState {
    fn drop(&mut self) {
        let remaining = self.drain();
        if !remaining.is_empty() {
            tracing::debug!(count = remaining.len(), "cancelling slots of dropped client");
        }
        for slot in remaining {
            slot.finish();
        }
    }
}

/// Handle to a transport client and its slot arena.
///
/// Clones share the same arena.
#[derive(Clone)]
pub struct AsyncClient {
    inner: Rc<RefCell<ClientState>>,
}

impl AsyncClient {
    pub fn new(executor: impl HttpExecutor + 'static) -> Self {
        Self::with_config(executor, ClientConfig::default())
    }

    pub fn with_config(executor: impl HttpExecutor + 'static, config: ClientConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClientState {
                executor: Box::new(executor),
                config,
                slots: BTreeMap::new(),
                next_slot_id: 0,
                stopped: false,
            })),
        }
    }

    /// Allocate a slot for `request`.
    ///
    /// Hands `sink` back untouched when the client is stopped or full.
    pub fn new_slot(&self, request: SlotRequest, sink: ResultSink) -> Result<SlotId, ResultSink> {
        let mut state = self.inner.borrow_mut();
        if state.stopped || state.slots.len() >= state.config.max_slots {
            return Err(sink);
        }

        let id = state.next_slot_id;
        state.next_slot_id += 1;
        tracing::debug!(
            slot = id,
            host = %request.host,
            method = %request.method,
            path = %request.path,
            content_length = request.content_length(),
            is_async = request.is_async,
            "slot allocated"
        );
        let slot = ExecutionSlot {
            id,
            uid: request.uid.clone(),
            state: SlotState::Queued(request.to_http_request()),
            sink,
        };
        state.slots.insert(id, slot);
        Ok(id)
    }

    /// Advance every slot by one non-blocking step, in slot id order.
    pub fn process(&self) {
        let mut state = self.inner.borrow_mut();
        let ClientState {
            executor, slots, ..
        } = &mut *state;
        for slot in slots.values_mut() {
            slot.advance(executor.as_mut());
        }
        tracing::trace!(slots = slots.len(), "processed");
    }

    /// Remove finished slots and deliver their outcomes.
    ///
    /// Sinks run after the arena is released, so a callback may dispatch on
    /// this client again. Returns the number delivered.
    pub fn handle_remove(&self) -> usize {
        let done: Vec<ExecutionSlot> = {
            let mut state = self.inner.borrow_mut();
            let (done, pending): (BTreeMap<_, _>, BTreeMap<_, _>) = mem::take(&mut state.slots)
                .into_iter()
                .partition(|(_, slot)| slot.is_done());
            state.slots = pending;
            done.into_values().collect()
        };

        let count = done.len();
        for slot in done {
            slot.finish();
        }
        count
    }

    /// Refuse new slots and cancel the current ones.
    pub fn stop(&self) {
        let cancelled = {
            let mut state = self.inner.borrow_mut();
            state.stopped = true;
            state.drain()
        };
        for slot in cancelled {
            slot.finish();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.borrow().stopped
    }

    pub fn slot_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_pending(&self, id: SlotId) -> bool {
        self.inner.borrow().slots.contains_key(&id)
    }

    pub fn max_slots(&self) -> usize {
        self.inner.borrow().config.max_slots
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<ClientState>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_weak(weak: &Weak<RefCell<ClientState>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn refers_to(&self, weak: &Weak<RefCell<ClientState>>) -> bool {
        Weak::ptr_eq(&Rc::downgrade(&self.inner), weak)
    }
}
