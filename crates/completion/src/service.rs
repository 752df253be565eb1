//! One semantic backend for the whole session.
//!
//! Every editor tab owns a [`crate::CompletionEngine`], but they all talk to
//! the same helper process through a [`SemanticClient`]. Requests are
//! renumbered with session-wide ids so answers reach the tab that asked.
//! A backend that cannot be started disables semantic completion until
//! the editor exits.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::semantic::{JediProvider, SemanticProvider, SemanticRequest, SemanticResponse};

type Factory = Box<dyn Fn(&str) -> Result<Box<dyn SemanticProvider>> + Send + Sync>;

static GLOBAL_SERVICE: OnceLock<SemanticService> = OnceLock::new();

#[derive(Default)]
struct ServiceState {
    provider: Option<Box<dyn SemanticProvider>>,
    disabled: bool,
    spawn_attempts: usize,
    last_wire_id: u64,
    /// client -> (wire id, client's own id) of its newest request
    latest: HashMap<u64, (u64, u64)>,
    /// client -> answer to its newest request
    ready: HashMap<u64, SemanticResponse>,
}

impl ServiceState {
    /// Move finished responses from the backend to the clients waiting on them.
    fn route_responses(&mut self) {
        let Some(provider) = self.provider.as_mut() else {
            return;
        };
        while let Some(mut response) = provider.try_recv() {
            let owner = self
                .latest
                .iter()
                .find(|(_, (wire, _))| *wire == response.id)
                .map(|(client, (_, own))| (*client, *own));
            match owner {
                Some((client, own)) => {
                    response.id = own;
                    self.ready.insert(client, response);
                }
                None => log::debug!("Dropping stale completion response {}", response.id),
            }
        }
    }
}

pub struct SemanticService {
    factory: Factory,
    state: Mutex<ServiceState>,
    next_client: AtomicU64,
}

impl SemanticService {
    pub fn new(
        factory: impl Fn(&str) -> Result<Box<dyn SemanticProvider>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            state: Mutex::new(ServiceState::default()),
            next_client: AtomicU64::new(1),
        }
    }

    /// Service backed by the jedi helper.
    pub fn jedi() -> Self {
        Self::new(|python_command| {
            JediProvider::spawn(python_command).map(|p| Box::new(p) as Box<dyn SemanticProvider>)
        })
    }

    /// Session-wide jedi service, started lazily by the first Python tab.
    pub fn global() -> &'static SemanticService {
        GLOBAL_SERVICE.get_or_init(Self::jedi)
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Client for one document. Starts the backend on first use; returns
    /// `None` once starting it has failed.
    pub fn connect(&'static self, python_command: &str) -> Option<SemanticClient> {
        let mut state = self.lock();
        if state.disabled {
            return None;
        }
        if state.provider.is_none() {
            state.spawn_attempts += 1;
            match (self.factory)(python_command) {
                Ok(provider) => state.provider = Some(provider),
                Err(e) => {
                    log::warn!("Python completion disabled for this session: {:#}", e);
                    state.disabled = true;
                    return None;
                }
            }
        }
        Some(SemanticClient {
            service: self,
            client: self.next_client.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.lock().disabled
    }

    /// Times a backend start was tried.
    pub fn spawn_attempts(&self) -> usize {
        self.lock().spawn_attempts
    }

    /// Stop the backend; called when the editor exits.
    pub fn shutdown(&self) {
        let provider = self.lock().provider.take();
        if provider.is_some() {
            log::info!("Stopping completion helper");
        }
    }
}

/// One document's view of the shared backend.
pub struct SemanticClient {
    service: &'static SemanticService,
    client: u64,
}

impl SemanticProvider for SemanticClient {
    fn request(&mut self, request: SemanticRequest) -> Result<()> {
        let mut state = self.service.lock();
        state.last_wire_id += 1;
        let wire = state.last_wire_id;
        state.latest.insert(self.client, (wire, request.id));
        state.ready.remove(&self.client);
        let provider = state
            .provider
            .as_mut()
            .ok_or_else(|| anyhow!("Completion helper is not running"))?;
        provider.request(SemanticRequest { id: wire, ..request })
    }

    fn try_recv(&mut self) -> Option<SemanticResponse> {
        let mut state = self.service.lock();
        state.route_responses();
        state.ready.remove(&self.client)
    }

    fn is_available(&self) -> bool {
        let state = self.service.lock();
        !state.disabled && state.provider.as_ref().is_some_and(|p| p.is_available())
    }
}

impl Drop for SemanticClient {
    fn drop(&mut self) {
        let mut state = self.service.lock();
        state.latest.remove(&self.client);
        state.ready.remove(&self.client);
    }
}
