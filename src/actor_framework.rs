//! Generic resource actor.
//!
//! One task owns a keyed store of entities and serves create/get/list/update/delete
//! plus entity-specific actions over an mpsc channel. Every request carries a
//! oneshot sender for its reply, so callers see a plain async method on
//! [`ResourceClient`].

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any domain entity must implement to be managed by [`ResourceActor`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Ord + Clone + Send + Sync + Display + Debug + 'static;
    type CreateParams: Send + Debug + 'static;
    type UpdateParams: Send + Debug + 'static;
    type Action: Send + Debug + 'static;
    type ActionResult: Send + Debug + 'static;
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Id the entity must be stored under, when the caller dictates it
    /// (a shipper profile shares its user's id). `None` lets the actor generate one.
    fn preferred_id(_params: &Self::CreateParams) -> Option<Self::Id> {
        None
    }

    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, Self::Error>;

    fn on_update(&mut self, params: Self::UpdateParams) -> Result<(), Self::Error>;

    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a domain action. The actor runs this on a copy and only commits the
    /// copy when it returns `Ok`, so a rejected action never leaves partial state.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Transport and store-level failures, wrapping the entity's own error type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError<E> {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("{0}")]
    Entity(E),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the response")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T::Id, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        params: T::UpdateParams,
        respond_to: Response<T, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<(), T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Serve requests until every client has been dropped.
    pub async fn run(mut self) {
        let kind = std::any::type_name::<T>();
        debug!(entity = kind, "Resource actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                ResourceRequest::Update { id, params, respond_to } => {
                    let _ = respond_to.send(self.update(id, params));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.delete(id));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.act(id, action));
                }
            }
        }
        debug!(entity = kind, "Resource actor stopped");
    }

    fn create(&mut self, params: T::CreateParams) -> Result<T::Id, FrameworkError<T::Error>> {
        let id = match T::preferred_id(&params) {
            Some(id) if self.store.contains_key(&id) => {
                return Err(FrameworkError::AlreadyExists(id.to_string()));
            }
            Some(id) => id,
            None => (self.next_id_fn)(),
        };
        let item = T::from_create_params(id.clone(), params).map_err(FrameworkError::Entity)?;
        self.store.insert(id.clone(), item);
        Ok(id)
    }

    fn update(&mut self, id: T::Id, params: T::UpdateParams) -> Result<T, FrameworkError<T::Error>> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut draft = item.clone();
        draft.on_update(params).map_err(FrameworkError::Entity)?;
        *item = draft.clone();
        Ok(draft)
    }

    fn delete(&mut self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        let item = self
            .store
            .get(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.on_delete().map_err(FrameworkError::Entity)?;
        self.store.remove(&id);
        Ok(())
    }

    fn act(&mut self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut draft = item.clone();
        match draft.handle_action(action) {
            Ok(result) => {
                *item = draft;
                Ok(result)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Action rejected");
                Err(FrameworkError::Entity(e))
            }
        }
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T::Id, FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::List { respond_to }).await
    }

    pub async fn update(&self, id: T::Id, params: T::UpdateParams) -> Result<T, FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::Update { id, params, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        self.call(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }
}

/// Sequential id generator producing `{prefix}_{n}` starting at 1.
pub fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = std::sync::atomic::AtomicU64::new(1);
    move || {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("{}_{}", prefix, n)
    }
}
