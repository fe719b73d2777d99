//! Application state: the in-memory session store and the trainer config.
//!
//! Sessions are keyed by uuid and live for the duration of a connection (or
//! until an HTTP client stops polling); nothing is persisted. The single
//! writer per session is whoever holds the write lock — learner actions and
//! timer firings alike.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_trainer_config_from_env, TrainerConfig};
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
  pub sessions: Arc<RwLock<HashMap<String, Session>>>,
  pub config: TrainerConfig,
}

impl AppState {
  /// Build state from env: load TOML config if provided, else defaults.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let config = load_trainer_config_from_env().unwrap_or_default();
    info!(target: "vertex_trainer", "Application state initialized");
    Self {
      sessions: Arc::new(RwLock::new(HashMap::new())),
      config,
    }
  }

  /// Create a fresh session (Main phase, no equation) and return its id.
  #[instrument(level = "debug", skip(self))]
  pub async fn create_session(&self) -> String {
    let id = Uuid::new_v4().to_string();
    self.sessions.write().await.insert(id.clone(), Session::new(id.clone()));
    info!(target: "session", %id, "Session created");
    id
  }

  /// Drop a session (e.g. on WebSocket disconnect). Pending timers become
  /// no-ops once the entry is gone.
  #[instrument(level = "debug", skip(self))]
  pub async fn remove_session(&self, id: &str) {
    if self.sessions.write().await.remove(id).is_some() {
      info!(target: "session", %id, "Session removed");
    }
  }
}
