//! Shared types for the HTTP API layer.

use std::sync::Arc;

use rusqlite::Connection;

use crate::authz::{self, Capability};
use crate::config::AppConfig;
use crate::db::{self, DatabaseError};
use crate::models::ModulePermission;

/// Shared context for all routes and middleware. Connections are opened per
/// request; SQLite in WAL mode handles the concurrency.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.config.db_path)
    }
}

/// Authenticated user identity, injected into request extensions by the auth
/// middleware after token validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<ModulePermission>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        authz::is_admin_role(&self.role)
    }

    pub fn can(&self, module: &str, capability: Capability) -> bool {
        authz::allows(&self.role, &self.permissions, module, capability)
    }
}
