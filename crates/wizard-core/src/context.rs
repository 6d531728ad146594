//! Contexto explícito de la petición: quién actúa, en qué tenant y con qué
//! permisos. Se pasa a las operaciones remotas en lugar de leer un usuario
//! global.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreEngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    SaveDraft,
    Finalize,
    Attach,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::SaveDraft, Permission::Finalize, Permission::Attach];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::SaveDraft => "save_draft",
            Permission::Finalize => "finalize",
            Permission::Attach => "attach",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    user_id: String,
    tenant_id: String,
    permissions: BTreeSet<Permission>,
}

impl RequestContext {
    /// Contexto sin permisos.
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(),
               tenant_id: tenant_id.into(),
               permissions: BTreeSet::new() }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn with_all_permissions(mut self) -> Self {
        self.permissions.extend(Permission::ALL);
        self
    }

    pub fn user_id(&self) -> &str { &self.user_id }

    pub fn tenant_id(&self) -> &str { &self.tenant_id }

    pub fn can(&self, permission: Permission) -> bool { self.permissions.contains(&permission) }

    pub fn require(&self, permission: Permission) -> Result<(), CoreEngineError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(CoreEngineError::AccessDenied(permission.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_checks_granted_permissions() {
        let ctx = RequestContext::new("u1", "t1").with_permission(Permission::SaveDraft);
        assert!(ctx.require(Permission::SaveDraft).is_ok());
        assert_eq!(ctx.require(Permission::Finalize),
                   Err(CoreEngineError::AccessDenied("finalize".into())));
        assert!(RequestContext::new("u", "t").with_all_permissions().can(Permission::Attach));
    }
}
