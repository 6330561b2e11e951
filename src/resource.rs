use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::path;

/// Call parameter bag supplied per invocation.
///
/// Keys are partitioned at dispatch time into path placeholder values and
/// allow-listed query values; anything else is silently ignored.
pub type Params = HashMap<String, Value>;

/// Immutable declaration of one callable REST operation.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    /// HTTP method
    pub method: Method,
    /// URL path template with `{name}` placeholders, relative to the base URL
    pub path: &'static str,
    /// Ordered allow-list of recognized query parameter names
    pub query_keys: &'static [&'static str],
}

const PAGING: &[&str] = &["first", "max", "search"];

const USER_SEARCH: &[&str] = &[
    "first",
    "max",
    "search",
    "username",
    "email",
    "firstName",
    "lastName",
    "enabled",
    "exact",
    "q",
];

/// Logical operations of the realm administration API.
///
/// Each variant maps to a fixed [`ResourceDescriptor`] record. The table is
/// declarative and validated once at client construction, so no malformed
/// template reaches runtime dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOp {
    GetAgencyConfig,
    UpdateAgencyConfig,
    ListPrincipals,
    CreatePrincipal,
    GetPrincipal,
    UpdatePrincipal,
    DeletePrincipal,
    SuspendPrincipal,
    ActivatePrincipal,
    ListDelegates,
    CreateDelegate,
    GetDelegate,
    DeleteDelegate,
    ListMandates,
    CreateMandate,
    GetMandate,
    DeleteMandate,
    ListAvailableRoles,
    ListEffectiveRoles,
    FindUsers,
}

impl AdminOp {
    /// Every registered operation, in declaration order.
    pub const ALL: &'static [AdminOp] = &[
        AdminOp::GetAgencyConfig,
        AdminOp::UpdateAgencyConfig,
        AdminOp::ListPrincipals,
        AdminOp::CreatePrincipal,
        AdminOp::GetPrincipal,
        AdminOp::UpdatePrincipal,
        AdminOp::DeletePrincipal,
        AdminOp::SuspendPrincipal,
        AdminOp::ActivatePrincipal,
        AdminOp::ListDelegates,
        AdminOp::CreateDelegate,
        AdminOp::GetDelegate,
        AdminOp::DeleteDelegate,
        AdminOp::ListMandates,
        AdminOp::CreateMandate,
        AdminOp::GetMandate,
        AdminOp::DeleteMandate,
        AdminOp::ListAvailableRoles,
        AdminOp::ListEffectiveRoles,
        AdminOp::FindUsers,
    ];

    /// Get the descriptor record for this operation.
    pub fn descriptor(self) -> ResourceDescriptor {
        match self {
            AdminOp::GetAgencyConfig => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/config",
                query_keys: &[],
            },
            AdminOp::UpdateAgencyConfig => ResourceDescriptor {
                method: Method::PUT,
                path: "admin/realms/{realm}/agency/config",
                query_keys: &[],
            },
            AdminOp::ListPrincipals => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/principals",
                query_keys: PAGING,
            },
            AdminOp::CreatePrincipal => ResourceDescriptor {
                method: Method::POST,
                path: "admin/realms/{realm}/agency/principals",
                query_keys: &[],
            },
            AdminOp::GetPrincipal => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/principals/{id}",
                query_keys: &[],
            },
            AdminOp::UpdatePrincipal => ResourceDescriptor {
                method: Method::PUT,
                path: "admin/realms/{realm}/agency/principals/{id}",
                query_keys: &[],
            },
            AdminOp::DeletePrincipal => ResourceDescriptor {
                method: Method::DELETE,
                path: "admin/realms/{realm}/agency/principals/{id}",
                query_keys: &[],
            },
            AdminOp::SuspendPrincipal => ResourceDescriptor {
                method: Method::POST,
                path: "admin/realms/{realm}/agency/principals/{id}/suspend",
                query_keys: &[],
            },
            AdminOp::ActivatePrincipal => ResourceDescriptor {
                method: Method::POST,
                path: "admin/realms/{realm}/agency/principals/{id}/activate",
                query_keys: &[],
            },
            AdminOp::ListDelegates => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/delegates",
                query_keys: PAGING,
            },
            AdminOp::CreateDelegate => ResourceDescriptor {
                method: Method::POST,
                path: "admin/realms/{realm}/agency/delegates",
                query_keys: &[],
            },
            AdminOp::GetDelegate => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/delegates/{id}",
                query_keys: &[],
            },
            AdminOp::DeleteDelegate => ResourceDescriptor {
                method: Method::DELETE,
                path: "admin/realms/{realm}/agency/delegates/{id}",
                query_keys: &[],
            },
            AdminOp::ListMandates => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/mandates",
                query_keys: PAGING,
            },
            AdminOp::CreateMandate => ResourceDescriptor {
                method: Method::POST,
                path: "admin/realms/{realm}/agency/mandates",
                query_keys: &[],
            },
            AdminOp::GetMandate => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/agency/mandates/{id}",
                query_keys: &[],
            },
            AdminOp::DeleteMandate => ResourceDescriptor {
                method: Method::DELETE,
                path: "admin/realms/{realm}/agency/mandates/{id}",
                query_keys: &[],
            },
            AdminOp::ListAvailableRoles => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/ui-ext/available-roles/{type}/{id}",
                query_keys: PAGING,
            },
            AdminOp::ListEffectiveRoles => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/ui-ext/effective-roles/{type}/{id}",
                query_keys: PAGING,
            },
            AdminOp::FindUsers => ResourceDescriptor {
                method: Method::GET,
                path: "admin/realms/{realm}/ui-ext/brute-force-user",
                query_keys: USER_SEARCH,
            },
        }
    }
}

/// Validate every registered descriptor's path template.
///
/// Called once when a client is constructed.
pub(crate) fn validate_registry() -> Result<()> {
    for op in AdminOp::ALL {
        path::validate(op.descriptor().path)?;
    }
    Ok(())
}
