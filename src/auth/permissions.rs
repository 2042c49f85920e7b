// Declarative role -> capability table
//
// Every authorization decision in the API goes through `Role::allows`.
// Handlers name the capability they need; they never compare roles.

use serde::Serialize;

use crate::auth::models::Role;

/// Actions guarded by authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewCatalog,
    ManageCatalog,
    CreateOrder,
    SettleOrder,
    ViewOrders,
    ViewReports,
    ViewStock,
    AdjustStock,
    ManageRestock,
    ViewAudit,
    ManageUsers,
    ManageStores,
    ManageCurrency,
}

impl Capability {
    pub const ALL: [Capability; 13] = [
        Capability::ViewCatalog,
        Capability::ManageCatalog,
        Capability::CreateOrder,
        Capability::SettleOrder,
        Capability::ViewOrders,
        Capability::ViewReports,
        Capability::ViewStock,
        Capability::AdjustStock,
        Capability::ManageRestock,
        Capability::ViewAudit,
        Capability::ManageUsers,
        Capability::ManageStores,
        Capability::ManageCurrency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewCatalog => "view_catalog",
            Capability::ManageCatalog => "manage_catalog",
            Capability::CreateOrder => "create_order",
            Capability::SettleOrder => "settle_order",
            Capability::ViewOrders => "view_orders",
            Capability::ViewReports => "view_reports",
            Capability::ViewStock => "view_stock",
            Capability::AdjustStock => "adjust_stock",
            Capability::ManageRestock => "manage_restock",
            Capability::ViewAudit => "view_audit",
            Capability::ManageUsers => "manage_users",
            Capability::ManageStores => "manage_stores",
            Capability::ManageCurrency => "manage_currency",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const POS_USER: &[Capability] = &[
    Capability::ViewCatalog,
    Capability::CreateOrder,
    Capability::SettleOrder,
    Capability::ViewOrders,
    Capability::ViewStock,
];

const SUPERVISOR: &[Capability] = &[
    Capability::ViewCatalog,
    Capability::CreateOrder,
    Capability::SettleOrder,
    Capability::ViewOrders,
    Capability::ViewReports,
    Capability::ViewStock,
    Capability::AdjustStock,
    Capability::ManageRestock,
    Capability::ViewAudit,
];

impl Role {
    /// Capabilities granted to this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Management => &Capability::ALL,
            Role::Supervisor => SUPERVISOR,
            Role::PosUser => POS_USER,
        }
    }

    /// Whether this role may perform `capability`
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Order listings for till staff are limited to their own orders
    pub fn sees_only_own_orders(&self) -> bool {
        matches!(self, Role::PosUser)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::Management),
            Just(Role::Supervisor),
            Just(Role::PosUser),
        ]
    }

    fn capability_strategy() -> impl Strategy<Value = Capability> {
        (0..Capability::ALL.len()).prop_map(|i| Capability::ALL[i])
    }

    /// Grants are monotone: pos_user ⊆ supervisor ⊆ management
    #[test]
    fn prop_grants_are_nested() {
        proptest!(|(capability in capability_strategy())| {
            if Role::PosUser.allows(capability) {
                prop_assert!(Role::Supervisor.allows(capability));
            }
            if Role::Supervisor.allows(capability) {
                prop_assert!(Role::Management.allows(capability));
            }
        });
    }

    /// `allows` agrees with the published capability list
    #[test]
    fn prop_allows_matches_capabilities() {
        proptest!(|(role in role_strategy(), capability in capability_strategy())| {
            prop_assert_eq!(
                role.allows(capability),
                role.capabilities().contains(&capability)
            );
        });
    }
}
