use serde::Serialize;

use crate::role::Role;

/// A demo screen and the capabilities it lets the operator exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoScreen {
    pub id: &'static str,
    pub role: Role,
    pub capabilities: &'static [&'static str],
    pub demo_route: &'static str,
}

pub const DEMO_SCREENS: &[DemoScreen] = &[
    DemoScreen {
        id: "staff-orders",
        role: Role::Staff,
        capabilities: &[
            "view-orders",
            "create-order",
            "add-items",
            "mark-served",
            "generate-bill",
            "record-payment",
        ],
        demo_route: "/demo/staff",
    },
    DemoScreen {
        id: "admin-dashboard",
        role: Role::Admin,
        capabilities: &["view-analytics", "refresh-dashboard"],
        demo_route: "/demo/admin",
    },
    DemoScreen {
        id: "customer-menu",
        role: Role::Customer,
        capabilities: &["browse-menu", "add-to-cart"],
        demo_route: "/demo/customer",
    },
];

/// First screen (in table order) exposing `capability`
pub fn resolve_screen_for_capability(capability: &str) -> Option<&'static DemoScreen> {
    DEMO_SCREENS
        .iter()
        .find(|screen| screen.capabilities.contains(&capability))
}

pub fn resolve_route_for_capability(capability: &str) -> Option<&'static str> {
    resolve_screen_for_capability(capability).map(|screen| screen.demo_route)
}

/// Where a role lands after its token is issued
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Customer => "/demo/customer/menu",
        Role::Staff | Role::Cashier => "/demo/staff/orders",
        Role::Kitchen => "/demo/kitchen/queue",
        Role::Admin => "/demo/admin/dashboard",
    }
}
