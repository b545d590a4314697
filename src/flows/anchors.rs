use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown demo anchor '{0}'")]
pub struct UnknownAnchor(pub String);

macro_rules! anchors {
    ($($variant:ident => $id:literal),+ $(,)?) => {
        /// UI elements a hint can point at. Screens register the same ids on
        /// the elements they render.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Anchor {
            $($variant),+
        }

        impl Anchor {
            pub const ALL: &'static [Anchor] = &[$(Anchor::$variant),+];

            pub fn id(&self) -> &'static str {
                match self {
                    $(Anchor::$variant => $id),+
                }
            }
        }

        impl FromStr for Anchor {
            type Err = UnknownAnchor;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok(Anchor::$variant),)+
                    other => Err(UnknownAnchor(other.to_string())),
                }
            }
        }
    };
}

anchors! {
    // Kiosk
    KioskStart => "customer.kiosk.start",
    MenuCategoryBurgers => "customer.menu.category.burgers",
    MenuItemAdd => "customer.menu.item.add",
    CartView => "customer.cart.view",
    CheckoutSubmit => "customer.checkout.submit",

    // Kitchen display
    KotList => "kitchen.kot.list",
    KotAccept => "kitchen.kot.accept",
    KotReady => "kitchen.kot.ready",

    // Staff order list
    StaffOrderList => "staff.orders.list",
    StaffServeOrder => "staff.orders.serve",

    // Customer menu
    MenuGrid => "menu-grid",
    AddToCart => "add-to-cart",
    CartButton => "cart-button",
    CheckoutButton => "checkout-button",
    PlaceOrder => "place-order",

    // Staff POS
    CreateOrder => "create-order",
    OrderList => "order-list",
    OrderCard => "order-card",
    SendKot => "send-kot",
    MarkServed => "mark-served",
    BillOrder => "bill-order",
    RecordPayment => "record-payment",

    // Kitchen queue
    KotQueue => "kot-queue",
    MarkReady => "mark-ready",

    // Admin
    DashboardMetrics => "dashboard-metrics",

    // Toolbar
    RoleSwitcher => "role-switcher",
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Anchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Anchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        id.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_anchor_id_round_trips_through_from_str() {
        for anchor in Anchor::ALL {
            assert_eq!(anchor.id().parse::<Anchor>(), Ok(*anchor));
        }
    }

    #[test]
    fn test_anchor_ids_are_unique() {
        let mut ids: Vec<&str> = Anchor::ALL.iter().map(Anchor::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Anchor::ALL.len());
    }

    #[test]
    fn test_unknown_anchor_is_rejected_on_deserialize() {
        let result = serde_json::from_str::<Anchor>("\"customer.menu.category.pizza\"");
        let error = result.unwrap_err().to_string();
        assert!(error.contains("customer.menu.category.pizza"));
    }
}
