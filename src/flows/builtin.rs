//! Flows shipped with the binary

use super::anchors::Anchor;
use super::types::{Completion, Flow, FlowStep, Hint, HintPosition};
use crate::events::{
    CART_ITEM_ADDED, DEMO_START, ORDER_CREATED, ORDER_STARTED, ORDER_STATUS_CHANGED,
    ROLE_SWITCHED,
};
use crate::role::Role;

pub const DEFAULT_FLOW: &str = "default";
pub const CUSTOMER_ORDER_FLOW: &str = "customer-order";

/// Full front-of-house walkthrough: open an order, serve it, bill it, take
/// payment, then look at the result from the admin dashboard.
pub fn default_flow() -> Flow {
    Flow::trusted(
        DEFAULT_FLOW,
        vec![
            FlowStep::new("welcome", Role::Staff, "Welcome to FoodGrid")
                .with_description(
                    "This is the POS dashboard where staff manage orders. Let's create a new order.",
                )
                .with_capability("view-orders")
                .completes_on(Completion::on(DEMO_START))
                .with_hint(
                    Hint::new(Anchor::OrderList, "Live orders")
                        .with_description("Every open ticket for the outlet shows up here."),
                ),
            FlowStep::new("create-order", Role::Staff, "Create a New Order")
                .with_description("Click the \"Create New Order\" button to start a dine-in order.")
                .with_capability("create-order")
                .with_target_action("create-order")
                .triggered_by(DEMO_START)
                .completes_on(Completion::on(ORDER_CREATED).when("status", "OPEN"))
                .with_hint(Hint::new(Anchor::CreateOrder, "Start a dine-in order")),
            FlowStep::new("add-items", Role::Staff, "Add Items to Order")
                .with_description("Select menu items to add to the order.")
                .with_capability("add-items")
                .with_target_action("add-to-cart")
                .triggered_by(ORDER_CREATED)
                .completes_on(Completion::on(CART_ITEM_ADDED))
                .with_hint(
                    Hint::new(Anchor::MenuGrid, "Pick from the menu").at(HintPosition::Right),
                )
                .with_hint(Hint::new(Anchor::AddToCart, "Add it to the ticket")),
            FlowStep::new("mark-served", Role::Staff, "Mark Order as Served")
                .with_description("The kitchen has prepared the food. Mark the order as served.")
                .with_capability("mark-served")
                .with_target_action("mark-served")
                .triggered_by(CART_ITEM_ADDED)
                .completes_on(Completion::on(ORDER_STATUS_CHANGED).when("status", "SERVED"))
                .with_hint(Hint::new(Anchor::MarkServed, "Food is on the table")),
            FlowStep::new("generate-bill", Role::Staff, "Generate Bill")
                .with_description("Generate the bill for this completed order.")
                .with_capability("generate-bill")
                .with_target_action("generate-bill")
                .triggered_by(ORDER_STATUS_CHANGED)
                .completes_on(Completion::on(ORDER_STATUS_CHANGED).when("status", "BILLED"))
                .with_hint(Hint::new(Anchor::BillOrder, "Print the bill")),
            FlowStep::new("record-payment", Role::Staff, "Record Payment")
                .with_description("Record a cash payment to close the order.")
                .with_capability("record-payment")
                .with_target_action("record-payment")
                .triggered_by(ORDER_STATUS_CHANGED)
                .completes_on(
                    Completion::on(ORDER_STATUS_CHANGED).when_any("status", ["COMPLETED", "PAID"]),
                )
                .with_hint(Hint::new(Anchor::RecordPayment, "Take a cash payment")),
            FlowStep::new("switch-to-admin", Role::Admin, "Admin Dashboard")
                .with_description(
                    "Switch to the admin view. The completed order now appears in the analytics.",
                )
                .with_capability("view-analytics")
                .with_target_action("refresh-dashboard")
                .triggered_by(ORDER_STATUS_CHANGED)
                .completes_on(Completion::on(ROLE_SWITCHED).when("role", "admin"))
                .with_hint(
                    Hint::new(Anchor::RoleSwitcher, "Switch to Admin").at(HintPosition::Top),
                ),
            FlowStep::new("demo-complete", Role::Admin, "Demo Complete!")
                .with_description(
                    "You've experienced a complete FoodGrid order flow. Explore more or sign up for a free trial.",
                )
                .with_capability("view-analytics")
                .triggered_by(ROLE_SWITCHED)
                .auto_advancing()
                .with_hint(Hint::new(Anchor::DashboardMetrics, "Today's sales")),
        ],
    )
}

/// Self-service kiosk ordering from the customer's side
pub fn customer_order_flow() -> Flow {
    Flow::trusted(
        CUSTOMER_ORDER_FLOW,
        vec![
            FlowStep::new("step-1-start", Role::Customer, "Start Ordering")
                .triggered_by(DEMO_START)
                .completes_on(Completion::on(ORDER_STARTED))
                .with_hint(
                    Hint::new(Anchor::KioskStart, "Start Here")
                        .with_description("Tap to begin your order on this virtual kiosk."),
                ),
            FlowStep::new("step-2-add-item", Role::Customer, "Select Item")
                .with_capability("add-to-cart")
                .triggered_by(ORDER_STARTED)
                .completes_on(Completion::on(CART_ITEM_ADDED))
                .with_hint(
                    Hint::new(Anchor::MenuCategoryBurgers, "Choose a Category")
                        .with_description("Explore our Burger selection.")
                        .at(HintPosition::Right),
                ),
            FlowStep::new("step-3-checkout", Role::Customer, "Place Your Order")
                .with_capability("add-to-cart")
                .triggered_by(CART_ITEM_ADDED)
                .completes_on(Completion::on(ORDER_CREATED))
                .with_hint(Hint::new(Anchor::CartView, "Review your cart").at(HintPosition::Left))
                .with_hint(Hint::new(Anchor::CheckoutSubmit, "Send it to the kitchen")),
            FlowStep::new("step-4-sent", Role::Customer, "Order Sent")
                .with_description("Your order is on its way to the kitchen display.")
                .triggered_by(ORDER_CREATED)
                .auto_advancing(),
        ],
    )
}
