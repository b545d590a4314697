// Demo event model and the in-process bus that carries it

pub mod bus;
pub mod types;

pub use bus::{DispatchReport, EventBus, HandlerError, HandlerResult, Subscription, Topic, WILDCARD};
pub use types::{
    DemoEvent, EventDecodeError, RawEvent, CART_ITEM_ADDED, DEMO_START, ORDER_CREATED,
    ORDER_STARTED, ORDER_STATUS_CHANGED, PAYMENT_COMPLETED, ROLE_SWITCHED,
};
