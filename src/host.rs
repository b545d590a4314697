use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::controller::{FlowController, OverlaySnapshot};
use crate::events::{DemoEvent, DispatchReport, EventBus, HandlerError, Subscription, WILDCARD};
use crate::flows::{FlowCatalog, FlowError};
use crate::guard::DemoGuard;
use crate::http::{DemoApi, DemoApiError, DemoTokenGrant};
use crate::role::Role;
use crate::session::{DemoSession, SessionError};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Api(#[from] DemoApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0}")]
    Blocked(String),
    #[error("Action '{0}' is disabled in demo mode")]
    ActionDisabled(String),
}

/// One running demo: a bus, the controller listening on it, the session that
/// holds role tokens and the backend client.
///
/// Single-threaded; drive the async operations from a current-thread runtime.
pub struct DemoHost {
    bus: EventBus,
    controller: Rc<RefCell<FlowController>>,
    catalog: FlowCatalog,
    session: DemoSession,
    api: Arc<dyn DemoApi>,
    guard: DemoGuard,
    subscription: Subscription,
}

impl std::fmt::Debug for DemoHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoHost")
            .field("bus", &self.bus)
            .field("controller", &self.controller)
            .field("flows", &self.catalog.names())
            .finish_non_exhaustive()
    }
}

/// Feed every event on `bus` to `controller`
pub fn attach_controller(bus: &EventBus, controller: &Rc<RefCell<FlowController>>) -> Subscription {
    let listener = Rc::clone(controller);
    bus.subscribe(WILDCARD, move |event: &DemoEvent| {
        let mut controller = listener
            .try_borrow_mut()
            .map_err(|_| HandlerError::new("flow controller is already in use"))?;
        controller.handle_event(event);
        Ok(())
    })
}

impl DemoHost {
    pub fn new(
        catalog: FlowCatalog,
        session: DemoSession,
        api: Arc<dyn DemoApi>,
        guard: DemoGuard,
    ) -> Self {
        let bus = EventBus::new();
        let controller = Rc::new(RefCell::new(FlowController::new()));

        let subscription = attach_controller(&bus, &controller);

        Self {
            bus,
            controller,
            catalog,
            session,
            api,
            guard,
            subscription,
        }
    }

    pub fn load_flow(&self, name: &str) -> Result<(), HostError> {
        self.controller.borrow_mut().load(&self.catalog, name)?;
        Ok(())
    }

    pub fn start(&self) -> bool {
        self.controller.borrow_mut().start()
    }

    pub fn emit(&self, event: DemoEvent) -> DispatchReport {
        self.bus.emit(event)
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.controller.borrow().snapshot()
    }

    /// Fetch a token for `role`, store it, preview as that role and announce
    /// the switch. On failure nothing changes.
    pub async fn switch_role(&self, role: Role) -> Result<DemoTokenGrant, HostError> {
        let grant = self.api.fetch_role_token(role).await?;
        self.session.set_token(role, &grant.access_token)?;
        self.controller.borrow_mut().switch_role(role);
        self.bus.emit(DemoEvent::RoleSwitched { role });
        Ok(grant)
    }

    /// Reset backend demo data and rewind the tour. The tour is rewound even
    /// when the backend call fails; that failure is still returned.
    pub async fn reset(&self) -> Result<(), HostError> {
        let backend = self.api.reset_demo_data().await;
        self.controller.borrow_mut().reset();
        match backend {
            Ok(()) => {
                info!("Demo reset");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Backend reset failed; tour rewound locally");
                Err(e.into())
            }
        }
    }

    /// Leave demo mode: forget tokens and unload the flow
    pub fn exit(&self) -> Result<(), HostError> {
        self.controller.borrow_mut().unload();
        self.session.clear()?;
        Ok(())
    }

    /// Refuse a request the guard blocks
    pub fn ensure_allowed(&self, method: &str, path: &str) -> Result<(), HostError> {
        match self.guard.check_blocked(method, path) {
            Some(message) => Err(HostError::Blocked(message.to_string())),
            None => Ok(()),
        }
    }

    pub fn ensure_action_allowed(&self, action: &str) -> Result<(), HostError> {
        if self.guard.is_action_disabled(action) {
            return Err(HostError::ActionDisabled(action.to_string()));
        }
        Ok(())
    }

    pub fn controller(&self) -> Ref<'_, FlowController> {
        self.controller.borrow()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn session(&self) -> &DemoSession {
        &self.session
    }

    pub fn catalog(&self) -> &FlowCatalog {
        &self.catalog
    }

    pub fn guard(&self) -> &DemoGuard {
        &self.guard
    }
}

impl Drop for DemoHost {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FlowPhase;
    use crate::events::CART_ITEM_ADDED;
    use crate::http::MockDemoApi;
    use crate::session::{login_key, MemoryTokenStore, TokenStore};
    use mockall::predicate::eq;

    fn host_with(api: MockDemoApi) -> DemoHost {
        DemoHost::new(
            FlowCatalog::builtin(),
            DemoSession::in_memory(),
            Arc::new(api),
            DemoGuard::standard(),
        )
    }

    #[tokio::test]
    async fn test_switch_role_stores_token_and_announces() {
        let mut api = MockDemoApi::new();
        api.expect_fetch_role_token()
            .with(eq(Role::Kitchen))
            .times(1)
            .returning(|role| Ok(DemoTokenGrant::bare(role, "t-kitchen")));
        let host = host_with(api);
        host.load_flow("default").unwrap();
        host.start();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = host.bus().subscribe(crate::events::ROLE_SWITCHED, move |e: &DemoEvent| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });

        let grant = host.switch_role(Role::Kitchen).await.unwrap();

        assert_eq!(grant.access_token, "t-kitchen");
        assert_eq!(host.session().token(Role::Kitchen).unwrap().as_deref(), Some("t-kitchen"));
        assert_eq!(host.snapshot().active_role, Some(Role::Kitchen));
        assert_eq!(host.snapshot().step_index, 0);
        assert_eq!(*seen.borrow(), vec![DemoEvent::RoleSwitched { role: Role::Kitchen }]);
    }

    #[tokio::test]
    async fn test_failed_switch_role_changes_nothing() {
        let mut api = MockDemoApi::new();
        api.expect_fetch_role_token().returning(|_| {
            Err(DemoApiError::Status {
                status: 503,
                body: "down".to_string(),
            })
        });
        let host = host_with(api);
        host.load_flow("default").unwrap();
        host.start();

        let result = host.switch_role(Role::Admin).await;

        assert!(matches!(result, Err(HostError::Api(DemoApiError::Status { status: 503, .. }))));
        assert_eq!(host.snapshot().active_role, Some(Role::Staff));
        assert_eq!(host.session().token(Role::Admin).unwrap(), None);
    }

    /// Memory store that refuses to write the admin login alias
    struct LoginAliasFailingStore {
        inner: MemoryTokenStore,
    }

    impl TokenStore for LoginAliasFailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
            if key == login_key(Role::Admin) {
                return Err(SessionError::MalformedToken("read-only alias".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), SessionError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_switch_role_with_unwritable_session_changes_nothing() {
        let mut api = MockDemoApi::new();
        api.expect_fetch_role_token()
            .returning(|role| Ok(DemoTokenGrant::bare(role, "t-admin")));
        let session = DemoSession::new(Arc::new(LoginAliasFailingStore {
            inner: MemoryTokenStore::new(),
        }));
        let host = DemoHost::new(FlowCatalog::builtin(), session, Arc::new(api), DemoGuard::standard());
        host.load_flow("default").unwrap();
        host.start();

        let result = host.switch_role(Role::Admin).await;

        assert!(matches!(result, Err(HostError::Session(_))));
        assert_eq!(host.snapshot().active_role, Some(Role::Staff));
        assert_eq!(host.session().token(Role::Admin).unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_rewinds_tour_even_when_backend_fails() {
        let mut api = MockDemoApi::new();
        api.expect_reset_demo_data().times(1).returning(|| {
            Err(DemoApiError::InvalidResponse("boom".to_string()))
        });
        let host = host_with(api);
        host.load_flow("default").unwrap();
        host.start();
        host.emit(DemoEvent::DemoStart);
        assert_eq!(host.controller().phase(), FlowPhase::Running(1));

        assert!(host.reset().await.is_err());
        assert_eq!(host.controller().phase(), FlowPhase::Ready);
    }

    #[test]
    fn test_events_flow_through_bus_into_controller() {
        let host = host_with(MockDemoApi::new());
        host.load_flow("customer-order").unwrap();
        host.start();

        host.emit(DemoEvent::order_created("o-9", "OPEN"));
        assert_eq!(host.snapshot().step_index, 0);

        host.emit(DemoEvent::OrderStarted);
        host.emit(DemoEvent::custom(CART_ITEM_ADDED, Default::default()));
        assert_eq!(host.snapshot().step_index, 2);

        let report = host.emit(DemoEvent::order_created("o-9", "OPEN"));
        assert_eq!(report.delivered, 1);
        assert_eq!(host.controller().phase(), FlowPhase::Complete);
    }

    #[test]
    fn test_guard_checks_map_to_errors() {
        let host = host_with(MockDemoApi::new());
        assert!(host.ensure_allowed("GET", "/api/v1/orders").is_ok());
        assert!(matches!(
            host.ensure_allowed("DELETE", "/api/v1/orders/3"),
            Err(HostError::Blocked(_))
        ));
        assert!(matches!(
            host.ensure_action_allowed("delete-outlet"),
            Err(HostError::ActionDisabled(_))
        ));
    }

    #[test]
    fn test_exit_unloads_flow_and_clears_session() {
        let host = host_with(MockDemoApi::new());
        host.session().set_token(Role::Staff, "t").unwrap();
        host.load_flow("default").unwrap();

        host.exit().unwrap();

        assert_eq!(host.controller().phase(), FlowPhase::Idle);
        assert_eq!(host.session().token(Role::Staff).unwrap(), None);
    }
}
