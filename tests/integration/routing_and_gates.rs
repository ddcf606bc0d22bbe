//! Integration tests for route expansion and authentication gates

use super::test_utils::{root_navigator, screens, Screen};
use navigator::gate::Authenticator;
use navigator::routes::{RouteTable, RouteToken};
use navigator::{Action, AnyDestination, NavigationError, PresentationSlot};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum AppRoute {
    Article(u32),
    Settings,
    Account,
}

#[derive(Default)]
struct SessionAuthenticator {
    signed_in: AtomicBool,
    prompts: AtomicUsize,
}

impl Authenticator for SessionAuthenticator {
    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn request_authentication(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
    }
}

fn register_app_routes(navigator: &navigator::Navigator) {
    navigator.register_route::<AppRoute, _>(|route| match route {
        AppRoute::Article(id) => vec![
            Action::PopAll,
            Action::Push(AnyDestination::new(Screen::Home)),
            Action::Push(AnyDestination::new(Screen::Article(*id))),
        ],
        AppRoute::Settings => vec![Action::NavigateTo(
            AnyDestination::new(Screen::Settings),
            navigator::NavigationMethod::Sheet,
        )],
        AppRoute::Account => vec![
            Action::AuthenticationGate,
            Action::Push(AnyDestination::new(Screen::Settings)),
        ],
    });
}

#[tokio::test(start_paused = true)]
async fn test_route_expands_into_actions() {
    let navigator = root_navigator();
    register_app_routes(&navigator);
    navigator.push(Screen::Settings).await.unwrap();

    assert!(navigator.perform_route(AppRoute::Article(7)).await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Home, Screen::Article(7)]);

    navigator.perform_route(AppRoute::Settings).await.unwrap();
    assert!(navigator.presented(PresentationSlot::Sheet).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_routes_registered_on_child_are_shared_by_tree() {
    let navigator = root_navigator();
    let tab = navigator
        .child(navigator::Owner::Stack, Some("tab"))
        .unwrap();
    register_app_routes(&tab);

    navigator.perform_route(AppRoute::Article(1)).await.unwrap();
    assert_eq!(screens(&navigator), vec![Screen::Home, Screen::Article(1)]);
    assert!(tab.path().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_route_type_fails() {
    let navigator = root_navigator();
    register_app_routes(&navigator);

    let result = navigator.perform_route("not a route").await;
    assert!(matches!(result, Err(NavigationError::RouteExpansion(_))));
}

struct RejectingTable;

impl RouteTable for RejectingTable {
    fn lookup(&self, token: &RouteToken) -> Result<Vec<Action>, String> {
        Err(format!("{:?} is disabled", token))
    }
}

#[tokio::test(start_paused = true)]
async fn test_route_table_error_aborts_batch() {
    let navigator = root_navigator();
    navigator.register_route_table::<AppRoute>(Arc::new(RejectingTable));

    let result = navigator
        .perform(vec![
            Action::Push(AnyDestination::new(Screen::Home)),
            Action::PerformRoute(RouteToken::new(AppRoute::Settings)),
            Action::Push(AnyDestination::new(Screen::Article(1))),
        ])
        .await;

    match result {
        Err(NavigationError::RouteExpansion(reason)) => assert!(reason.contains("disabled")),
        other => panic!("expected route failure, got {:?}", other),
    }
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_gate_passes_when_authenticated() {
    let navigator = root_navigator();
    let auth = Arc::new(SessionAuthenticator::default());
    auth.signed_in.store(true, Ordering::SeqCst);
    navigator.set_authenticator(auth.clone());
    register_app_routes(&navigator);

    assert!(navigator.perform_route(AppRoute::Account).await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Settings]);
    assert_eq!(auth.prompts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_gate_pauses_until_resumed() {
    let navigator = root_navigator();
    let auth = Arc::new(SessionAuthenticator::default());
    navigator.set_authenticator(auth.clone());
    register_app_routes(&navigator);

    let mut ticket = navigator.enqueue(vec![Action::PerformRoute(RouteToken::new(
        AppRoute::Account,
    ))]);
    navigator.executor().wait_until_settled().await;

    assert_eq!(auth.prompts.load(Ordering::SeqCst), 1);
    assert!(navigator.executor().is_paused());
    assert!(ticket.try_outcome().is_none());
    assert!(navigator.path().is_empty());

    auth.signed_in.store(true, Ordering::SeqCst);
    assert!(navigator.resume());
    assert!(ticket.outcome().await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Settings]);
}

#[tokio::test(start_paused = true)]
async fn test_gate_cancelled_drops_remaining_route() {
    let navigator = root_navigator();
    navigator.set_authenticator(Arc::new(SessionAuthenticator::default()));
    register_app_routes(&navigator);

    let ticket = navigator.enqueue(vec![Action::PerformRoute(RouteToken::new(
        AppRoute::Account,
    ))]);
    navigator.executor().wait_until_settled().await;

    assert!(navigator.cancel_resume());
    assert!(matches!(ticket.outcome().await, Err(NavigationError::Cancelled)));
    assert!(navigator.path().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_gate_without_authenticator_continues() {
    let navigator = root_navigator();
    register_app_routes(&navigator);

    navigator.perform_route(AppRoute::Account).await.unwrap();
    assert_eq!(screens(&navigator), vec![Screen::Settings]);
}
