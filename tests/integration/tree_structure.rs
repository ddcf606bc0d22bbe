//! Integration tests for the shape of the navigation tree

use super::test_utils::{root_navigator, Screen};
use navigator::{NavigationConfiguration, NavigationError, Navigator, Owner, PresentationSlot};
use std::time::Duration;

#[test]
fn test_attach_is_idempotent() {
    let navigator = root_navigator();
    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    let root = navigator.state();

    root.attach(tab.state(), None).unwrap();
    root.attach(tab.state(), None).unwrap();
    assert_eq!(root.children().len(), 1);
    assert_eq!(tab.parent().map(|p| p.id()), Some(navigator.id()));
}

#[test]
fn test_cycle_is_rejected_and_tree_unchanged() {
    let navigator = root_navigator();
    let a = navigator.child(Owner::Stack, Some("a")).unwrap();
    let b = a.child(Owner::Stack, Some("b")).unwrap();

    let result = b.state().attach(a.state(), None);
    assert!(matches!(result, Err(NavigationError::Cycle { .. })));
    assert!(b.state().children().is_empty());
    assert_eq!(a.parent().map(|p| p.id()), Some(navigator.id()));
    assert_eq!(b.parent().map(|p| p.id()), Some(a.id()));

    let self_attach = a.state().attach(a.state(), None);
    assert!(matches!(self_attach, Err(NavigationError::Cycle { .. })));
}

#[test]
fn test_reattaching_elsewhere_moves_the_node() {
    let navigator = root_navigator();
    let left = navigator.child(Owner::Stack, Some("left")).unwrap();
    let right = navigator.child(Owner::Stack, Some("right")).unwrap();
    let leaf = left.child(Owner::Stack, Some("leaf")).unwrap();

    right.state().attach(leaf.state(), None).unwrap();
    assert!(left.state().children().is_empty());
    assert_eq!(right.state().children().len(), 1);
    assert_eq!(leaf.parent().map(|p| p.id()), Some(right.id()));
}

#[test]
fn test_child_inherits_configuration_at_first_attach() {
    let configuration = NavigationConfiguration::default()
        .with_execution_delay(Duration::from_millis(800))
        .with_restoration_key("v2");
    let navigator = Navigator::new(configuration.clone());
    let tab = navigator.child(Owner::Stack, None).unwrap();

    assert_eq!(tab.state().configuration(), configuration);
}

#[test]
fn test_named_lookup_searches_whole_tree() {
    let navigator = root_navigator();
    let tabs = navigator.child(Owner::Stack, Some("tabs")).unwrap();
    let settings = tabs.child(Owner::Stack, Some("settings")).unwrap();

    let found = tabs.named("settings").unwrap();
    assert_eq!(found.id(), settings.id());
    assert_eq!(settings.named("tabs").map(|n| n.id()), Some(tabs.id()));
    assert!(navigator.named("nowhere").is_none());
}

#[test]
fn test_unmount_removes_subtree() {
    let navigator = root_navigator();
    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    let inner = tab.child(Owner::Stack, Some("inner")).unwrap();

    tab.unmount();
    assert!(navigator.named("inner").is_none());
    assert!(tab.parent().is_none());
    assert_eq!(inner.parent().map(|p| p.id()), Some(tab.id()));
}

#[tokio::test(start_paused = true)]
async fn test_presented_scope_is_a_child_of_its_presenter() {
    let navigator = root_navigator();
    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    tab.present_sheet(Screen::Settings, None).await.unwrap();

    let sheet = tab.presented(PresentationSlot::Sheet).unwrap();
    assert_eq!(sheet.parent().map(|p| p.id()), Some(tab.id()));
    assert_eq!(sheet.root().id(), navigator.id());

    sheet.dismiss().await.unwrap();
    assert!(sheet.parent().is_none());
    assert!(tab.state().children().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_presenting_into_occupied_slot_replaces_previous() {
    let navigator = root_navigator();
    navigator.present_sheet(Screen::Home, None).await.unwrap();
    let first = navigator.presented(PresentationSlot::Sheet).unwrap();

    navigator.present_sheet(Screen::Settings, None).await.unwrap();
    let second = navigator.presented(PresentationSlot::Sheet).unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!first.is_presented());
    assert_eq!(navigator.state().presented_children().len(), 1);
    assert_eq!(
        navigator
            .state()
            .sheet()
            .and_then(|d| d.downcast_ref::<Screen>().cloned()),
        Some(Screen::Settings)
    );
}
