//! Integration tests for checkpoint establishment and unwinding

use super::test_utils::{root_navigator, screens, Screen};
use navigator::{Checkpoint, LockId, NavigationError, Owner, PresentationSlot};
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_return_twice_is_a_no_op() {
    let navigator = root_navigator();
    let home: Checkpoint = Checkpoint::new("home");
    navigator.push(Screen::Home).await.unwrap();
    navigator.establish_checkpoint(&home);
    navigator.push(Screen::Article(1)).await.unwrap();

    assert!(navigator.return_to_checkpoint(&home).await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
    assert!(!navigator.return_to_checkpoint(&home).await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_shortening_below_depth_invalidates_checkpoint() {
    let navigator = root_navigator();
    let article: Checkpoint = Checkpoint::new("article");
    navigator.push(Screen::Home).await.unwrap();
    navigator.push(Screen::Article(1)).await.unwrap();
    navigator.establish_checkpoint(&article);
    assert!(navigator.can_return_to_checkpoint(&article));

    navigator.pop().await.unwrap();
    assert!(!navigator.can_return_to_checkpoint(&article));

    navigator.push(Screen::Article(1)).await.unwrap();
    assert!(!navigator.can_return_to_checkpoint(&article));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_checkpoint_is_not_an_error() {
    let navigator = root_navigator();
    navigator.push(Screen::Home).await.unwrap();

    let missing: Checkpoint = Checkpoint::new("missing");
    assert!(!navigator.can_return_to_checkpoint(&missing));
    assert!(!navigator.return_to_checkpoint(&missing).await.unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_return_unwinds_nested_presentations() {
    let navigator = root_navigator();
    let start: Checkpoint = Checkpoint::new("start");
    navigator.push(Screen::Home).await.unwrap();
    navigator.establish_checkpoint(&start);
    navigator.push(Screen::Article(1)).await.unwrap();

    navigator.present_sheet(Screen::Settings, Some(true)).await.unwrap();
    let sheet = navigator.presented(PresentationSlot::Sheet).unwrap();
    sheet.push(Screen::Article(2)).await.unwrap();
    sheet.present_cover(Screen::Article(3), None).await.unwrap();
    let cover = sheet.presented(PresentationSlot::Cover).unwrap();

    assert!(cover.can_return_to_checkpoint(&start));
    assert!(cover.return_to_checkpoint(&start).await.unwrap());

    assert!(!navigator.is_any_child_presenting());
    assert!(!sheet.is_presented());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_nearest_checkpoint_wins() {
    let navigator = root_navigator();
    let pick: Checkpoint = Checkpoint::new("pick");
    navigator.establish_checkpoint(&pick);
    navigator.push(Screen::Home).await.unwrap();

    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    tab.push(Screen::Article(1)).await.unwrap();
    tab.establish_checkpoint(&pick);
    tab.push(Screen::Article(2)).await.unwrap();

    assert!(tab.return_to_checkpoint(&pick).await.unwrap());
    assert_eq!(screens(&tab), vec![Screen::Article(1)]);
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_descendant_checkpoints_are_invisible() {
    let navigator = root_navigator();
    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    let inner: Checkpoint = Checkpoint::new("inner");
    tab.establish_checkpoint(&inner);

    assert!(tab.can_return_to_checkpoint(&inner));
    assert!(!navigator.can_return_to_checkpoint(&inner));
}

#[tokio::test(start_paused = true)]
async fn test_typed_value_reaches_handler_once() {
    let navigator = root_navigator();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let choose: Checkpoint<u32> = Checkpoint::new("choose");
    navigator.establish_checkpoint_with(&choose, move |value| sink.lock().push(value));

    navigator.present_sheet(Screen::Settings, None).await.unwrap();
    let sheet = navigator.presented(PresentationSlot::Sheet).unwrap();
    assert!(sheet.return_to_checkpoint_with(&choose, 42).await.unwrap());

    assert_eq!(*received.lock(), vec![42]);
    assert!(!navigator.is_presenting());
}

#[tokio::test(start_paused = true)]
async fn test_value_type_mismatch_fails_fast() {
    let navigator = root_navigator();
    navigator.establish_checkpoint(&Checkpoint::<u32>::new("choose"));
    navigator.present_sheet(Screen::Settings, None).await.unwrap();
    let sheet = navigator.presented(PresentationSlot::Sheet).unwrap();

    let wrong: Checkpoint<String> = Checkpoint::new("choose");
    let result = sheet
        .return_to_checkpoint_with(&wrong, "forty-two".to_string())
        .await;

    match result {
        Err(NavigationError::CheckpointTypeMismatch { name, .. }) => assert_eq!(name, "choose"),
        other => panic!("expected type mismatch, got {:?}", other),
    }
    assert!(navigator.is_presenting());
}

#[tokio::test(start_paused = true)]
async fn test_value_without_handler_is_dropped() {
    let navigator = root_navigator();
    let done: Checkpoint<String> = Checkpoint::new("done");
    navigator.push(Screen::Home).await.unwrap();
    navigator.establish_checkpoint(&done);
    navigator.push(Screen::Settings).await.unwrap();

    assert!(navigator
        .return_to_checkpoint_with(&done, "ignored".to_string())
        .await
        .unwrap());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_return_dismisses_sheet_presented_from_a_tab() {
    let navigator = root_navigator();
    let home: Checkpoint = Checkpoint::new("home");
    navigator.push(Screen::Home).await.unwrap();
    navigator.establish_checkpoint(&home);
    navigator.push(Screen::Article(1)).await.unwrap();

    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    tab.present_sheet(Screen::Settings, None).await.unwrap();
    let sheet = tab.presented(PresentationSlot::Sheet).unwrap();

    assert!(sheet.return_to_checkpoint(&home).await.unwrap());
    assert!(!sheet.is_presented());
    assert!(!tab.is_presenting());
    assert!(!navigator.is_any_child_presenting());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
    // the tab itself is not presented and stays mounted
    assert_eq!(tab.parent().map(|p| p.id()), Some(navigator.id()));
}

#[tokio::test(start_paused = true)]
async fn test_lock_in_intermediate_sheet_blocks_return() {
    let navigator = root_navigator();
    let home: Checkpoint = Checkpoint::new("home");
    navigator.push(Screen::Home).await.unwrap();
    navigator.establish_checkpoint(&home);
    navigator.push(Screen::Article(1)).await.unwrap();

    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();
    tab.present_sheet(Screen::Settings, Some(true)).await.unwrap();
    let sheet = tab.presented(PresentationSlot::Sheet).unwrap();
    sheet.present_cover(Screen::Article(2), None).await.unwrap();
    let cover = sheet.presented(PresentationSlot::Cover).unwrap();
    sheet.add_lock(LockId::new());

    let result = cover.return_to_checkpoint(&home).await;
    assert!(matches!(result, Err(NavigationError::Locked { .. })));
    assert!(sheet.is_presented());
    assert!(cover.is_presented());
    assert_eq!(screens(&navigator), vec![Screen::Home, Screen::Article(1)]);
}
