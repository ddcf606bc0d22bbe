//! Integration tests for executor ordering, delays, pause and resume

use super::test_utils::{root_navigator, screens, Screen};
use navigator::routes::RouteToken;
use navigator::{
    Action, AnyDestination, ExecutorPhase, NavigationConfiguration, NavigationError, Navigator,
    Owner, PresentationSlot, Resolution,
};
use std::time::Duration;
use tokio::time::Instant;

fn push(id: u32) -> Action {
    Action::Push(AnyDestination::new(Screen::Article(id)))
}

fn articles(ids: &[u32]) -> Vec<Screen> {
    ids.iter().map(|id| Screen::Article(*id)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_pause_preserves_fifo_across_resume() {
    let navigator = root_navigator();
    let executor = navigator.executor();

    let first = navigator.enqueue(vec![push(1), Action::Pause, push(2)]);
    executor.wait_until_settled().await;
    let second = navigator.enqueue(vec![push(3)]);
    executor.wait_until_settled().await;

    assert_eq!(screens(&navigator), articles(&[1]));
    assert_eq!(executor.phase(), ExecutorPhase::WaitingExternal);
    assert_eq!(executor.pending(), 1);

    assert!(navigator.resume());
    assert!(first.outcome().await.unwrap());
    assert!(second.outcome().await.unwrap());
    assert_eq!(screens(&navigator), articles(&[1, 2, 3]));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_resume_discards_only_paused_batch() {
    let navigator = root_navigator();
    let executor = navigator.executor();

    let paused = navigator.enqueue(vec![push(1), Action::Pause, push(2)]);
    executor.wait_until_settled().await;
    let later = navigator.enqueue(vec![push(3)]);

    assert!(navigator.cancel_resume());
    assert!(matches!(paused.outcome().await, Err(NavigationError::Cancelled)));
    assert!(later.outcome().await.unwrap());
    assert_eq!(screens(&navigator), articles(&[1, 3]));
    assert_eq!(executor.stats().cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_and_cancel_without_pause_are_no_ops() {
    let navigator = root_navigator();
    assert!(!navigator.resume());
    assert!(!navigator.cancel_resume());

    navigator.push(Screen::Home).await.unwrap();
    assert!(!navigator.cancel_resume());
    assert_eq!(screens(&navigator), vec![Screen::Home]);
}

#[tokio::test(start_paused = true)]
async fn test_trailing_pause_still_blocks_later_batches() {
    let navigator = root_navigator();
    let executor = navigator.executor();

    let first = navigator.perform(vec![push(1), Action::Pause]).await;
    assert!(!first.unwrap());
    let mut later = navigator.enqueue(vec![push(2)]);
    executor.wait_until_settled().await;
    assert!(later.try_outcome().is_none());

    assert!(navigator.resume());
    assert!(later.outcome().await.unwrap());
    assert_eq!(screens(&navigator), articles(&[1, 2]));
}

#[tokio::test(start_paused = true)]
async fn test_batches_never_interleave() {
    let navigator = root_navigator();
    let a = navigator.enqueue(vec![push(1), push(2), push(3)]);
    let b = navigator.enqueue(vec![push(10), push(20)]);

    a.outcome().await.unwrap();
    b.outcome().await.unwrap();
    assert_eq!(screens(&navigator), articles(&[1, 2, 3, 10, 20]));
}

#[tokio::test(start_paused = true)]
async fn test_changes_are_spaced_by_execution_delay() {
    let navigator = Navigator::new(
        NavigationConfiguration::default().with_execution_delay(Duration::from_millis(500)),
    );
    let start = Instant::now();

    navigator
        .perform(vec![push(1), push(2), push(3)])
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert!(start.elapsed() < Duration::from_millis(1100));

    let next = Instant::now();
    navigator.push(Screen::Home).await.unwrap();
    assert!(next.elapsed() >= Duration::from_millis(500));
    assert!(next.elapsed() < Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_state_resolves_immediately() {
    let navigator = root_navigator();
    let start = Instant::now();

    navigator
        .perform(vec![Action::Pop, Action::PopAll, Action::Dismiss, push(1)])
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_custom_delay_is_clamped() {
    let navigator = root_navigator();
    let start = Instant::now();

    navigator
        .perform(vec![
            Action::custom("long", |_| Resolution::After(Duration::from_secs(60))),
            Action::custom("short", |_| Resolution::After(Duration::from_millis(1))),
            Action::custom("done", |_| Resolution::Immediately),
        ])
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(5300));
    assert!(start.elapsed() < Duration::from_millis(5400));
}

#[tokio::test(start_paused = true)]
async fn test_custom_pause_waits_for_resume() {
    let navigator = root_navigator();
    let executor = navigator.executor();

    let mut ticket = navigator.enqueue(vec![
        Action::custom("wait for network", |_| Resolution::Pause),
        push(1),
    ]);
    executor.wait_until_settled().await;
    assert!(executor.is_paused());
    assert!(ticket.try_outcome().is_none());

    navigator.resume();
    assert!(ticket.outcome().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_does_not_block_next() {
    let navigator = root_navigator();
    let failing = navigator.enqueue(vec![
        Action::PerformRoute(RouteToken::new("unknown")),
        push(1),
    ]);
    let next = navigator.enqueue(vec![push(2)]);

    assert!(matches!(
        failing.outcome().await,
        Err(NavigationError::RouteExpansion(_))
    ));
    assert!(next.outcome().await.unwrap());
    assert_eq!(screens(&navigator), articles(&[2]));
}

#[tokio::test(start_paused = true)]
async fn test_child_scopes_share_root_executor() {
    let navigator = root_navigator();
    let tab = navigator.child(Owner::Stack, Some("tab")).unwrap();

    assert!(std::sync::Arc::ptr_eq(&navigator.executor(), &tab.executor()));

    let a = navigator.enqueue(vec![push(1)]);
    let b = tab.enqueue(vec![push(2)]);
    a.outcome().await.unwrap();
    b.outcome().await.unwrap();
    assert_eq!(screens(&navigator), articles(&[1]));
    assert_eq!(screens(&tab), articles(&[2]));
    assert_eq!(navigator.executor().stats().completed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_pending_batch_completes_without_waiting_for_trailing_delay() {
    let navigator = root_navigator();
    let start = Instant::now();
    navigator.push(Screen::Home).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);

    let ticket = navigator.enqueue(vec![push(1)]);
    let mut outcome = Box::pin(ticket.outcome());
    assert!(futures::FutureExt::now_or_never(&mut outcome).is_none());
    assert!(outcome.await.unwrap());
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn test_queued_action_for_unmounted_scope_is_skipped() {
    let navigator = root_navigator();
    navigator
        .present_sheet(Screen::Settings, Some(true))
        .await
        .unwrap();
    let sheet = navigator.presented(PresentationSlot::Sheet).unwrap();

    let _hold = navigator.enqueue(vec![Action::Pause]);
    navigator.executor().wait_until_settled().await;
    let ticket = sheet.enqueue(vec![push(9)]);

    sheet.unmount();
    assert!(navigator.resume());
    assert!(!ticket.outcome().await.unwrap());
    assert!(sheet.path().is_empty());
    assert!(sheet.parent().is_none());
}
