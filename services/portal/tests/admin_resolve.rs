//! Admin dashboard and the AI-assisted resolve screen against the fake REST API.

mod support;

use portal_lib::app::{AdminView, AppState, ResolveState, ViewError};
use serde_json::json;
use std::time::Duration;
use support::{FakeApi, Suggestion};
use support_portal_core::domain::{ComplaintId, ComplaintStatus, Credentials, StatusFilter};
use support_portal_core::lifecycle::LifecycleError;
use support_portal_core::messages;
use tempfile::{tempdir, TempDir};

async fn admin_state(api: &FakeApi) -> (AppState, TempDir) {
    api.add_user(9, "Ada Admin", "admin@example.com", "secret", "admin");
    let dir = tempdir().unwrap();
    let state = api.app_state(&dir.path().join("session.json"));
    state
        .session
        .sign_in(&Credentials {
            email: "admin@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    (state, dir)
}

#[tokio::test]
async fn resolve_screen_shows_prior_note_and_commits_the_edited_draft() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Cannot log in", "In Progress");
    api.with(|s| {
        s.complaints[0]["resolution"] = json!("old note");
        s.suggestion = Suggestion::Text("Reset your password".to_string());
    });
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(id));
    screen.load().await.unwrap();

    let draft = screen.draft().unwrap();
    assert_eq!(draft.prior_resolution(), Some("old note"));
    assert_eq!(draft.suggestion(), Some("Reset your password"));
    assert_eq!(draft.text(), "Reset your password");
    assert_eq!(draft.field_label(), "Add New Update / Solution");
    assert!(screen.placeholder().is_none());
    assert!(api.with(|s| s.patches.is_empty()));

    assert!(screen.edit("Reset password, verify 2FA"));
    let resolved = screen.commit().await.unwrap();

    assert_eq!(resolved.status, ComplaintStatus::Resolved);
    assert_eq!(resolved.resolution_text(), Some("Reset password, verify 2FA"));
    assert!(matches!(screen.state(), ResolveState::Committed(_)));
    assert_eq!(
        api.with(|s| s.patches.clone()),
        vec![(
            id,
            json!({ "status": "Resolved", "resolution": "Reset password, verify 2FA" })
        )]
    );
}

#[tokio::test]
async fn loading_twice_reads_without_writing() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Slow site", "Pending");
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut first = view.resolve_screen(ComplaintId(id));
    let mut second = view.resolve_screen(ComplaintId(id));
    first.load().await.unwrap();
    second.load().await.unwrap();

    assert_eq!(first.draft(), second.draft());
    assert!(api.with(|s| s.patches.is_empty()));
    assert_eq!(api.complaint(id).unwrap()["status"], "Pending");
}

#[tokio::test]
async fn failed_commit_keeps_the_draft_for_a_retry() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Double charge", "Pending");
    api.with(|s| s.failing_patches = 1);
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(id));
    screen.load().await.unwrap();
    let typed = "Refunded £12.50: ticket #42 ✓\n  second line ";
    screen.edit(typed);

    let err = screen.commit().await.unwrap_err();
    assert!(matches!(err, ViewError::Lifecycle(LifecycleError::Port(_))));
    match screen.state() {
        ResolveState::Ready { draft, error } => {
            assert_eq!(draft.text(), typed);
            assert_eq!(error.as_deref(), Some(messages::RESOLUTION_COMMIT_FAILED));
        }
        other => panic!("expected a ready screen, got {:?}", other),
    }
    assert_eq!(api.complaint(id).unwrap()["status"], "Pending");

    let resolved = screen.commit().await.unwrap();
    assert_eq!(resolved.resolution_text(), Some(typed));
    assert_eq!(api.with(|s| s.patches.len()), 2);
}

#[tokio::test]
async fn missing_suggestion_leaves_an_empty_draft() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Odd noise", "Pending");
    api.with(|s| s.suggestion = Suggestion::Unavailable);
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(id));
    screen.load().await.unwrap();

    let draft = screen.draft().unwrap();
    assert_eq!(draft.suggestion(), None);
    assert_eq!(draft.text(), "");
    assert_eq!(draft.field_label(), "Proposed Solution");
    assert_eq!(screen.placeholder(), Some(messages::NO_SUGGESTION));
    assert!(screen.can_commit());
}

#[tokio::test]
async fn failing_suggestion_fails_the_whole_load() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Odd noise", "Pending");
    api.with(|s| s.suggestion = Suggestion::Failing);
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(id));
    screen.load().await.unwrap();

    assert_eq!(
        screen.state(),
        &ResolveState::LoadFailed(messages::RESOLUTION_LOAD_FAILED.to_string())
    );
    assert!(!screen.can_commit());
    assert!(matches!(screen.commit().await, Err(ViewError::NotReady)));
    assert!(api.with(|s| s.patches.is_empty()));
}

#[tokio::test]
async fn unknown_complaint_fails_the_load() {
    let api = FakeApi::start().await;
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(404));
    screen.load().await.unwrap();

    assert!(matches!(screen.state(), ResolveState::LoadFailed(_)));
}

#[tokio::test]
async fn closing_the_screen_discards_a_late_load() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(1, "Slow engine", "Pending");
    api.with(|s| s.suggestion_delay = Duration::from_secs(2));
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let mut screen = view.resolve_screen(ComplaintId(id));
    let (result, ()) = tokio::join!(screen.load(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.unmount();
    });

    assert!(matches!(result, Err(ViewError::Unmounted)));
    assert_eq!(screen.state(), &ResolveState::Loading);
    assert!(screen.draft().is_none());
}

#[tokio::test]
async fn dashboard_filters_by_status_but_counts_everything() {
    let api = FakeApi::start().await;
    api.add_complaint(1, "A", "Pending");
    api.add_complaint(2, "B", "In Progress");
    api.add_complaint(3, "C", "Resolved");
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let all = view.dashboard(StatusFilter::All).await.unwrap();
    assert_eq!(all.complaints.len(), 3);

    let resolved = view
        .dashboard(StatusFilter::Only(ComplaintStatus::Resolved))
        .await
        .unwrap();
    let titles: Vec<_> = resolved.complaints.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["C"]);
    assert_eq!(resolved.stats.total, 3);
    assert_eq!(resolved.stats.pending, 2);
    assert_eq!(resolved.stats.resolved, 1);
    assert_eq!(api.with(|s| s.list_queries.clone()), vec![None, None]);
}

#[tokio::test]
async fn admin_reads_any_complaint_by_id() {
    let api = FakeApi::start().await;
    let id = api.add_complaint(4, "Card declined", "In Progress");
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let complaint = view.complaint(ComplaintId(id)).await.unwrap();
    assert_eq!(complaint.title, "Card declined");
    assert_eq!(complaint.status, ComplaintStatus::InProgress);

    let err = view.complaint(ComplaintId(404)).await.unwrap_err();
    assert_eq!(err.user_message(), messages::COMPLAINT_NOT_FOUND);
    assert!(api.with(|s| s.patches.is_empty()));
}

#[tokio::test]
async fn begin_work_moves_pending_to_in_progress_only() {
    let api = FakeApi::start().await;
    let pending = api.add_complaint(1, "A", "Pending");
    let resolved = api.add_complaint(1, "B", "Resolved");
    let (state, _dir) = admin_state(&api).await;
    let view = AdminView::open(&state).unwrap();

    let started = view.begin_work(ComplaintId(pending)).await.unwrap();
    assert_eq!(started.status, ComplaintStatus::InProgress);
    assert_eq!(
        api.with(|s| s.patches.clone()),
        vec![(pending, json!({ "status": "In Progress" }))]
    );

    let err = view.begin_work(ComplaintId(resolved)).await.unwrap_err();
    assert!(matches!(
        err,
        ViewError::Lifecycle(LifecycleError::InvalidTransition { .. })
    ));
    assert_eq!(api.with(|s| s.patches.len()), 1);
}

#[tokio::test]
async fn customers_cannot_open_the_admin_view() {
    let api = FakeApi::start().await;
    api.add_user(1, "Uma One", "u1@example.com", "secret", "customer");
    let dir = tempdir().unwrap();
    let state = api.app_state(&dir.path().join("session.json"));
    state
        .session
        .sign_in(&Credentials {
            email: "u1@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(AdminView::open(&state), Err(ViewError::Forbidden(_))));
}
