//! Console sessions driven by a scripted interaction

mod support;

use releasedeck::config::Catalog;
use releasedeck::console;
use releasedeck::controller::Dashboard;
use releasedeck::interaction::{Notice, Scripted};
use support::MockApi;

async fn run_session(api: &MockApi, ui: Scripted) -> (Dashboard<Scripted>, String) {
    let mut dash = Dashboard::new(api.client(), Catalog::default(), ui);
    dash.start().await;
    let mut out = Vec::new();
    console::run(&mut dash, &mut out).await.unwrap();
    (dash, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_add_user_session() {
    let api = MockApi::start().await;
    let ui = Scripted::new()
        .answering("user add")
        .answering("alice")
        .answering("a@x.com")
        .answering("Alice A")
        .answering("developer")
        .answering("quit");

    let (dash, out) = run_session(&api, ui).await;

    assert_eq!(api.user_count(), 1);
    assert_eq!(dash.state().users[0].role.as_str(), "DEVELOPER");
    assert!(out.contains("USERNAME"));
    assert!(out.contains("alice"));
    assert!(dash
        .interaction()
        .notices()
        .contains(&Notice::Success("User created successfully".into())));
}

#[tokio::test]
async fn test_promote_and_filter_session() {
    let api = MockApi::start().await;
    let owner = api.add_user("carol", "Carol C", "ADMIN");
    let id = api.add_release("1.0.0", owner, "DEV");

    let ui = Scripted::new()
        .answering("releases")
        .answering(format!("promote {}", id))
        .answering(owner.to_string())
        .answering("filter QA true")
        .answering("filter DEV -");
    // End of input ends the session

    let (dash, out) = run_session(&api, ui).await;

    assert_eq!(api.release_environment(id).as_deref(), Some("QA"));
    assert!(out.contains("Promote Rollback Delete"));
    assert!(out.contains("Promoted from DEV to QA"));
    assert_eq!(dash.state().logs_table.len(), 0);
    assert!(out.contains("(none)"));
}

#[tokio::test]
async fn test_bad_input_is_reported() {
    let api = MockApi::start().await;
    let mut ui = Scripted::new();
    for line in ["promote", "deploy 3", "help", "quit", "users"] {
        ui.push_answer(line);
    }

    let (_, out) = run_session(&api, ui).await;

    assert!(out.contains("usage: promote <id>"));
    assert!(out.contains("unknown command 'deploy 3'"));
    assert!(out.contains("history <release-id>"));
    // Nothing after quit is read
    assert_eq!(api.count("GET /api/users"), 1);
}

#[tokio::test]
async fn test_cancelled_form_sends_nothing() {
    let api = MockApi::start().await;
    let ui = Scripted::new().answering("user add").answering("alice");

    let (_, _) = run_session(&api, ui).await;

    assert_eq!(api.count("POST"), 0);
}
