use tokio::sync::broadcast::error::TryRecvError;

use super::*;
use crate::{
    doubles::{communication_error, resources, user, Scripts},
    resources::DefaultResources,
};

fn controller(scripts: &Scripts) -> UserListController {
    UserListController::new(
        scripts.list_users.clone(),
        scripts.delete_user.clone(),
        resources(),
    )
}

fn text(key: TextKey) -> String {
    DefaultResources.text(key)
}

fn uid(value: &str) -> UserId {
    UserId(value.to_string())
}

#[tokio::test]
async fn load_users_publishes_the_list() {
    let scripts = Scripts::new();
    let users = vec![user("u1", "Nickname1"), user("u2", "Nickname2")];
    scripts.list_users.push_ok(users.clone());
    let controller = controller(&scripts);

    let tasks = controller.load_users();
    assert!(controller.state().loading);
    tasks.join().await.expect("task");

    assert_eq!(
        controller.state(),
        UserListState {
            loading: false,
            users
        }
    );
}

#[tokio::test]
async fn load_failure_shows_the_communication_error() {
    let scripts = Scripts::new();
    scripts.list_users.push_err(communication_error());
    let controller = controller(&scripts);
    let mut effects = controller.subscribe_effects();

    controller.load_users().join().await.expect("task");

    let state = controller.state();
    assert!(!state.loading);
    assert!(state.users.is_empty());
    assert_eq!(
        effects.try_recv().expect("effect"),
        Effect::Message(text(TextKey::CommunicationError))
    );
}

#[tokio::test]
async fn second_load_wins_over_a_slower_first() {
    let scripts = Scripts::new();
    let first_gate = scripts.list_users.push_gated(Ok(vec![user("old", "Old")]));
    scripts.list_users.push_ok(vec![user("new", "New")]);
    let controller = controller(&scripts);

    let first = controller.load_users();
    scripts.list_users.wait_started().await;
    controller.load_users().join().await.expect("second");
    assert!(!controller.state().loading);

    first_gate.notify_one();
    first.join().await.expect("first");

    assert_eq!(controller.state().users, vec![user("new", "New")]);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn slower_load_cannot_restore_a_deleted_user() {
    let scripts = Scripts::new();
    let stale_gate = scripts
        .list_users
        .push_gated(Ok(vec![user("u1", "A"), user("u2", "B")]));
    scripts.delete_user.push_ok(());
    scripts.list_users.push_ok(vec![user("u1", "A")]);
    let controller = controller(&scripts);

    let stale = controller.load_users();
    scripts.list_users.wait_started().await;
    controller
        .delete_user_confirmed(uid("u2"))
        .join()
        .await
        .expect("delete");
    assert_eq!(controller.state().users, vec![user("u1", "A")]);
    assert!(!controller.state().loading);

    stale_gate.notify_one();
    stale.join().await.expect("stale load");

    assert_eq!(controller.state().users, vec![user("u1", "A")]);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn delete_user_only_asks_for_confirmation() {
    let scripts = Scripts::new();
    let controller = controller(&scripts);
    let mut effects = controller.subscribe_effects();

    controller.delete_user(uid("u2"));

    assert_eq!(
        effects.try_recv().expect("effect"),
        Effect::ConfirmDelete { user_id: uid("u2") }
    );
    assert_eq!(scripts.delete_user.call_count(), 0);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn confirmed_delete_refreshes_and_reports() {
    let scripts = Scripts::new();
    scripts.delete_user.push_ok(());
    scripts
        .list_users
        .push_ok(vec![user("u1", "Nickname1"), user("u3", "Nickname3")]);
    let controller = controller(&scripts);
    let mut effects = controller.subscribe_effects();

    controller
        .delete_user_confirmed(uid("u2"))
        .join()
        .await
        .expect("task");

    assert_eq!(scripts.delete_user.calls(), vec!["delete u2".to_string()]);
    assert_eq!(scripts.list_users.call_count(), 1);
    assert_eq!(
        controller.state().users,
        vec![user("u1", "Nickname1"), user("u3", "Nickname3")]
    );
    assert!(!controller.state().loading);
    assert_eq!(
        effects.try_recv().expect("effect"),
        Effect::Message(text(TextKey::UserDeleted))
    );
}

#[tokio::test]
async fn failed_delete_skips_the_refresh() {
    let scripts = Scripts::new();
    scripts.delete_user.push_err(communication_error());
    let controller = controller(&scripts);
    let mut effects = controller.subscribe_effects();

    controller
        .delete_user_confirmed(uid("u2"))
        .join()
        .await
        .expect("task");

    assert_eq!(scripts.list_users.call_count(), 0);
    assert!(!controller.state().loading);
    assert_eq!(
        effects.try_recv().expect("effect"),
        Effect::Message(text(TextKey::CommunicationError))
    );
    assert!(matches!(effects.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn navigation_intents_emit_routes() {
    let scripts = Scripts::new();
    let controller = controller(&scripts);
    let mut effects = controller.subscribe_effects();

    controller.edit_user(uid("u1"));
    controller.add_new_user();
    controller.change_user_password(uid("u3"));

    assert_eq!(
        effects.try_recv().expect("edit"),
        Effect::Navigate(Route::UserEdit {
            user_id: Some(uid("u1"))
        })
    );
    assert_eq!(
        effects.try_recv().expect("add"),
        Effect::Navigate(Route::UserEdit { user_id: None })
    );
    assert_eq!(
        effects.try_recv().expect("password"),
        Effect::Navigate(Route::PasswordChange { user_id: uid("u3") })
    );
    assert!(!controller.state().loading);
}
