use tokio::sync::broadcast::error::TryRecvError;

use super::*;
use crate::{
    doubles::{communication_error, resources, Scripts},
    resources::DefaultResources,
};

const VALID: &str = "V@lid001";
const INVALID: &str = "short";

fn controller(scripts: &Scripts, user_id: Option<&str>) -> PasswordChangeController {
    controller_with(scripts, user_id, SavedStateHandle::new())
}

fn controller_with(
    scripts: &Scripts,
    user_id: Option<&str>,
    saved_state: SavedStateHandle,
) -> PasswordChangeController {
    PasswordChangeController::new(
        user_id.map(|id| UserId(id.to_string())),
        saved_state,
        scripts.update_password.clone(),
        resources(),
    )
}

fn text(key: TextKey) -> Option<String> {
    Some(DefaultResources.text(key))
}

#[test]
fn fresh_screen_is_blank_and_not_submittable() {
    let scripts = Scripts::new();
    let controller = controller(&scripts, Some("u1"));

    assert_eq!(controller.state(), PasswordChangeState::default());
}

#[test]
fn weak_password_is_flagged() {
    let scripts = Scripts::new();
    let controller = controller(&scripts, Some("u1"));

    controller.set_password(INVALID);

    let state = controller.state();
    assert_eq!(state.password_error, text(TextKey::PasswordInvalid));
    assert_eq!(state.password_confirmed_error, None);
    assert!(!state.submit_enabled);
}

#[test]
fn confirmation_mismatch_is_flagged_only_when_both_are_filled() {
    let scripts = Scripts::new();
    let controller = controller(&scripts, Some("u1"));

    controller.set_password_confirmed(VALID);
    assert_eq!(controller.state().password_confirmed_error, None);

    controller.set_password("V@lid002");
    assert_eq!(
        controller.state().password_confirmed_error,
        text(TextKey::PasswordMismatch)
    );
    assert!(!controller.state().submit_enabled);

    controller.set_password(VALID);
    let state = controller.state();
    assert_eq!(state.password_error, None);
    assert_eq!(state.password_confirmed_error, None);
    assert!(state.submit_enabled);
}

#[test]
fn editing_the_password_re_evaluates_the_confirmation() {
    let scripts = Scripts::new();
    let controller = controller(&scripts, Some("u1"));

    controller.set_password(VALID);
    controller.set_password_confirmed(VALID);
    assert!(controller.state().submit_enabled);

    controller.set_password("");
    let state = controller.state();
    assert_eq!(state.password_error, None);
    assert_eq!(state.password_confirmed_error, None);
    assert!(!state.submit_enabled);
}

#[tokio::test]
async fn submit_without_user_just_goes_back() {
    let scripts = Scripts::new();
    let controller = controller(&scripts, None);
    let mut effects = controller.subscribe_effects();

    let tasks = controller.submit();

    assert!(tasks.is_empty());
    assert!(effects.try_recv().expect("effect").is_back());
    assert_eq!(scripts.update_password.call_count(), 0);
    assert!(!controller.state().loading);
}

#[tokio::test]
async fn successful_submit_navigates_back_and_stays_loading() {
    let scripts = Scripts::new();
    scripts.update_password.push_ok(());
    let controller = controller(&scripts, Some("u1"));
    let mut effects = controller.subscribe_effects();
    controller.set_password(VALID);
    controller.set_password_confirmed(VALID);

    controller.submit().join().await.expect("task");

    assert_eq!(
        scripts.update_password.calls(),
        vec![format!("password u1 {VALID}")]
    );
    assert!(controller.state().loading);
    assert!(effects.try_recv().expect("effect").is_back());
    assert!(matches!(effects.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn failed_submit_reports_and_clears_loading() {
    let scripts = Scripts::new();
    scripts.update_password.push_err(communication_error());
    let controller = controller(&scripts, Some("u1"));
    let mut effects = controller.subscribe_effects();
    controller.set_password(VALID);
    controller.set_password_confirmed(VALID);

    controller.submit().join().await.expect("task");

    assert!(!controller.state().loading);
    assert_eq!(
        effects.try_recv().expect("effect"),
        Effect::Message(DefaultResources.text(TextKey::CommunicationError))
    );
}

#[test]
fn typed_values_survive_a_restart() {
    let scripts = Scripts::new();
    let saved_state = SavedStateHandle::new();
    {
        let controller = controller_with(&scripts, Some("u1"), saved_state.clone());
        controller.set_password(VALID);
        controller.set_password_confirmed("V@lid00");
    }

    let restored = controller_with(&scripts, Some("u1"), saved_state);

    let state = restored.state();
    assert_eq!(state.password, VALID);
    assert_eq!(state.password_confirmed, "V@lid00");
    assert_eq!(state.password_confirmed_error, text(TextKey::PasswordMismatch));
    assert!(!state.submit_enabled);
    assert!(!state.loading);
}
