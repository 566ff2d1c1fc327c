use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::domain::UserId;
use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::{
    controller::{events::Effect, ControllerCore, IntentTasks, ScreenState},
    resources::{AppResources, TextKey},
    saved_state::SavedStateHandle,
    usecase::UpdatePassword,
    validation,
};

pub const SAVED_STATE_KEY: &str = "password_change";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChangeState {
    pub password: String,
    pub password_confirmed: String,
    pub password_error: Option<String>,
    pub password_confirmed_error: Option<String>,
    pub submit_enabled: bool,
    pub loading: bool,
}

impl ScreenState for PasswordChangeState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

impl PasswordChangeState {
    /// Both messages and the submit flag depend on both fields, so every edit
    /// recomputes all three.
    fn revalidate(&mut self, resources: &dyn AppResources) {
        self.password_error = validation::password(&self.password).map(|key| resources.text(key));
        self.password_confirmed_error =
            validation::password_confirmation(&self.password, &self.password_confirmed)
                .map(|key| resources.text(key));
        self.submit_enabled =
            validation::password_form_complete(&self.password, &self.password_confirmed);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChangeSnapshot {
    pub password: String,
    pub password_confirmed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordIntent {
    Submit,
}

pub struct PasswordChangeController {
    core: Arc<ControllerCore<PasswordChangeState, PasswordIntent>>,
    user_id: Option<UserId>,
    saved_state: SavedStateHandle,
    update_password: Arc<dyn UpdatePassword>,
    resources: Arc<dyn AppResources>,
}

impl PasswordChangeController {
    pub fn new(
        user_id: Option<UserId>,
        saved_state: SavedStateHandle,
        update_password: Arc<dyn UpdatePassword>,
        resources: Arc<dyn AppResources>,
    ) -> Self {
        let snapshot = saved_state
            .get::<PasswordChangeSnapshot>(SAVED_STATE_KEY)
            .unwrap_or_default();
        let mut initial = PasswordChangeState {
            password: snapshot.password,
            password_confirmed: snapshot.password_confirmed,
            ..PasswordChangeState::default()
        };
        initial.revalidate(resources.as_ref());

        Self {
            core: ControllerCore::new(initial),
            user_id,
            saved_state,
            update_password,
            resources,
        }
    }

    pub fn state(&self) -> PasswordChangeState {
        self.core.snapshot()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PasswordChangeState> {
        self.core.subscribe_state()
    }

    pub fn subscribe_effects(&self) -> broadcast::Receiver<Effect> {
        self.core.subscribe_effects()
    }

    pub fn core(&self) -> &Arc<ControllerCore<PasswordChangeState, PasswordIntent>> {
        &self.core
    }

    pub fn set_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.core.update(|state| {
            state.password = password;
            state.revalidate(self.resources.as_ref());
        });
    }

    pub fn set_password_confirmed(&self, password_confirmed: impl Into<String>) {
        let password_confirmed = password_confirmed.into();
        self.core.update(|state| {
            state.password_confirmed = password_confirmed;
            state.revalidate(self.resources.as_ref());
        });
    }

    /// Without a target user the screen simply closes.
    pub fn submit(&self) -> IntentTasks {
        let Some(user_id) = self.user_id.clone() else {
            self.core.emit(Effect::back());
            return IntentTasks::none();
        };

        let password = self.core.snapshot().password;
        let update_password = Arc::clone(&self.update_password);
        let failure_text = self.resources.text(TextKey::CommunicationError);

        self.core
            .launch(
                PasswordIntent::Submit,
                async move { update_password.execute(&user_id, &password).await },
                move |core, ticket, outcome| match outcome {
                    Ok(()) => {
                        if core.settle(ticket, true, |_| {}) {
                            core.emit(Effect::back());
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, code = ?err.code(), "password update failed");
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::Message(failure_text));
                        }
                    }
                },
            )
            .into()
    }

    pub fn save_state(&self) {
        let state = self.core.snapshot();
        self.saved_state.set(
            SAVED_STATE_KEY,
            &PasswordChangeSnapshot {
                password: state.password,
                password_confirmed: state.password_confirmed,
            },
        );
    }
}

impl Drop for PasswordChangeController {
    fn drop(&mut self) {
        self.save_state();
    }
}

#[cfg(test)]
#[path = "../tests/password_change_tests.rs"]
mod tests;
