use std::sync::Arc;

use shared::domain::{UserId, UserRecord};
use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::{
    controller::{
        events::{Effect, Route},
        ControllerCore, IntentTasks, ScreenState,
    },
    resources::{AppResources, TextKey},
    usecase::{DeleteUser, ListUsers},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListState {
    pub loading: bool,
    pub users: Vec<UserRecord>,
}

impl ScreenState for UserListState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Both the plain load and the delete chain replace `users`, so they share one
/// latest-wins key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListIntent {
    Refresh,
}

pub struct UserListController {
    core: Arc<ControllerCore<UserListState, ListIntent>>,
    list_users: Arc<dyn ListUsers>,
    delete_user: Arc<dyn DeleteUser>,
    resources: Arc<dyn AppResources>,
}

impl UserListController {
    pub fn new(
        list_users: Arc<dyn ListUsers>,
        delete_user: Arc<dyn DeleteUser>,
        resources: Arc<dyn AppResources>,
    ) -> Self {
        Self {
            core: ControllerCore::new(UserListState::default()),
            list_users,
            delete_user,
            resources,
        }
    }

    pub fn state(&self) -> UserListState {
        self.core.snapshot()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<UserListState> {
        self.core.subscribe_state()
    }

    pub fn subscribe_effects(&self) -> broadcast::Receiver<Effect> {
        self.core.subscribe_effects()
    }

    pub fn core(&self) -> &Arc<ControllerCore<UserListState, ListIntent>> {
        &self.core
    }

    pub fn load_users(&self) -> IntentTasks {
        let list_users = Arc::clone(&self.list_users);
        let failure_text = self.resources.text(TextKey::CommunicationError);

        self.core
            .launch(
                ListIntent::Refresh,
                async move { list_users.execute().await },
                move |core, ticket, outcome| match outcome {
                    Ok(users) => {
                        core.settle(ticket, false, |state| state.users = users);
                    }
                    Err(err) => {
                        warn!(error = %err, code = ?err.code(), "loading user list failed");
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::Message(failure_text));
                        }
                    }
                },
            )
            .into()
    }

    pub fn edit_user(&self, id: UserId) {
        self.core.emit(Effect::Navigate(Route::UserEdit { user_id: Some(id) }));
    }

    pub fn add_new_user(&self) {
        self.core.emit(Effect::Navigate(Route::UserEdit { user_id: None }));
    }

    pub fn change_user_password(&self, id: UserId) {
        self.core
            .emit(Effect::Navigate(Route::PasswordChange { user_id: id }));
    }

    /// Asks for confirmation only; nothing is removed until
    /// [`Self::delete_user_confirmed`] is called.
    pub fn delete_user(&self, id: UserId) {
        self.core.emit(Effect::ConfirmDelete { user_id: id });
    }

    /// Deletes the user, then re-lists, both inside one loading window.
    pub fn delete_user_confirmed(&self, id: UserId) -> IntentTasks {
        let list_users = Arc::clone(&self.list_users);
        let delete_user = Arc::clone(&self.delete_user);
        let deleted_text = self.resources.text(TextKey::UserDeleted);
        let failure_text = self.resources.text(TextKey::CommunicationError);

        self.core
            .launch(
                ListIntent::Refresh,
                async move {
                    delete_user.execute(&id).await?;
                    list_users.execute().await
                },
                move |core, ticket, outcome| match outcome {
                    Ok(users) => {
                        if core.settle(ticket, false, |state| state.users = users) {
                            core.emit(Effect::Message(deleted_text));
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, code = ?err.code(), "deleting user failed");
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::Message(failure_text));
                        }
                    }
                },
            )
            .into()
    }
}

#[cfg(test)]
#[path = "../tests/user_list_tests.rs"]
mod tests;
