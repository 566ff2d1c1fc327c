//! Screen controllers and use cases for the user-management client.
//!
//! Controllers accept intents, run use cases as latest-wins background tasks
//! and publish a single state value plus one-shot effects. Use cases wrap the
//! persistence collaborators from the `storage` crate.

pub mod controller;
pub mod resources;
pub mod saved_state;
pub mod usecase;
pub mod validation;

pub use controller::{
    events::{Effect, Route},
    password_change::{PasswordChangeController, PasswordChangeState},
    user_edit::{UserEditController, UserEditState},
    user_list::{UserListController, UserListState},
    ControllerCore, IntentTasks,
};
pub use resources::{AppResources, DefaultResources, TextKey};
pub use saved_state::SavedStateHandle;
pub use usecase::UseCases;

#[cfg(test)]
#[path = "tests/doubles.rs"]
mod doubles;
