//! One-shot instructions published by screen controllers.

use shared::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Back,
    UserEdit { user_id: Option<UserId> },
    PasswordChange { user_id: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Navigate(Route),
    Message(String),
    ConfirmDelete { user_id: UserId },
}

impl Effect {
    pub fn back() -> Self {
        Effect::Navigate(Route::Back)
    }

    pub fn is_back(&self) -> bool {
        matches!(self, Effect::Navigate(Route::Back))
    }
}
