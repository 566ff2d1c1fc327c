//! Text lookup for user-visible messages.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    CommunicationError,
    UserDeleted,
    UserEditHeader,
    UserAddHeader,
    NicknameInvalid,
    EmailInvalid,
    DescriptionInvalid,
    PasswordInvalid,
    PasswordMismatch,
}

pub trait AppResources: Send + Sync {
    fn text(&self, key: TextKey) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResources;

impl AppResources for DefaultResources {
    fn text(&self, key: TextKey) -> String {
        match key {
            TextKey::CommunicationError => {
                "There was a problem communicating with the service. Please try again."
            }
            TextKey::UserDeleted => "User has been deleted.",
            TextKey::UserEditHeader => "Edit user",
            TextKey::UserAddHeader => "Add user",
            TextKey::NicknameInvalid => "Nickname can be at most 10 characters long.",
            TextKey::EmailInvalid => "Please enter a valid email address.",
            TextKey::DescriptionInvalid => "Description may contain only letters, digits and spaces.",
            TextKey::PasswordInvalid => {
                "Password needs 8+ characters with upper and lower case letters, a digit and a symbol."
            }
            TextKey::PasswordMismatch => "Password confirmation differs.",
        }
        .to_string()
    }
}
