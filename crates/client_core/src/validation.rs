//! Field rules shared by the edit and password screens. Each check returns the
//! message key for an invalid value, or `None` when the value is acceptable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::resources::TextKey;

pub const NICKNAME_MAX_CHARS: usize = 10;
pub const PASSWORD_MIN_CHARS: usize = 8;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
    )
    .expect("email pattern compiles")
});

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N} ]*$").expect("alphanumeric pattern compiles"));

pub fn nickname(value: &str) -> Option<TextKey> {
    (value.chars().count() > NICKNAME_MAX_CHARS).then_some(TextKey::NicknameInvalid)
}

pub fn email(value: &str) -> Option<TextKey> {
    (!EMAIL.is_match(value)).then_some(TextKey::EmailInvalid)
}

pub fn description(value: &str) -> Option<TextKey> {
    (!ALPHANUMERIC.is_match(value)).then_some(TextKey::DescriptionInvalid)
}

/// An empty password is not flagged; submit availability covers that case.
pub fn password(value: &str) -> Option<TextKey> {
    if value.is_empty() {
        return None;
    }
    let strong = value.chars().count() >= PASSWORD_MIN_CHARS
        && value.chars().any(char::is_lowercase)
        && value.chars().any(char::is_uppercase)
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    (!strong).then_some(TextKey::PasswordInvalid)
}

pub fn password_confirmation(password: &str, confirmation: &str) -> Option<TextKey> {
    (!password.is_empty() && !confirmation.is_empty() && password != confirmation)
        .then_some(TextKey::PasswordMismatch)
}

pub fn user_form_complete(nickname_value: &str, email_value: &str, description_value: &str) -> bool {
    !nickname_value.is_empty()
        && nickname(nickname_value).is_none()
        && !email_value.is_empty()
        && email(email_value).is_none()
        && !description_value.is_empty()
        && description(description_value).is_none()
}

pub fn password_form_complete(password_value: &str, confirmation: &str) -> bool {
    !password_value.is_empty()
        && !confirmation.is_empty()
        && password(password_value).is_none()
        && password_confirmation(password_value, confirmation).is_none()
}
