//! Add/edit user form with avatar and ID-scan attachments.
//!
//! A picked attachment is staged in the blob store right away under its derived
//! key; the key is kept as pending in the state until the form is submitted.
//! When the screen is recreated after initialization, pending keys are fetched
//! again so freshly picked attachments win over the persisted ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{
    domain::{AssetKey, AttachmentKind, UserDetail, UserId},
    error::DomainError,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::{
    controller::{events::Effect, ControllerCore, IntentTasks, ScreenState},
    resources::{AppResources, TextKey},
    saved_state::SavedStateHandle,
    usecase::{AddAttachment, FetchAttachment, GetUserDetail, UpsertUser, UseCases},
    validation,
};

pub const SAVED_STATE_KEY: &str = "user_edit";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEditState {
    pub header: String,
    pub initialized: bool,
    pub nickname: String,
    pub email: String,
    pub description: String,
    pub nickname_error: Option<String>,
    pub email_error: Option<String>,
    pub description_error: Option<String>,
    pub submit_enabled: bool,
    pub avatar: Option<Vec<u8>>,
    pub avatar_asset_key: Option<AssetKey>,
    pub id_scan: Option<Vec<u8>>,
    pub id_scan_asset_key: Option<AssetKey>,
    pub loading: bool,
}

impl ScreenState for UserEditState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

impl UserEditState {
    fn refresh_submit(&mut self) {
        self.submit_enabled =
            validation::user_form_complete(&self.nickname, &self.email, &self.description);
    }

    fn apply_nickname(&mut self, value: String, resources: &dyn AppResources) {
        self.nickname_error = validation::nickname(&value).map(|key| resources.text(key));
        self.nickname = value;
        self.refresh_submit();
    }

    fn apply_email(&mut self, value: String, resources: &dyn AppResources) {
        self.email_error = validation::email(&value).map(|key| resources.text(key));
        self.email = value;
        self.refresh_submit();
    }

    fn apply_description(&mut self, value: String, resources: &dyn AppResources) {
        self.description_error = validation::description(&value).map(|key| resources.text(key));
        self.description = value;
        self.refresh_submit();
    }

    fn set_attachment(&mut self, kind: AttachmentKind, key: Option<AssetKey>, bytes: Vec<u8>) {
        match kind {
            AttachmentKind::Avatar => {
                if key.is_some() {
                    self.avatar_asset_key = key;
                }
                self.avatar = Some(bytes);
            }
            AttachmentKind::IdScan => {
                if key.is_some() {
                    self.id_scan_asset_key = key;
                }
                self.id_scan = Some(bytes);
            }
        }
    }

    fn attachment(&self, kind: AttachmentKind) -> Option<&[u8]> {
        match kind {
            AttachmentKind::Avatar => self.avatar.as_deref(),
            AttachmentKind::IdScan => self.id_scan.as_deref(),
        }
    }

    fn pending_key(&self, kind: AttachmentKind) -> Option<&AssetKey> {
        match kind {
            AttachmentKind::Avatar => self.avatar_asset_key.as_ref(),
            AttachmentKind::IdScan => self.id_scan_asset_key.as_ref(),
        }
    }
}

/// What survives a restart of the edit screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEditSnapshot {
    pub initialized: bool,
    pub nickname: String,
    pub email: String,
    pub description: String,
    pub avatar_asset_key: Option<AssetKey>,
    pub id_scan_asset_key: Option<AssetKey>,
}

impl From<&UserEditState> for UserEditSnapshot {
    fn from(state: &UserEditState) -> Self {
        Self {
            initialized: state.initialized,
            nickname: state.nickname.clone(),
            email: state.email.clone(),
            description: state.description.clone(),
            avatar_asset_key: state.avatar_asset_key.clone(),
            id_scan_asset_key: state.id_scan_asset_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditIntent {
    LoadDetails,
    Attachment(AttachmentKind),
    Submit,
}

pub struct UserEditController {
    core: Arc<ControllerCore<UserEditState, EditIntent>>,
    user_id: Option<UserId>,
    saved_state: SavedStateHandle,
    get_user_detail: Arc<dyn GetUserDetail>,
    add_attachment: Arc<dyn AddAttachment>,
    fetch_attachment: Arc<dyn FetchAttachment>,
    upsert_user: Arc<dyn UpsertUser>,
    resources: Arc<dyn AppResources>,
}

impl UserEditController {
    pub fn new(
        user_id: Option<UserId>,
        saved_state: SavedStateHandle,
        use_cases: &UseCases,
        resources: Arc<dyn AppResources>,
    ) -> Self {
        let header = resources.text(if user_id.is_some() {
            TextKey::UserEditHeader
        } else {
            TextKey::UserAddHeader
        });
        let mut initial = UserEditState {
            header,
            ..UserEditState::default()
        };
        if let Some(snapshot) = saved_state.get::<UserEditSnapshot>(SAVED_STATE_KEY) {
            debug!(initialized = snapshot.initialized, "restoring user edit screen");
            restore(&mut initial, snapshot, resources.as_ref());
        }

        Self {
            core: ControllerCore::new(initial),
            user_id,
            saved_state,
            get_user_detail: Arc::clone(&use_cases.get_user_detail),
            add_attachment: Arc::clone(&use_cases.add_attachment),
            fetch_attachment: Arc::clone(&use_cases.fetch_attachment),
            upsert_user: Arc::clone(&use_cases.upsert_user),
            resources,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn state(&self) -> UserEditState {
        self.core.snapshot()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<UserEditState> {
        self.core.subscribe_state()
    }

    pub fn subscribe_effects(&self) -> broadcast::Receiver<Effect> {
        self.core.subscribe_effects()
    }

    pub fn core(&self) -> &Arc<ControllerCore<UserEditState, EditIntent>> {
        &self.core
    }

    pub fn set_nickname(&self, nickname: impl Into<String>) {
        let nickname = nickname.into();
        self.core
            .update(|state| state.apply_nickname(nickname, self.resources.as_ref()));
    }

    pub fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.core
            .update(|state| state.apply_email(email, self.resources.as_ref()));
    }

    pub fn set_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.core
            .update(|state| state.apply_description(description, self.resources.as_ref()));
    }

    /// First call loads the stored user; once initialized, only re-fetches
    /// attachments still pending from an earlier pick.
    pub fn load_details(&self) -> IntentTasks {
        if self.core.snapshot().initialized {
            return self.restore_pending_attachments();
        }

        let Some(user_id) = self.user_id.clone() else {
            self.core.update(|state| state.initialized = true);
            return IntentTasks::none();
        };

        // keys restored from a snapshot taken mid-load have no bytes yet
        let current = self.core.snapshot();
        let unfetched: Vec<(AttachmentKind, AssetKey)> = AttachmentKind::ALL
            .into_iter()
            .filter(|kind| current.attachment(*kind).is_none())
            .filter_map(|kind| current.pending_key(kind).cloned().map(|key| (kind, key)))
            .collect();

        let get_user_detail = Arc::clone(&self.get_user_detail);
        let fetch_attachment = Arc::clone(&self.fetch_attachment);
        let resources = Arc::clone(&self.resources);
        self.core
            .launch(
                EditIntent::LoadDetails,
                async move {
                    let detail = get_user_detail.execute(&user_id).await?;
                    let mut pending = Vec::new();
                    for (kind, key) in unfetched {
                        match fetch_attachment.execute(&key).await {
                            Ok(bytes) if !bytes.is_empty() => pending.push((kind, bytes)),
                            Ok(_) => {}
                            Err(err) => warn!(?kind, error = %err, "pending attachment unavailable"),
                        }
                    }
                    Ok::<_, DomainError>((detail, pending))
                },
                move |core, ticket, outcome| match outcome {
                    Ok((detail, pending)) => {
                        core.settle(ticket, false, |state| {
                            state.initialized = true;
                            state.apply_nickname(detail.nickname, resources.as_ref());
                            state.apply_email(detail.email, resources.as_ref());
                            state.apply_description(detail.description, resources.as_ref());
                            // a pick made while loading beats the stored copy
                            if state.avatar_asset_key.is_none() {
                                state.avatar = detail.avatar;
                            }
                            if state.id_scan_asset_key.is_none() {
                                state.id_scan = detail.id_scan;
                            }
                            for (kind, bytes) in pending {
                                if state.attachment(kind).is_none() {
                                    state.set_attachment(kind, None, bytes);
                                }
                            }
                        });
                    }
                    Err(err) => {
                        warn!(error = %err, code = ?err.code(), "loading user details failed");
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::back());
                        }
                    }
                },
            )
            .into()
    }

    fn restore_pending_attachments(&self) -> IntentTasks {
        let state = self.core.snapshot();
        AttachmentKind::ALL
            .into_iter()
            .filter_map(|kind| state.pending_key(kind).cloned().map(|key| (kind, key)))
            .map(|(kind, key)| {
                let fetch_attachment = Arc::clone(&self.fetch_attachment);
                self.core.launch(
                    EditIntent::Attachment(kind),
                    async move { fetch_attachment.execute(&key).await },
                    move |core, ticket, outcome| match outcome {
                        Ok(bytes) if !bytes.is_empty() => {
                            core.settle(ticket, false, |state| {
                                state.set_attachment(kind, None, bytes)
                            });
                        }
                        Ok(_) => {
                            core.settle(ticket, false, |_| {});
                        }
                        Err(err) => {
                            warn!(?kind, error = %err, "pending attachment unavailable");
                            core.settle(ticket, false, |_| {});
                        }
                    },
                )
            })
            .collect()
    }

    pub fn add_avatar(&self, content_ref: impl Into<String>) -> IntentTasks {
        self.add_attachment(AttachmentKind::Avatar, content_ref.into())
    }

    pub fn add_id_scan(&self, content_ref: impl Into<String>) -> IntentTasks {
        self.add_attachment(AttachmentKind::IdScan, content_ref.into())
    }

    fn add_attachment(&self, kind: AttachmentKind, content_ref: String) -> IntentTasks {
        let add_attachment = Arc::clone(&self.add_attachment);
        let fetch_attachment = Arc::clone(&self.fetch_attachment);
        let owner = self.user_id.clone();
        let failure_text = self.resources.text(TextKey::CommunicationError);

        self.core
            .launch(
                EditIntent::Attachment(kind),
                async move {
                    let key = add_attachment
                        .execute(owner.as_ref(), &content_ref, kind)
                        .await?;
                    let bytes = fetch_attachment.execute(&key).await?;
                    Ok::<_, DomainError>((key, bytes))
                },
                move |core, ticket, outcome| match outcome {
                    Ok((key, bytes)) => {
                        core.settle(ticket, false, |state| {
                            state.set_attachment(kind, Some(key), bytes)
                        });
                    }
                    Err(err) => {
                        warn!(?kind, error = %err, code = ?err.code(), "adding attachment failed");
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::Message(failure_text));
                        }
                    }
                },
            )
            .into()
    }

    pub fn submit(&self) -> IntentTasks {
        let state = self.core.snapshot();
        let detail = UserDetail {
            id: self.user_id.clone(),
            nickname: state.nickname,
            email: state.email,
            description: state.description,
            avatar: state.avatar,
            id_scan: state.id_scan,
        };
        let upsert_user = Arc::clone(&self.upsert_user);
        let failure_text = self.resources.text(TextKey::CommunicationError);

        self.core
            .launch(
                EditIntent::Submit,
                async move { upsert_user.execute(detail).await },
                move |core, ticket, outcome| match outcome {
                    Ok(_) => {
                        if core.settle(ticket, true, |_| {}) {
                            core.emit(Effect::back());
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, code = ?err.code(), "saving user failed");
                        let message = match err {
                            DomainError::Validation(messages) => messages
                                .into_iter()
                                .map(|m| m.message)
                                .collect::<Vec<_>>()
                                .join("\n"),
                            _ => failure_text,
                        };
                        if core.settle(ticket, false, |_| {}) {
                            core.emit(Effect::Message(message));
                        }
                    }
                },
            )
            .into()
    }

    pub fn cancel(&self) {
        self.core.emit(Effect::back());
    }

    pub fn save_state(&self) {
        let snapshot = UserEditSnapshot::from(&self.core.snapshot());
        self.saved_state.set(SAVED_STATE_KEY, &snapshot);
    }
}

impl Drop for UserEditController {
    fn drop(&mut self) {
        self.save_state();
    }
}

fn restore(state: &mut UserEditState, snapshot: UserEditSnapshot, resources: &dyn AppResources) {
    state.initialized = snapshot.initialized;
    state.avatar_asset_key = snapshot.avatar_asset_key;
    state.id_scan_asset_key = snapshot.id_scan_asset_key;
    // untouched empty fields stay unflagged
    if !snapshot.nickname.is_empty() {
        state.apply_nickname(snapshot.nickname, resources);
    }
    if !snapshot.email.is_empty() {
        state.apply_email(snapshot.email, resources);
    }
    if !snapshot.description.is_empty() {
        state.apply_description(snapshot.description, resources);
    }
    state.refresh_submit();
}

#[cfg(test)]
#[path = "../tests/user_edit_tests.rs"]
mod tests;
