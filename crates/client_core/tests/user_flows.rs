use std::{collections::BTreeSet, sync::Arc, time::Duration};

use client_core::{
    AppResources, DefaultResources, Effect, PasswordChangeController, SavedStateHandle, TextKey,
    UseCases, UserEditController, UserListController,
};
use shared::domain::{seed_users, AttachmentKind, UserId, UserRecord};
use storage::{BlobStore, FsContentLoader, MemoryBlobStore, MemoryRecordStore};

struct Harness {
    records: Arc<MemoryRecordStore>,
    blobs: Arc<MemoryBlobStore>,
    use_cases: UseCases,
    resources: Arc<DefaultResources>,
}

fn harness() -> Harness {
    let latency = Duration::from_millis(5);
    let records = Arc::new(MemoryRecordStore::with_seed_users(latency, seed_users()));
    let blobs = Arc::new(MemoryBlobStore::new(latency));
    let use_cases = UseCases::from_stores(
        records.clone(),
        blobs.clone(),
        Arc::new(FsContentLoader::new()),
    );
    Harness {
        records,
        blobs,
        use_cases,
        resources: Arc::new(DefaultResources),
    }
}

impl Harness {
    fn list_screen(&self) -> UserListController {
        UserListController::new(
            self.use_cases.list_users.clone(),
            self.use_cases.delete_user.clone(),
            self.resources.clone(),
        )
    }

    fn edit_screen(&self, id: Option<UserId>, saved_state: SavedStateHandle) -> UserEditController {
        UserEditController::new(id, saved_state, &self.use_cases, self.resources.clone())
    }
}

fn nicknames(users: &[UserRecord]) -> BTreeSet<String> {
    users.iter().map(|user| user.nickname.clone()).collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn list_then_delete_second_seeded_user() {
    let h = harness();
    let screen = h.list_screen();
    let mut effects = screen.subscribe_effects();
    let second = seed_users()[1].id.clone().expect("seed id");

    screen.load_users().join().await.expect("load");
    assert_eq!(
        nicknames(&screen.state().users),
        set(&["Nickname1", "Nickname2", "Nickname3"])
    );

    screen.delete_user(second.clone());
    assert_eq!(
        effects.recv().await.expect("confirm"),
        Effect::ConfirmDelete {
            user_id: second.clone()
        }
    );
    screen
        .delete_user_confirmed(second)
        .join()
        .await
        .expect("delete");

    assert_eq!(
        nicknames(&screen.state().users),
        set(&["Nickname1", "Nickname3"])
    );
    assert!(!screen.state().loading);
    assert_eq!(
        effects.recv().await.expect("message"),
        Effect::Message(DefaultResources.text(TextKey::UserDeleted))
    );
}

#[tokio::test]
async fn new_user_with_avatar_is_stored_under_its_generated_id() {
    let h = harness();
    let dir = tempfile::tempdir().expect("tempdir");
    let avatar_path = dir.path().join("avatar.png");
    std::fs::write(&avatar_path, [0x89, b'P', b'N', b'G']).expect("write avatar");

    let screen = h.edit_screen(None, SavedStateHandle::new());
    let mut effects = screen.subscribe_effects();
    screen.load_details().join().await.expect("init");
    screen.set_nickname("Newbie");
    screen.set_email("newbie@test.com");
    screen.set_description("Fresh account");
    screen
        .add_avatar(avatar_path.to_string_lossy())
        .join()
        .await
        .expect("avatar");
    assert_eq!(
        screen.state().avatar_asset_key,
        Some(AttachmentKind::Avatar.asset_key(""))
    );

    screen.submit().join().await.expect("submit");
    assert!(effects.recv().await.expect("back").is_back());

    assert_eq!(h.records.len().await, 4);
    let users = h.use_cases.list_users.execute().await.expect("list");
    let created = users
        .iter()
        .find(|user| user.nickname == "Newbie")
        .and_then(|user| user.id.clone())
        .expect("created user");
    let detail = h
        .use_cases
        .get_user_detail
        .execute(&created)
        .await
        .expect("detail");
    assert_eq!(detail.avatar, Some(vec![0x89, b'P', b'N', b'G']));
    assert_eq!(detail.id_scan, None);
}

#[tokio::test]
async fn editing_a_seeded_user_keeps_other_users_untouched() {
    let h = harness();
    let first = seed_users()[0].id.clone().expect("seed id");

    let screen = h.edit_screen(Some(first.clone()), SavedStateHandle::new());
    screen.load_details().join().await.expect("load");
    assert_eq!(screen.state().nickname, "Nickname1");
    screen.set_nickname("Renamed");
    screen.submit().join().await.expect("submit");

    let list = h.list_screen();
    list.load_users().join().await.expect("load");
    assert_eq!(
        nicknames(&list.state().users),
        set(&["Renamed", "Nickname2", "Nickname3"])
    );
    assert!(!h.blobs.contains(&AttachmentKind::Avatar.asset_key(first.as_str())).await);
}

#[tokio::test]
async fn password_change_stores_the_credential() {
    let h = harness();
    let third = seed_users()[2].id.clone().expect("seed id");
    let screen = PasswordChangeController::new(
        Some(third.clone()),
        SavedStateHandle::new(),
        h.use_cases.update_password.clone(),
        h.resources.clone(),
    );
    let mut effects = screen.subscribe_effects();

    screen.set_password("N3w-Secret");
    screen.set_password_confirmed("N3w-Secret");
    assert!(screen.state().submit_enabled);
    screen.submit().join().await.expect("submit");

    assert!(effects.recv().await.expect("back").is_back());
    assert_eq!(h.records.credential(&third).await.as_deref(), Some("N3w-Secret"));
}

#[tokio::test]
async fn picked_attachment_survives_a_process_restart() {
    let h = harness();
    let first = seed_users()[0].id.clone().expect("seed id");
    let dir = tempfile::tempdir().expect("tempdir");
    let scan_path = dir.path().join("scan.jpg");
    let state_path = dir.path().join("saved_state.json");
    std::fs::write(&scan_path, b"scan").expect("write scan");

    let saved_state = SavedStateHandle::new();
    {
        let screen = h.edit_screen(Some(first.clone()), saved_state.clone());
        screen.load_details().join().await.expect("load");
        screen.set_description("Changed before restart");
        screen
            .add_id_scan(scan_path.to_string_lossy())
            .join()
            .await
            .expect("scan");
    }
    saved_state.persist(&state_path).expect("persist");

    // the staged blob is still in the store; only the screen went away
    h.blobs
        .save(&AttachmentKind::IdScan.asset_key(first.as_str()), b"scan v2".to_vec())
        .await
        .expect("overwrite staged scan");

    let restored = SavedStateHandle::load(&state_path).expect("load saved state");
    let screen = h.edit_screen(Some(first.clone()), restored);
    let state = screen.state();
    assert!(state.initialized);
    assert_eq!(state.description, "Changed before restart");
    assert_eq!(state.id_scan, None);

    screen.load_details().join().await.expect("refetch");
    assert_eq!(screen.state().id_scan, Some(b"scan v2".to_vec()));
    assert_eq!(screen.state().nickname, "Nickname1");
}
