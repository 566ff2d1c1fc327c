use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(UserId);
string_newtype!(AssetKey);

impl UserId {
    /// Returns `None` for empty or whitespace-only input, so "absent" and
    /// "empty" ids are the same case everywhere.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Avatar,
    IdScan,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 2] = [AttachmentKind::Avatar, AttachmentKind::IdScan];

    fn suffix(self) -> &'static str {
        match self {
            AttachmentKind::Avatar => "avatar",
            AttachmentKind::IdScan => "id-scan",
        }
    }

    /// Derived blob key for an owner. The owner may be empty when an
    /// attachment is picked before the user has been created.
    pub fn asset_key(self, owner: &str) -> AssetKey {
        AssetKey(format!("{owner}-{}", self.suffix()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Option<UserId>,
    pub nickname: String,
    pub email: String,
    pub description: String,
}

impl UserRecord {
    pub fn new(
        id: Option<UserId>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            email: email.into(),
            description: description.into(),
        }
    }
}

/// User record merged with its two attachments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserDetail {
    pub id: Option<UserId>,
    pub nickname: String,
    pub email: String,
    pub description: String,
    pub avatar: Option<Vec<u8>>,
    pub id_scan: Option<Vec<u8>>,
}

impl UserDetail {
    pub fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            nickname: record.nickname,
            email: record.email,
            description: record.description,
            avatar: None,
            id_scan: None,
        }
    }

    pub fn record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            nickname: self.nickname.clone(),
            email: self.email.clone(),
            description: self.description.clone(),
        }
    }

    pub fn attachment(&self, kind: AttachmentKind) -> Option<&[u8]> {
        match kind {
            AttachmentKind::Avatar => self.avatar.as_deref(),
            AttachmentKind::IdScan => self.id_scan.as_deref(),
        }
    }

    pub fn set_attachment(&mut self, kind: AttachmentKind, bytes: Option<Vec<u8>>) {
        match kind {
            AttachmentKind::Avatar => self.avatar = bytes,
            AttachmentKind::IdScan => self.id_scan = bytes,
        }
    }
}

pub fn seed_users() -> Vec<UserRecord> {
    [
        ("a312b3ee-84c2-11eb-8dcd-0242ac130003", 1),
        ("3b04aacf-4320-48bb-8171-af512aae0894", 2),
        ("52408bc4-4cdf-49ef-ac54-364bfde3fbf0", 3),
    ]
    .into_iter()
    .map(|(id, n)| {
        UserRecord::new(
            Some(UserId(id.to_string())),
            format!("Nickname{n}"),
            format!("nickname{n}@test.com"),
            format!("Test description {n}"),
        )
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_attachment_keys_from_owner() {
        assert_eq!(AttachmentKind::Avatar.asset_key("u-1").0, "u-1-avatar");
        assert_eq!(AttachmentKind::IdScan.asset_key("u-1").0, "u-1-id-scan");
        assert_eq!(AttachmentKind::Avatar.asset_key("").0, "-avatar");
    }

    #[test]
    fn blank_user_ids_parse_as_absent() {
        assert_eq!(UserId::parse(""), None);
        assert_eq!(UserId::parse("   "), None);
        assert_eq!(UserId::parse("abc"), Some(UserId("abc".into())));
    }
}
