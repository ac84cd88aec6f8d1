//! Member model matching the JSON document committed to the data repository.

use serde::{Deserialize, Serialize};

/// A bookgroup member. Identified by a generated stable `id`; records written
/// before ids existed deserialize with an empty id and are assigned one on the
/// next commit of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default)]
    pub id: String,
    pub given_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Eligible to receive broadcast messages
    #[serde(default)]
    pub notifiable: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl Member {
    /// Full display name, "Given Family" or just "Given".
    pub fn display_name(&self) -> String {
        match self.family_name.as_deref() {
            Some(family) if !family.is_empty() => format!("{} {}", self.given_name, family),
            _ => self.given_name.clone(),
        }
    }
}

/// Request body for creating a new member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub given_name: String,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notifiable: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// Version token the client read
    pub sha: String,
}

/// Request body for updating an existing member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notifiable: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    /// Version token the client read
    pub sha: String,
}

/// Sort members in place by given name, then family name.
pub fn sort_members(members: &mut [Member]) {
    members.sort_by(|a, b| {
        a.given_name
            .cmp(&b.given_name)
            .then_with(|| a.family_name.cmp(&b.family_name))
    });
}

/// Assign ids to any members that lack one. Returns true if anything changed.
pub fn ensure_member_ids(members: &mut [Member]) -> bool {
    let mut changed = false;
    for member in members.iter_mut() {
        if member.id.is_empty() {
            member.id = uuid::Uuid::new_v4().to_string();
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(given: &str, family: Option<&str>) -> Member {
        Member {
            id: "m1".to_string(),
            given_name: given.to_string(),
            family_name: family.map(String::from),
            email: None,
            notifiable: false,
            is_admin: false,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(member("Ada", Some("Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(member("Ada", None).display_name(), "Ada");
        assert_eq!(member("Ada", Some("")).display_name(), "Ada");
    }

    #[test]
    fn test_sort_members() {
        let mut members = vec![
            member("Carol", None),
            member("Ada", Some("Byron")),
            member("Ada", Some("Allen")),
        ];
        sort_members(&mut members);
        let names: Vec<String> = members.iter().map(|m| m.display_name()).collect();
        assert_eq!(names, vec!["Ada Allen", "Ada Byron", "Carol"]);
    }

    #[test]
    fn test_ensure_member_ids() {
        let mut members = vec![member("Ada", None)];
        members[0].id = String::new();
        assert!(ensure_member_ids(&mut members));
        assert!(!members[0].id.is_empty());
        assert!(!ensure_member_ids(&mut members));
    }

    #[test]
    fn test_legacy_record_deserializes_with_empty_id() {
        let m: Member =
            serde_json::from_str(r#"{"givenName":"Ada","familyName":"Lovelace"}"#).unwrap();
        assert!(m.id.is_empty());
        assert!(!m.notifiable);
    }
}
