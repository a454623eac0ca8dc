use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Full repository name, e.g. `owner/project`.
    pub name: String,
    #[serde(default, rename = "n_commits", alias = "commit_count")]
    pub commit_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub hashed_email: String,
    pub name: String,
    #[serde(default, rename = "n_commits", alias = "commit_count")]
    pub commit_count: u64,
    /// Opaque handle of any commit by this user, resolved to a profile on demand.
    #[serde(default, rename = "any_commit_url", alias = "any_commit_reference")]
    pub any_commit_reference: Option<String>,
}

impl UserRecord {
    pub fn id(&self) -> String {
        user_key(&self.hashed_email, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    #[serde(rename = "repository_name", alias = "repository_id")]
    pub repository_id: String,
    pub user_hashed_email: String,
    pub user_name: String,
    #[serde(default, rename = "n_commits", alias = "commit_count")]
    pub commit_count: u64,
}

impl RelationshipRecord {
    pub fn user_id(&self) -> String {
        user_key(&self.user_hashed_email, &self.user_name)
    }
}

/// Users are keyed by hashed email and display name together: the same hashed
/// email shows up under several names in commit history.
pub fn user_key(hashed_email: &str, name: &str) -> String {
    let mut key = String::with_capacity(hashed_email.len() + name.len());
    key.push_str(hashed_email);
    key.push_str(name);
    key
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "html_url", alias = "profile_url")]
    pub profile_url: String,
}

/// The three record lists, all resolved. Layout only ever starts from one of these.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSet {
    pub repositories: Vec<RepositoryRecord>,
    pub users: Vec<UserRecord>,
    pub relationships: Vec<RelationshipRecord>,
}
