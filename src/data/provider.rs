use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GraphError, ProviderError};

use super::parse::{RawDocument, parse_document};
use super::records::{DataSet, Profile, RelationshipRecord, RepositoryRecord, UserRecord};

/// Source of repository, user and relationship records.
///
/// Every call may fail; retrying is the provider's business, never the caller's.
pub trait DataProvider: Send + Sync {
    fn fetch_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError>;
    fn fetch_users(&self) -> Result<Vec<UserRecord>, ProviderError>;
    fn fetch_relationships(&self) -> Result<Vec<RelationshipRecord>, ProviderError>;

    /// Looked up lazily when a user node is activated, never during layout.
    fn resolve_profile(&self, reference: &str) -> Result<Profile, ProviderError>;
}

/// Resolves all three lists or none: any provider failure means the data is
/// unavailable and layout must not start.
pub fn fetch_all(provider: &dyn DataProvider) -> Result<DataSet, GraphError> {
    let repositories = provider
        .fetch_repositories()
        .map_err(|error| unavailable("repositories", &error))?;
    let users = provider
        .fetch_users()
        .map_err(|error| unavailable("users", &error))?;
    let relationships = provider
        .fetch_relationships()
        .map_err(|error| unavailable("relationships", &error))?;

    tracing::debug!(
        repositories = repositories.len(),
        users = users.len(),
        relationships = relationships.len(),
        "fetched graph data"
    );

    Ok(DataSet {
        repositories,
        users,
        relationships,
    })
}

fn unavailable(what: &str, error: &ProviderError) -> GraphError {
    tracing::warn!(what, %error, "data provider failed");
    GraphError::incomplete(format!("{what} unavailable: {error}"))
}

/// Reads a JSON document with `repositories`, `users`, `relationships` and
/// optional `profiles` keys.
pub struct JsonFileProvider {
    path: PathBuf,
    document: RawDocument,
}

impl JsonFileProvider {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        let raw = fs::read_to_string(&path).map_err(|source| ProviderError::Io {
            path: display.clone(),
            source,
        })?;
        let document = parse_document(&raw, &display)?;
        Ok(Self { path, document })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ProviderError> {
        let document = parse_document(raw, "inline document")?;
        Ok(Self {
            path: PathBuf::from("<inline>"),
            document,
        })
    }

    /// Records (and profiles) that failed to decode and were left out.
    pub fn skipped_records(&self) -> usize {
        self.document.skipped_records
    }

    fn list<T: Clone>(&self, list: &Option<Vec<T>>, what: &str) -> Result<Vec<T>, ProviderError> {
        list.clone().ok_or_else(|| ProviderError::Missing {
            what: format!("{what} in {}", self.path.display()),
        })
    }
}

impl DataProvider for JsonFileProvider {
    fn fetch_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError> {
        self.list(&self.document.repositories, "repositories")
    }

    fn fetch_users(&self) -> Result<Vec<UserRecord>, ProviderError> {
        self.list(&self.document.users, "users")
    }

    fn fetch_relationships(&self) -> Result<Vec<RelationshipRecord>, ProviderError> {
        self.list(&self.document.relationships, "relationships")
    }

    fn resolve_profile(&self, reference: &str) -> Result<Profile, ProviderError> {
        self.document
            .profiles
            .get(reference)
            .cloned()
            .ok_or_else(|| ProviderError::MissingProfile {
                reference: reference.to_owned(),
            })
    }
}

/// In-memory records, for tests and the built-in demo.
#[derive(Clone, Debug, Default)]
pub struct StaticProvider {
    pub repositories: Vec<RepositoryRecord>,
    pub users: Vec<UserRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub profiles: HashMap<String, Profile>,
}

impl StaticProvider {
    pub fn new(data: DataSet) -> Self {
        Self {
            repositories: data.repositories,
            users: data.users,
            relationships: data.relationships,
            profiles: HashMap::new(),
        }
    }

    /// A small, skewed sample: a few busy repositories, many occasional
    /// contributors, and some relationships pointing at nothing.
    pub fn sample() -> Self {
        const REPOSITORIES: [(&str, u64); 8] = [
            ("aurora/kernel", 4_210),
            ("aurora/docs", 380),
            ("aurora/cli", 1_150),
            ("tidepool/web", 640),
            ("tidepool/api", 920),
            ("lantern/scripts", 18),
            ("lantern/site", 42),
            ("solo/dotfiles", 3),
        ];
        const USERS: [(&str, &str); 14] = [
            ("5f1e", "Ada"),
            ("a93c", "Brook"),
            ("0c2d", "Cass"),
            ("77ab", "Dev"),
            ("e410", "Emery"),
            ("19f0", "Finley"),
            ("b2b2", "Gray"),
            ("c3d4", "Harper"),
            ("d00d", "Indigo"),
            ("5f1e", "Ada L."),
            ("f00f", "Jules"),
            ("ab12", "Kai"),
            ("9e9e", "Lane"),
            ("4a4a", "Morgan"),
        ];

        let repositories = REPOSITORIES
            .iter()
            .map(|(name, commits)| RepositoryRecord {
                name: (*name).to_owned(),
                commit_count: *commits,
            })
            .collect::<Vec<_>>();

        let mut relationships = Vec::new();
        let mut user_totals = vec![0u64; USERS.len()];
        for (repo_index, (repo, repo_commits)) in REPOSITORIES.iter().enumerate() {
            for (user_index, (hashed_email, name)) in USERS.iter().enumerate() {
                let affinity = (repo_index * 7 + user_index * 3) % 11;
                if affinity > 3 {
                    continue;
                }
                let share = (repo_commits / (2 + affinity as u64 * 5 + user_index as u64)).max(1);
                user_totals[user_index] += share;
                relationships.push(RelationshipRecord {
                    repository_id: (*repo).to_owned(),
                    user_hashed_email: (*hashed_email).to_owned(),
                    user_name: (*name).to_owned(),
                    commit_count: share,
                });
            }
        }
        relationships.push(RelationshipRecord {
            repository_id: "archived/gone".to_owned(),
            user_hashed_email: "5f1e".to_owned(),
            user_name: "Ada".to_owned(),
            commit_count: 12,
        });

        let mut profiles = HashMap::new();
        let users = USERS
            .iter()
            .zip(user_totals)
            .map(|((hashed_email, name), total)| {
                let reference = format!("commits/{hashed_email}/{}", name.replace(' ', "-"));
                profiles.insert(
                    reference.clone(),
                    Profile {
                        profile_url: format!("https://github.com/{}", name.to_lowercase().replace([' ', '.'], "")),
                    },
                );
                UserRecord {
                    hashed_email: (*hashed_email).to_owned(),
                    name: (*name).to_owned(),
                    commit_count: total,
                    any_commit_reference: Some(reference),
                }
            })
            .collect();

        Self {
            repositories,
            users,
            relationships,
            profiles,
        }
    }
}

impl DataProvider for StaticProvider {
    fn fetch_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError> {
        Ok(self.repositories.clone())
    }

    fn fetch_users(&self) -> Result<Vec<UserRecord>, ProviderError> {
        Ok(self.users.clone())
    }

    fn fetch_relationships(&self) -> Result<Vec<RelationshipRecord>, ProviderError> {
        Ok(self.relationships.clone())
    }

    fn resolve_profile(&self, reference: &str) -> Result<Profile, ProviderError> {
        self.profiles
            .get(reference)
            .cloned()
            .ok_or_else(|| ProviderError::MissingProfile {
                reference: reference.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingUsers(StaticProvider);

    impl DataProvider for FailingUsers {
        fn fetch_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError> {
            self.0.fetch_repositories()
        }

        fn fetch_users(&self) -> Result<Vec<UserRecord>, ProviderError> {
            Err(ProviderError::Missing {
                what: "users".to_owned(),
            })
        }

        fn fetch_relationships(&self) -> Result<Vec<RelationshipRecord>, ProviderError> {
            self.0.fetch_relationships()
        }

        fn resolve_profile(&self, reference: &str) -> Result<Profile, ProviderError> {
            self.0.resolve_profile(reference)
        }
    }

    #[test]
    fn any_failed_fetch_makes_data_incomplete() {
        let provider = FailingUsers(StaticProvider::sample());
        let error = fetch_all(&provider).expect_err("users fetch fails");
        assert!(matches!(error, GraphError::DataIncomplete { .. }));
    }

    #[test]
    fn json_provider_reports_missing_lists() {
        let provider =
            JsonFileProvider::from_json_str(r#"{"repositories": [], "users": []}"#).expect("parses");
        assert!(provider.fetch_repositories().is_ok());
        assert!(matches!(
            provider.fetch_relationships(),
            Err(ProviderError::Missing { .. })
        ));
        assert!(fetch_all(&provider).is_err());
    }

    #[test]
    fn json_provider_resolves_profiles() {
        let provider = JsonFileProvider::from_json_str(
            r#"{"repositories": [], "users": [], "relationships": [],
                "profiles": {"c/1": {"author": {"html_url": "https://github.com/ada"}}}}"#,
        )
        .expect("parses");
        assert_eq!(
            provider.resolve_profile("c/1").map(|p| p.profile_url).ok(),
            Some("https://github.com/ada".to_owned())
        );
        assert!(matches!(
            provider.resolve_profile("c/2"),
            Err(ProviderError::MissingProfile { .. })
        ));
    }

    #[test]
    fn json_provider_open_reports_io_errors() {
        let result = JsonFileProvider::open("/nonexistent/commit-constellation.json");
        assert!(matches!(result, Err(ProviderError::Io { .. })));
    }

    #[test]
    fn sample_has_profiles_for_every_user() {
        let provider = StaticProvider::sample();
        for user in &provider.users {
            let reference = user.any_commit_reference.as_deref().expect("reference");
            assert!(provider.resolve_profile(reference).is_ok());
        }
    }
}
