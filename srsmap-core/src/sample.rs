//! Built-in sample mapping used for development, demos and tests.

use crate::models::{Entry, EntryStatus};

const LOGIN_SNIPPET: &str = r#"function LoginComponent() {
  const handleGitHubLogin = async () => {
    // OAuth logic
    await signInWithGitHub();
  };

  return (
    <div className="auth-container">
      <h2>Sign in to Platform</h2>
      <button onClick={handleGitHubLogin}>
        Continue with GitHub
      </button>
    </div>
  );
}"#;

const AUTH_PROVIDER_SNIPPET: &str = r#"const AuthContext = createContext<AuthContextType | null>(null);

export function AuthProvider({ children }) {
  const [user, setUser] = useState<User | null>(null);

  const signInWithGitHub = async () => {
    // Implementation details
  };

  const signOut = async () => {
    // Implementation details
  };

  return (
    <AuthContext.Provider value={{ user, signInWithGitHub, signOut }}>
      {children}
    </AuthContext.Provider>
  );
}"#;

const REPO_SELECTOR_SNIPPET: &str = r#"const RepoSelector = () => {
  const [repositories, setRepositories] = useState([]);
  const [selectedRepo, setSelectedRepo] = useState(null);

  useEffect(() => {
    // Fetch user repositories
    fetchUserRepositories().then(data => {
      setRepositories(data);
    });
  }, []);

  return (
    <div className="repo-selector">
      <h3>Select a Repository</h3>
      <ul className="repo-list">
        {repositories.map(repo => (
          <li key={repo.id} onClick={() => setSelectedRepo(repo)}>
            {repo.name}
          </li>
        ))}
      </ul>
    </div>
  );
};"#;

const MAPPING_SNIPPET: &str = r#"function generateSrsCodeMapping(srsRequirements, codebase) {
  const mappings = [];

  // Iterate through requirements
  for (const req of srsRequirements) {
    // Search codebase for matching implementation
    const implementations = findImplementations(req, codebase);

    // Create mapping
    mappings.push({
      srsId: req.id,
      implementations
    });
  }

  return mappings;
}"#;

const MAPPING_PAGE_SNIPPET: &str = r#"function SrsMappingPage() {
  const [mappings, setMappings] = useState([]);

  useEffect(() => {
    // Fetch SRS-code mappings
    fetchSrsMappings().then(data => {
      setMappings(data);
    });
  }, []);

  return (
    <div className="srs-mapping-page">
      <h1>SRS-Code Mappings</h1>
      <div className="mapping-container">
        <MappingTree mappings={mappings} />
        <CodePreview />
      </div>
    </div>
  );
}"#;

/// The sample SRS mapping for repository "1"
pub fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::new(
            "1",
            "REQ-001",
            "User Authentication",
            "The system shall provide user authentication via GitHub OAuth.",
            EntryStatus::Implemented,
        )
        .with_children(vec![
            Entry::new(
                "1.1",
                "REQ-001.1",
                "Login Component",
                "Implement login UI with GitHub button",
                EntryStatus::Implemented,
            )
            .with_implementation("src/components/auth/Login.tsx", "LoginComponent", LOGIN_SNIPPET)
            .with_commit("a3b45c7 (Alex Smith): Implement GitHub OAuth", "2 days ago"),
            Entry::new(
                "1.2",
                "REQ-001.2",
                "Authentication Provider",
                "Implement auth context provider",
                EntryStatus::Implemented,
            )
            .with_implementation(
                "src/contexts/AuthContext.tsx",
                "AuthProvider",
                AUTH_PROVIDER_SNIPPET,
            )
            .with_commit("a3b45c7 (Alex Smith): Implement GitHub OAuth", "2 days ago"),
        ]),
        Entry::new(
            "2",
            "REQ-002",
            "Repository Integration",
            "The system shall integrate with GitHub repositories.",
            EntryStatus::Partial,
        )
        .with_children(vec![
            Entry::new(
                "2.1",
                "REQ-002.1",
                "Repository Selection",
                "Allow users to select repositories to connect",
                EntryStatus::Implemented,
            )
            .with_implementation(
                "src/components/repositories/RepoSelector.tsx",
                "RepoSelector",
                REPO_SELECTOR_SNIPPET,
            )
            .with_commit("b4c56d8 (Jamie Lee): Add repository selection UI", "4 days ago"),
            Entry::new(
                "2.2",
                "REQ-002.2",
                "Repository Sync",
                "Implement background syncing of repositories",
                EntryStatus::Pending,
            ),
        ]),
        Entry::new(
            "3",
            "REQ-003",
            "Code-SRS Mapping",
            "The system shall map SRS requirements to code implementations.",
            EntryStatus::Implemented,
        )
        .with_children(vec![
            Entry::new(
                "3.1",
                "REQ-003.1",
                "Mapping Algorithm",
                "Implement algorithm to map SRS IDs to code",
                EntryStatus::Implemented,
            )
            .with_implementation("src/services/mapping.ts", "generateSrsCodeMapping", MAPPING_SNIPPET)
            .with_commit(
                "c5d67e9 (Taylor Kim): Implement SRS-code mapping algorithm",
                "1 week ago",
            ),
            Entry::new(
                "3.2",
                "REQ-003.2",
                "Mapping Visualization",
                "Create UI for visualizing SRS-code mappings",
                EntryStatus::Implemented,
            )
            .with_implementation("src/pages/SrsMapping.tsx", "SrsMappingPage", MAPPING_PAGE_SNIPPET)
            .with_commit(
                "d6e78f0 (Jordan Chen): Add SRS mapping visualization UI",
                "5 days ago",
            ),
        ]),
        Entry::new(
            "4",
            "REQ-004",
            "Documentation Generation",
            "The system shall generate documentation from code and SRS.",
            EntryStatus::Pending,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::count_entries;

    #[test]
    fn test_sample_shape() {
        let entries = sample_entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(count_entries(&entries), 10);
        let sync = &entries[1].children[1];
        assert_eq!(sync.external_id, "REQ-002.2");
        assert!(!sync.has_implementation());
        assert!(entries[3].children.is_empty());
    }
}
