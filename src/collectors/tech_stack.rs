use super::{log_item_failure, ScanOptions};
use crate::error::Result;
use crate::github::GitHubApi;
use crate::manifest::{Dependencies, ManifestParser, PackageJson};
use crate::models::TechStack;
use crate::types::{ContentEntry, GitHubRepo};
use std::collections::BTreeSet;
use tracing::info;

/// Root file name (lowercased) → framework tag.
const MANIFEST_TAGS: &[(&str, &str)] = &[
    ("package.json", "Node.js/npm"),
    ("requirements.txt", "Python"),
    ("pipfile", "Python"),
    ("pyproject.toml", "Python (Modern)"),
    ("composer.json", "PHP/Composer"),
    ("pom.xml", "Java/Maven"),
    ("build.gradle", "Java/Gradle"),
    ("cargo.toml", "Rust"),
    ("go.mod", "Go"),
    ("gemfile", "Ruby"),
];

const CI_TAGS: &[(&str, &str)] = &[
    ("github", "GitHub Actions"),
    ("gitlab", "GitLab CI"),
    ("circle", "CircleCI"),
];

const PACKAGE_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue.js"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("express", "Express.js"),
];
const PACKAGE_TESTING: &[(&str, &str)] = &[("jest", "Jest"), ("cypress", "Cypress")];
const PACKAGE_DEVOPS: &[(&str, &str)] = &[("webpack", "Webpack"), ("vite", "Vite")];
const PACKAGE_DATABASES: &[(&str, &str)] = &[
    ("mongoose", "MongoDB"),
    ("pg", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mysql2", "MySQL"),
    ("redis", "Redis"),
    ("ioredis", "Redis"),
    ("prisma", "Prisma"),
    ("sqlite3", "SQLite"),
];

/// Tags one root entry. Returns true when the entry is a `package.json`
/// whose dependencies are worth reading.
pub fn classify_file(name: &str, stack: &mut TechStack) -> bool {
    let name = name.to_lowercase();

    if let Some((_, tag)) = MANIFEST_TAGS.iter().find(|(file, _)| *file == name) {
        stack.frameworks.insert(tag.to_string());
    }

    if name.contains("docker") {
        stack.devops.insert("Docker".to_string());
    }

    if name.ends_with(".yml") || name.ends_with(".yaml") {
        if let Some((_, tag)) = CI_TAGS.iter().find(|(needle, _)| name.contains(needle)) {
            stack.devops.insert(tag.to_string());
        }
    }

    name == "package.json"
}

/// Tags from the dependency names of a `package.json`.
pub fn classify_package_json(content: &str, stack: &mut TechStack) {
    let Some(deps) = PackageJson.parse(content) else {
        return;
    };

    tag_dependencies(&deps, PACKAGE_FRAMEWORKS, &mut stack.frameworks);
    tag_dependencies(&deps, PACKAGE_TESTING, &mut stack.testing);
    tag_dependencies(&deps, PACKAGE_DEVOPS, &mut stack.devops);
    tag_dependencies(&deps, PACKAGE_DATABASES, &mut stack.databases);
}

fn tag_dependencies(deps: &Dependencies, table: &[(&str, &str)], tags: &mut BTreeSet<String>) {
    for (dependency, label) in table {
        if deps.contains_key(*dependency) {
            tags.insert(label.to_string());
        }
    }
}

/// Lists the root of each sampled repository and tags what it finds.
pub async fn analyze_tech_stack<A: GitHubApi>(
    api: &A,
    repos: &[GitHubRepo],
    options: &ScanOptions,
) -> Result<TechStack> {
    let mut stack = TechStack::default();

    for repo in repos.iter().take(options.tech_stack_sample) {
        let path = format!("/repos/{}/contents", repo.full_name);
        let entries: Vec<ContentEntry> = match api.get(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                log_item_failure("tech_stack", &repo.full_name, &e);
                continue;
            }
        };

        let mut has_package_json = false;
        for entry in &entries {
            has_package_json |= classify_file(&entry.name, &mut stack);
        }

        if has_package_json {
            let path = format!("/repos/{}/contents/package.json", repo.full_name);
            match api.get_raw(&path).await {
                Ok(content) => classify_package_json(&content, &mut stack),
                Err(e) => log_item_failure("tech_stack", &repo.full_name, &e),
            }
        }
    }

    info!(
        frameworks = stack.frameworks.len(),
        devops = stack.devops.len(),
        testing = stack.testing.len(),
        databases = stack.databases.len(),
        "tech stack analyzed"
    );
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_and_ci_files() {
        let mut stack = TechStack::default();
        assert!(!classify_file("Cargo.toml", &mut stack));
        assert!(!classify_file("docker-compose.yml", &mut stack));
        assert!(!classify_file(".gitlab-ci.yml", &mut stack));
        assert!(classify_file("package.json", &mut stack));

        assert!(stack.frameworks.contains("Rust"));
        assert!(stack.frameworks.contains("Node.js/npm"));
        assert!(stack.devops.contains("Docker"));
        assert!(stack.devops.contains("GitLab CI"));
        assert!(!stack.devops.contains("GitHub Actions"));
    }

    #[test]
    fn test_package_json_dependencies() {
        let mut stack = TechStack::default();
        classify_package_json(
            r#"{"dependencies":{"react":"18","pg":"8"},"devDependencies":{"vite":"5","jest":"29"}}"#,
            &mut stack,
        );
        assert!(stack.frameworks.contains("React"));
        assert!(stack.devops.contains("Vite"));
        assert!(stack.testing.contains("Jest"));
        assert!(stack.databases.contains("PostgreSQL"));
        assert!(!stack.frameworks.contains("Vue.js"));
    }

    #[test]
    fn test_unparseable_package_json_ignored() {
        let mut stack = TechStack::default();
        classify_package_json("not json", &mut stack);
        assert!(stack.is_empty());
    }
}
