//! Dependency manifest sniffing.
//!
//! Each ecosystem gets a lightweight pattern-based parser behind
//! [`ManifestParser`], turning manifest text into a name → version map.
//! None of these are real parsers for their formats; they extract what the
//! common layouts put on a single line.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Library name → declared version (`latest` when none is pinned).
pub type Dependencies = BTreeMap<String, String>;

const UNPINNED: &str = "latest";

pub trait ManifestParser: Sync {
    /// File name looked up at the repository root.
    fn file_name(&self) -> &'static str;

    /// `None` when the file yields no dependencies at all.
    fn parse(&self, content: &str) -> Option<Dependencies>;
}

fn non_empty(deps: Dependencies) -> Option<Dependencies> {
    if deps.is_empty() {
        None
    } else {
        Some(deps)
    }
}

pub struct PackageJson;

impl ManifestParser for PackageJson {
    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        let manifest: Value = serde_json::from_str(content).ok()?;
        let mut deps = Dependencies::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(entries) = manifest.get(section).and_then(Value::as_object) {
                for (name, version) in entries {
                    let version = version.as_str().unwrap_or(UNPINNED);
                    deps.insert(name.clone(), version.to_string());
                }
            }
        }
        non_empty(deps)
    }
}

pub struct RequirementsTxt;

impl ManifestParser for RequirementsTxt {
    fn file_name(&self) -> &'static str {
        "requirements.txt"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static LINE: OnceLock<Regex> = OnceLock::new();
        let line_re = LINE.get_or_init(|| {
            Regex::new(r"^([a-zA-Z0-9_-]+)(==|>=|<=|~=|>|<)?(.*)$").expect("valid regex")
        });

        let mut deps = Dependencies::new();
        for line in content.lines().map(str::trim) {
            if let Some(caps) = line_re.captures(line) {
                let version = caps
                    .get(3)
                    .map(|m| m.as_str().trim())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(UNPINNED);
                deps.insert(caps[1].to_lowercase(), version.to_string());
            }
        }
        non_empty(deps)
    }
}

/// Shared walk over `[section]` blocks of a TOML-ish file. Lines are read
/// while inside one of `sections`; any other header ends the walk.
fn scan_toml_sections(
    content: &str,
    sections: &[&str],
    entry_re: &Regex,
    lowercase: bool,
) -> Dependencies {
    let mut deps = Dependencies::new();
    let mut inside = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if sections.contains(&trimmed) {
            inside = true;
            continue;
        }
        if inside && trimmed.starts_with('[') {
            break;
        }
        if inside {
            if let Some(caps) = entry_re.captures(trimmed) {
                let name = if lowercase {
                    caps[1].to_lowercase()
                } else {
                    caps[1].to_string()
                };
                deps.insert(name, caps[2].to_string());
            }
        }
    }
    deps
}

pub struct Pipfile;

impl ManifestParser for Pipfile {
    fn file_name(&self) -> &'static str {
        "Pipfile"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static ENTRY: OnceLock<Regex> = OnceLock::new();
        let entry_re = ENTRY
            .get_or_init(|| Regex::new(r#"^([a-zA-Z0-9_-]+)\s*=\s*"(.*)""#).expect("valid regex"));
        non_empty(scan_toml_sections(
            content,
            &["[packages]", "[dev-packages]"],
            entry_re,
            true,
        ))
    }
}

pub struct CargoToml;

impl ManifestParser for CargoToml {
    fn file_name(&self) -> &'static str {
        "Cargo.toml"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static ENTRY: OnceLock<Regex> = OnceLock::new();
        let entry_re = ENTRY.get_or_init(|| {
            Regex::new(r#"^([a-zA-Z0-9_-]+)\s*=\s*["{]?\s*(?:version\s*=\s*)?["']?([^"'}\s,]+)"#)
                .expect("valid regex")
        });
        non_empty(scan_toml_sections(
            content,
            &["[dependencies]", "[dev-dependencies]"],
            entry_re,
            false,
        ))
    }
}

pub struct Gemfile;

impl ManifestParser for Gemfile {
    fn file_name(&self) -> &'static str {
        "Gemfile"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static GEM: OnceLock<Regex> = OnceLock::new();
        let gem_re =
            GEM.get_or_init(|| Regex::new(r#"gem\s+['"]([^'"]+)['"]"#).expect("valid regex"));

        let deps = gem_re
            .captures_iter(content)
            .map(|caps| (caps[1].to_string(), UNPINNED.to_string()))
            .collect();
        non_empty(deps)
    }
}

pub struct GoMod;

impl ManifestParser for GoMod {
    fn file_name(&self) -> &'static str {
        "go.mod"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static REQUIRE: OnceLock<Regex> = OnceLock::new();
        let require_re = REQUIRE
            .get_or_init(|| Regex::new(r"([a-zA-Z0-9_./-]+)\s+v([\d.]+)").expect("valid regex"));

        let mut deps = Dependencies::new();
        let mut in_block = false;
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed == "require (" {
                in_block = true;
                continue;
            }
            if in_block && trimmed == ")" {
                break;
            }
            if in_block || trimmed.starts_with("require ") {
                if let Some(caps) = require_re.captures(trimmed) {
                    let module = &caps[1];
                    let name = module.rsplit('/').next().unwrap_or(module);
                    deps.insert(name.to_string(), caps[2].to_string());
                }
            }
        }
        non_empty(deps)
    }
}

pub struct PomXml;

const POM_BUILD_PLUGINS: [&str; 2] = ["maven-compiler-plugin", "maven-surefire-plugin"];

impl ManifestParser for PomXml {
    fn file_name(&self) -> &'static str {
        "pom.xml"
    }

    fn parse(&self, content: &str) -> Option<Dependencies> {
        static ARTIFACT: OnceLock<Regex> = OnceLock::new();
        let artifact_re = ARTIFACT
            .get_or_init(|| Regex::new(r"<artifactId>([^<]+)</artifactId>").expect("valid regex"));

        let deps = artifact_re
            .captures_iter(content)
            .map(|caps| caps[1].trim().to_string())
            .filter(|artifact| !POM_BUILD_PLUGINS.contains(&artifact.as_str()))
            .map(|artifact| (artifact, UNPINNED.to_string()))
            .collect();
        non_empty(deps)
    }
}

/// Ecosystems the library analyzer understands, keyed off a repository's
/// primary language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    JavaScript,
    Python,
    Ruby,
    Go,
    Rust,
    Java,
}

impl Ecosystem {
    pub fn for_language(language: &str) -> Option<Self> {
        match language {
            "JavaScript" | "TypeScript" => Some(Ecosystem::JavaScript),
            "Python" => Some(Ecosystem::Python),
            "Ruby" => Some(Ecosystem::Ruby),
            "Go" => Some(Ecosystem::Go),
            "Rust" => Some(Ecosystem::Rust),
            "Java" => Some(Ecosystem::Java),
            _ => None,
        }
    }

    /// Manifests checked for this ecosystem, in lookup order.
    pub fn parsers(self) -> &'static [&'static dyn ManifestParser] {
        static JAVASCRIPT: [&dyn ManifestParser; 1] = [&PackageJson];
        static PYTHON: [&dyn ManifestParser; 2] = [&RequirementsTxt, &Pipfile];
        static RUBY: [&dyn ManifestParser; 1] = [&Gemfile];
        static GO: [&dyn ManifestParser; 1] = [&GoMod];
        static RUST: [&dyn ManifestParser; 1] = [&CargoToml];
        static JAVA: [&dyn ManifestParser; 1] = [&PomXml];

        match self {
            Ecosystem::JavaScript => &JAVASCRIPT,
            Ecosystem::Python => &PYTHON,
            Ecosystem::Ruby => &RUBY,
            Ecosystem::Go => &GO,
            Ecosystem::Rust => &RUST,
            Ecosystem::Java => &JAVA,
        }
    }
}

/// Known library names per category. First match wins.
const LIBRARY_CATEGORIES: &[(&str, &[&str])] = &[
    ("UI Framework", &["react", "vue", "@angular/core", "svelte", "solid-js", "preact", "lit", "@stencil/core"]),
    ("State Management", &["redux", "@reduxjs/toolkit", "mobx", "vuex", "pinia", "zustand", "recoil", "jotai", "valtio", "@ngrx/store"]),
    ("Styling", &["styled-components", "@emotion/react", "@emotion/styled", "tailwindcss", "sass", "less", "@mui/material", "antd", "bootstrap", "@chakra-ui/react"]),
    ("Build Tools", &["webpack", "vite", "rollup", "parcel", "esbuild", "turbopack", "@swc/core", "babel"]),
    ("Testing", &["jest", "mocha", "vitest", "cypress", "@testing-library/react", "playwright", "puppeteer", "karma", "jasmine"]),
    ("Backend Framework", &["express", "koa", "fastify", "@nestjs/core", "hapi", "@hapi/hapi", "restify", "apollo-server"]),
    ("Database/ORM", &["mongoose", "prisma", "typeorm", "sequelize", "knex", "@mikro-orm/core", "objection", "bookshelf"]),
    ("HTTP Client", &["axios", "got", "node-fetch", "ky", "superagent", "@tanstack/react-query", "swr", "@apollo/client"]),
    ("Utilities", &["lodash", "ramda", "underscore", "date-fns", "moment", "dayjs", "uuid", "nanoid"]),
    ("Validation", &["joi", "yup", "zod", "ajv", "validator", "@hapi/joi", "express-validator"]),
    ("Web Framework", &["django", "flask", "fastapi", "tornado", "pyramid", "bottle", "sanic", "aiohttp"]),
    ("Data Science", &["numpy", "pandas", "scipy", "matplotlib", "seaborn", "plotly", "bokeh"]),
    ("Machine Learning", &["scikit-learn", "tensorflow", "keras", "pytorch", "xgboost", "lightgbm", "catboost"]),
    ("Database", &["sqlalchemy", "psycopg2", "pymongo", "redis", "peewee", "tortoise-orm"]),
    ("Testing Python", &["pytest", "unittest", "nose", "tox", "coverage", "mock"]),
    ("Ruby Framework", &["rails", "sinatra", "hanami", "roda", "grape"]),
    ("Ruby Testing", &["rspec", "minitest", "cucumber", "capybara"]),
    ("Go Framework", &["gin", "echo", "fiber", "chi", "gorilla/mux", "beego"]),
    ("Go Database", &["gorm", "sqlx", "ent", "go-redis"]),
    ("Java Framework", &["spring-boot", "spring-framework", "hibernate", "struts", "jsf"]),
    ("Java Build", &["maven", "gradle", "ant"]),
    ("Rust Framework", &["actix-web", "rocket", "axum", "warp", "tide"]),
    ("Rust Async", &["tokio", "async-std", "futures"]),
    ("PHP Framework", &["laravel", "symfony", "codeigniter", "yii", "slim"]),
    ("PHP Testing", &["phpunit", "codeception", "behat"]),
];

pub const OTHER_CATEGORY: &str = "Other";

pub fn categorize(library: &str) -> &'static str {
    LIBRARY_CATEGORIES
        .iter()
        .find(|(_, names)| names.contains(&library))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_json_merges_dev_dependencies() {
        let deps = PackageJson
            .parse(r#"{"dependencies":{"react":"^18.2.0"},"devDependencies":{"jest":"29"}}"#)
            .unwrap();
        assert_eq!(deps["react"], "^18.2.0");
        assert_eq!(deps["jest"], "29");
        assert!(PackageJson.parse("{not json").is_none());
        assert!(PackageJson.parse(r#"{"name":"empty"}"#).is_none());
    }

    #[test]
    fn test_requirements_txt() {
        let deps = RequirementsTxt
            .parse("Django==4.2\r\nrequests>=2.0\nnumpy\n# comment\n\n")
            .unwrap();
        assert_eq!(deps["django"], "4.2");
        assert_eq!(deps["requests"], "2.0");
        assert_eq!(deps["numpy"], "latest");
        assert_eq!(deps.len(), 3);
    }

    #[test]
    fn test_pipfile_reads_both_package_sections() {
        let content = "[[source]]\nurl = \"https://pypi.org/simple\"\n\n[packages]\nFlask = \"*\"\n\n[dev-packages]\npytest = \">=7\"\n\n[requires]\npython_version = \"3.11\"\n";
        let deps = Pipfile.parse(content).unwrap();
        assert_eq!(deps["flask"], "*");
        assert_eq!(deps["pytest"], ">=7");
        assert!(!deps.contains_key("python_version"));
    }

    #[test]
    fn test_cargo_toml() {
        let content = "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[dependencies]\nserde = { version = \"1.0\", features = [\"derive\"] }\ntokio = \"1\"\n\n[dev-dependencies]\ntempfile = \"3\"\n\n[features]\ndefault = []\n";
        let deps = CargoToml.parse(content).unwrap();
        assert_eq!(deps["serde"], "1.0");
        assert_eq!(deps["tokio"], "1");
        assert_eq!(deps["tempfile"], "3");
        assert!(!deps.contains_key("name"));
        assert!(!deps.contains_key("default"));
    }

    #[test]
    fn test_gemfile() {
        let deps = Gemfile
            .parse("source 'https://rubygems.org'\ngem 'rails', '~> 7.0'\ngem \"rspec\"\n")
            .unwrap();
        assert!(deps.contains_key("rails"));
        assert!(deps.contains_key("rspec"));
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_go_mod_uses_last_path_segment() {
        let content = "module example.com/app\n\ngo 1.21\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgorm.io/gorm v1.25.0\n)\n";
        let deps = GoMod.parse(content).unwrap();
        assert_eq!(deps["gin"], "1.9.1");
        assert_eq!(deps["gorm"], "1.25.0");

        let single = GoMod.parse("require github.com/go-chi/chi v5.0.0\n").unwrap();
        assert_eq!(single["chi"], "5.0.0");
    }

    #[test]
    fn test_pom_skips_build_plugins() {
        let content = "<project><artifactId>demo</artifactId><dependencies><dependency><artifactId>spring-boot</artifactId></dependency></dependencies><plugins><plugin><artifactId>maven-compiler-plugin</artifactId></plugin></plugins></project>";
        let deps = PomXml.parse(content).unwrap();
        assert!(deps.contains_key("spring-boot"));
        assert!(deps.contains_key("demo"));
        assert!(!deps.contains_key("maven-compiler-plugin"));
    }

    #[test]
    fn test_ecosystem_selection() {
        assert_eq!(Ecosystem::for_language("TypeScript"), Some(Ecosystem::JavaScript));
        assert_eq!(Ecosystem::for_language("Haskell"), None);
        let names: Vec<&str> = Ecosystem::Python.parsers().iter().map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["requirements.txt", "Pipfile"]);
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("react"), "UI Framework");
        assert_eq!(categorize("tokio"), "Rust Async");
        assert_eq!(categorize("left-pad"), OTHER_CATEGORY);
    }
}
