//! Editable résumé document.
//!
//! A document is seeded once from a [`ScanReport`] and belongs to the user
//! afterwards: later scans never touch a saved document. Documents are
//! stored as JSON under `resume-<handle>` in a [`KeyValueStore`].

use crate::aggregator::ScanReport;
use crate::error::{Result, ScouterError};
use crate::store::KeyValueStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;
use tracing::{debug, info};

/// Largest accepted photo, measured on the decoded image bytes.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const KEY_PREFIX: &str = "resume-";
const TOP_LIBRARIES_PER_LANGUAGE: usize = 5;
const LIBRARIES_PER_CATEGORY: usize = 10;
const TOP_REPOSITORIES: usize = 3;
const LISTED_ORGANIZATIONS: usize = 3;
const LIBRARY_LANGUAGES: usize = 3;

/// A year/month row: employment history or qualifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatedEntry {
    pub year: String,
    pub month: String,
    pub content: String,
}

/// A free-text block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NoteEntry {
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SkillEntry {
    pub category: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDocument {
    pub furigana: String,
    pub name: String,
    pub birth_year: String,
    pub birth_month: String,
    pub birth_day: String,
    pub age: String,
    pub gender: String,
    pub postal_code: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub contact_postal_code: String,
    pub contact_address: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub personal_note: String,
    pub custom_experiences: Vec<DatedEntry>,
    pub custom_qualifications: Vec<DatedEntry>,
    pub custom_github_experiences: Vec<NoteEntry>,
    pub resume_date: String,
    pub custom_skills: Vec<SkillEntry>,
    /// `data:image/...;base64,...`
    pub photo_data: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// Japanese résumé (履歴書) layout.
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = ScouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ja" | "jp" | "japanese" => Ok(Locale::Ja),
            "en" | "english" => Ok(Locale::En),
            other => Err(ScouterError::InvalidInput(format!("unknown locale '{}'", other))),
        }
    }
}

struct Labels {
    title: &'static str,
    languages_skill: &'static str,
    libraries_skill_suffix: &'static str,
    used_in_projects: &'static str,
    frameworks_skill: &'static str,
    devops_skill: &'static str,
    account_heading: &'static str,
    repositories_heading: &'static str,
    readme_heading: &'static str,
    top_repos_heading: &'static str,
    organizations_heading: &'static str,
    contributions_heading: &'static str,
    languages_heading: &'static str,
    tech_stack_heading: &'static str,
    libraries_heading: &'static str,
    external_heading: &'static str,
    unknown: &'static str,
    not_set: &'static str,
    none: &'static str,
    no_bio: &'static str,
    no_description: &'static str,
    no_organizations: &'static str,
    readme_missing: &'static str,
    readme_present: &'static str,
    email_public: &'static str,
    email_private: &'static str,
    photo_attached: &'static str,
    field_names: [&'static str; 16],
    experiences: &'static str,
    qualifications: &'static str,
    github_experiences: &'static str,
    skills: &'static str,
}

static JA: Labels = Labels {
    title: "履歴書",
    languages_skill: "主要プログラミング言語",
    libraries_skill_suffix: "主要ライブラリ",
    used_in_projects: "プロジェクトで使用",
    frameworks_skill: "フレームワーク・ライブラリ",
    devops_skill: "開発・運用ツール",
    account_heading: "【GitHubアカウント情報】",
    repositories_heading: "【リポジトリ実績】",
    readme_heading: "【プロフィールREADME情報】",
    top_repos_heading: "【主要リポジトリ実績】",
    organizations_heading: "【組織・所属情報】",
    contributions_heading: "【コントリビューション活動】",
    languages_heading: "【主要プログラミング言語】",
    tech_stack_heading: "【技術スタック詳細】",
    libraries_heading: "【ライブラリ使用分析】",
    external_heading: "【外部連携・プロフィール拡張情報】",
    unknown: "不明",
    not_set: "未設定",
    none: "なし",
    no_bio: "プロフィール情報なし",
    no_description: "説明なし",
    no_organizations: "組織所属情報なし",
    readme_missing: "プロフィールREADME: 未設定",
    readme_present: "プロフィールREADME: 設定済み",
    email_public: "設定済み",
    email_private: "非公開",
    photo_attached: "写真: 添付済み",
    field_names: [
        "ふりがな",
        "氏名",
        "生年",
        "生月",
        "生日",
        "年齢",
        "性別",
        "郵便番号",
        "住所",
        "電話",
        "メール",
        "連絡先郵便番号",
        "連絡先住所",
        "連絡先電話",
        "連絡先メール",
        "本人希望記入欄",
    ],
    experiences: "学歴・職歴",
    qualifications: "免許・資格",
    github_experiences: "GitHub技術経歴",
    skills: "スキル",
};

static EN: Labels = Labels {
    title: "Résumé",
    languages_skill: "Primary languages",
    libraries_skill_suffix: " libraries",
    used_in_projects: "projects",
    frameworks_skill: "Frameworks & libraries",
    devops_skill: "Dev & ops tooling",
    account_heading: "[GitHub account]",
    repositories_heading: "[Repositories]",
    readme_heading: "[Profile README]",
    top_repos_heading: "[Top repositories]",
    organizations_heading: "[Organizations]",
    contributions_heading: "[Contributions]",
    languages_heading: "[Languages]",
    tech_stack_heading: "[Tech stack]",
    libraries_heading: "[Library usage]",
    external_heading: "[External profile]",
    unknown: "unknown",
    not_set: "not set",
    none: "none",
    no_bio: "no bio",
    no_description: "no description",
    no_organizations: "no public organizations",
    readme_missing: "Profile README: not set",
    readme_present: "Profile README: present",
    email_public: "public",
    email_private: "private",
    photo_attached: "Photo: attached",
    field_names: [
        "Furigana",
        "Name",
        "Birth year",
        "Birth month",
        "Birth day",
        "Age",
        "Gender",
        "Postal code",
        "Address",
        "Phone",
        "Email",
        "Contact postal code",
        "Contact address",
        "Contact phone",
        "Contact email",
        "Personal note",
    ],
    experiences: "Education & employment",
    qualifications: "Licenses & qualifications",
    github_experiences: "GitHub experience",
    skills: "Skills",
};

impl Locale {
    fn labels(self) -> &'static Labels {
        match self {
            Locale::Ja => &JA,
            Locale::En => &EN,
        }
    }

    fn resume_date(self, today: NaiveDate) -> String {
        match self {
            Locale::Ja => format!("{}年{}月{}日現在", today.year(), today.month(), today.day()),
            Locale::En => format!("As of {}", today.format("%B %-d, %Y")),
        }
    }

    fn personal_note(self, power: u64, top_languages: &[&str]) -> String {
        match self {
            Locale::Ja => format!(
                "ソフトウェアエンジニアとして、GitHub上での実績（Power Level: {}）を活かし、チーム開発やOSS貢献を通じて技術力向上に努めてまいります。\n\n主要な技術領域: {}を中心とした開発",
                group_digits(power),
                top_languages.join("、")
            ),
            Locale::En => format!(
                "Software engineer with a GitHub power level of {}, aiming to keep growing through team development and open-source contribution.\n\nMain areas: development centred on {}",
                group_digits(power),
                top_languages.join(", ")
            ),
        }
    }
}

/// `1234567` → `1,234,567`
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn or_label<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(fallback)
}

fn join_or(items: impl IntoIterator<Item = String>, fallback: &str) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

fn seed_skills(report: &ScanReport, labels: &Labels) -> Vec<SkillEntry> {
    let mut skills = Vec::new();

    if !report.languages.is_empty() {
        skills.push(SkillEntry {
            category: labels.languages_skill.to_string(),
            content: report
                .languages
                .iter()
                .map(|l| format!("{} ({}%)", l.name, l.percentage))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    match &report.library_analysis {
        Some(analysis) => {
            for language in &analysis.languages {
                if language.libraries.is_empty() {
                    continue;
                }
                skills.push(SkillEntry {
                    category: format!("{}{}", language.language, labels.libraries_skill_suffix),
                    content: language
                        .libraries
                        .iter()
                        .take(TOP_LIBRARIES_PER_LANGUAGE)
                        .map(|lib| format!("{} ({} {})", lib.name, lib.usage, labels.used_in_projects))
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }

            let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for lib in &analysis.top_libraries {
                by_category.entry(&lib.category).or_default().push(&lib.name);
            }
            for (category, names) in by_category {
                if skills.iter().any(|s| s.category == category) {
                    continue;
                }
                skills.push(SkillEntry {
                    category: category.to_string(),
                    content: names
                        .into_iter()
                        .take(LIBRARIES_PER_CATEGORY)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        None => {
            let stack = &report.tech_stack;
            if !stack.frameworks.is_empty() {
                skills.push(SkillEntry {
                    category: labels.frameworks_skill.to_string(),
                    content: join_or(stack.frameworks.iter().cloned(), ""),
                });
            }
            if !stack.devops.is_empty() {
                skills.push(SkillEntry {
                    category: labels.devops_skill.to_string(),
                    content: join_or(stack.devops.iter().cloned(), ""),
                });
            }
        }
    }

    skills
}

fn seed_github_blocks(report: &ScanReport, locale: Locale) -> Vec<NoteEntry> {
    let l = locale.labels();
    let profile = &report.profile;
    let stats = &report.stats;
    let ja = locale == Locale::Ja;
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(if ja {
        format!(
            "{}\nユーザー名: @{}\nGitHub Power Level: {}\nアカウント作成: {}年\nプロフィール: {}",
            l.account_heading,
            report.handle,
            group_digits(report.power_level),
            profile.created_at.year(),
            or_label(&profile.bio, l.no_bio)
        )
    } else {
        format!(
            "{}\nHandle: @{}\nGitHub power level: {}\nJoined: {}\nBio: {}",
            l.account_heading,
            report.handle,
            group_digits(report.power_level),
            profile.created_at.year(),
            or_label(&profile.bio, l.no_bio)
        )
    });

    blocks.push(if ja {
        format!(
            "{}\n公開リポジトリ数: {}件\n獲得Star総数: {}件\nフォロワー数: {}人\nフォロー数: {}人\nGist数: {}件",
            l.repositories_heading, stats.repos, stats.stars, stats.followers, stats.following, stats.gists
        )
    } else {
        format!(
            "{}\nPublic repositories: {}\nStars earned: {}\nFollowers: {}\nFollowing: {}\nGists: {}",
            l.repositories_heading, stats.repos, stats.stars, stats.followers, stats.following, stats.gists
        )
    });

    let readme = &report.readme;
    let mut readme_block = format!("{}\n", l.readme_heading);
    if readme.has_readme {
        readme_block.push_str(l.readme_present);
        let sections = [
            (readme.sections.introduction, if ja { "自己紹介セクション有り" } else { "Introduction section" }),
            (readme.sections.skills, if ja { "スキルセクション有り" } else { "Skills section" }),
            (readme.sections.projects, if ja { "プロジェクトセクション有り" } else { "Projects section" }),
            (readme.sections.contact, if ja { "コンタクトセクション有り" } else { "Contact section" }),
        ];
        for (present, line) in sections {
            if present {
                readme_block.push('\n');
                readme_block.push_str(line);
            }
        }
    } else {
        readme_block.push_str(l.readme_missing);
    }
    blocks.push(readme_block);

    if !report.top_repositories.is_empty() {
        let repos: Vec<String> = report
            .top_repositories
            .iter()
            .take(TOP_REPOSITORIES)
            .map(|repo| {
                format!(
                    "{}: ⭐{} 🍴{}\n{}: {}\n{}",
                    repo.name,
                    repo.stargazers_count,
                    repo.forks_count,
                    if ja { "言語" } else { "Language" },
                    or_label(&repo.language, l.unknown),
                    or_label(&repo.description, l.no_description)
                )
            })
            .collect();
        blocks.push(format!("{}\n{}", l.top_repos_heading, repos.join("\n\n")));
    }

    let orgs = &report.organizations;
    blocks.push(if orgs.is_empty() {
        format!("{}\n{}", l.organizations_heading, l.no_organizations)
    } else {
        let listed: Vec<&str> = orgs
            .iter()
            .take(LISTED_ORGANIZATIONS)
            .map(|o| o.login.as_str())
            .collect();
        let rest = orgs.len().saturating_sub(LISTED_ORGANIZATIONS);
        let more = match (rest, ja) {
            (0, _) => String::new(),
            (n, true) => format!(" 他{}件", n),
            (n, false) => format!(" and {} more", n),
        };
        if ja {
            format!("{}\n所属組織数: {}件\n{}{}", l.organizations_heading, orgs.len(), listed.join(", "), more)
        } else {
            format!("{}\nOrganizations: {}\n{}{}", l.organizations_heading, orgs.len(), listed.join(", "), more)
        }
    });

    let c = &report.contributions;
    blocks.push(if ja {
        format!(
            "{}\n総コントリビューション数: {}件\n最長連続コントリビューション: {}日\n現在の連続記録: {}日\n最もアクティブな曜日: {}",
            l.contributions_heading, c.total_contributions, c.longest_streak, c.current_streak, c.most_active_day
        )
    } else {
        format!(
            "{}\nTotal contributions: {}\nLongest streak: {} days\nCurrent streak: {} days\nMost active day: {}",
            l.contributions_heading, c.total_contributions, c.longest_streak, c.current_streak, c.most_active_day
        )
    });

    if !report.languages.is_empty() {
        let lines: Vec<String> = report
            .languages
            .iter()
            .map(|lang| format!("{}: {}% ({:.1}KB)", lang.name, lang.percentage, lang.bytes as f64 / 1024.0))
            .collect();
        blocks.push(format!("{}\n{}", l.languages_heading, lines.join("\n")));
    }

    let stack = &report.tech_stack;
    let (frameworks, devops, testing, databases) = if ja {
        ("フレームワーク・ライブラリ", "開発・運用ツール", "テスト関連", "データベース")
    } else {
        ("Frameworks & libraries", "Dev & ops tooling", "Testing", "Databases")
    };
    blocks.push(format!(
        "{}\n{}: {}\n{}: {}\n{}: {}\n{}: {}",
        l.tech_stack_heading,
        frameworks,
        join_or(stack.frameworks.iter().cloned(), l.none),
        devops,
        join_or(stack.devops.iter().cloned(), l.none),
        testing,
        join_or(stack.testing.iter().cloned(), l.none),
        databases,
        join_or(stack.databases.iter().cloned(), l.none),
    ));

    if let Some(analysis) = &report.library_analysis {
        let mut block = if ja {
            format!("{}\n総ライブラリ数: {}個", l.libraries_heading, analysis.total_unique_libraries)
        } else {
            format!("{}\nDistinct libraries: {}", l.libraries_heading, analysis.total_unique_libraries)
        };
        for language in analysis.languages.iter().take(LIBRARY_LANGUAGES) {
            let top: Vec<&str> = language.libraries.iter().take(3).map(|lib| lib.name.as_str()).collect();
            if ja {
                let _ = write!(
                    block,
                    "\n{}: {}個のライブラリ\n  主要: {}",
                    language.language,
                    language.total_libraries,
                    top.join(", ")
                );
            } else {
                let _ = write!(
                    block,
                    "\n{}: {} libraries\n  main: {}",
                    language.language,
                    language.total_libraries,
                    top.join(", ")
                );
            }
        }
        blocks.push(block);
    }

    let twitter = profile
        .twitter_username
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!("@{}", t));
    let email = if profile.email.as_deref().is_some_and(|e| !e.is_empty()) {
        l.email_public
    } else {
        l.email_private
    };
    blocks.push(if ja {
        format!(
            "{}\n所在地: {}\n会社・組織: {}\nブログ・Website: {}\nTwitter: {}\nメール公開: {}",
            l.external_heading,
            or_label(&profile.location, l.not_set),
            or_label(&profile.company, l.not_set),
            or_label(&profile.blog, l.not_set),
            or_label(&twitter, l.not_set),
            email
        )
    } else {
        format!(
            "{}\nLocation: {}\nCompany: {}\nBlog / website: {}\nTwitter: {}\nEmail: {}",
            l.external_heading,
            or_label(&profile.location, l.not_set),
            or_label(&profile.company, l.not_set),
            or_label(&profile.blog, l.not_set),
            or_label(&twitter, l.not_set),
            email
        )
    });

    blocks.into_iter().map(|content| NoteEntry { content }).collect()
}

/// Scalar fields that can be set by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeField {
    Furigana,
    Name,
    BirthYear,
    BirthMonth,
    BirthDay,
    Age,
    Gender,
    PostalCode,
    Address,
    Phone,
    Email,
    ContactPostalCode,
    ContactAddress,
    ContactPhone,
    ContactEmail,
    PersonalNote,
    ResumeDate,
}

impl ResumeField {
    pub const ALL: [ResumeField; 17] = [
        ResumeField::Furigana,
        ResumeField::Name,
        ResumeField::BirthYear,
        ResumeField::BirthMonth,
        ResumeField::BirthDay,
        ResumeField::Age,
        ResumeField::Gender,
        ResumeField::PostalCode,
        ResumeField::Address,
        ResumeField::Phone,
        ResumeField::Email,
        ResumeField::ContactPostalCode,
        ResumeField::ContactAddress,
        ResumeField::ContactPhone,
        ResumeField::ContactEmail,
        ResumeField::PersonalNote,
        ResumeField::ResumeDate,
    ];

    /// Name as it appears in the stored JSON.
    pub fn key(self) -> &'static str {
        match self {
            ResumeField::Furigana => "furigana",
            ResumeField::Name => "name",
            ResumeField::BirthYear => "birthYear",
            ResumeField::BirthMonth => "birthMonth",
            ResumeField::BirthDay => "birthDay",
            ResumeField::Age => "age",
            ResumeField::Gender => "gender",
            ResumeField::PostalCode => "postalCode",
            ResumeField::Address => "address",
            ResumeField::Phone => "phone",
            ResumeField::Email => "email",
            ResumeField::ContactPostalCode => "contactPostalCode",
            ResumeField::ContactAddress => "contactAddress",
            ResumeField::ContactPhone => "contactPhone",
            ResumeField::ContactEmail => "contactEmail",
            ResumeField::PersonalNote => "personalNote",
            ResumeField::ResumeDate => "resumeDate",
        }
    }
}

impl FromStr for ResumeField {
    type Err = ScouterError;

    /// Accepts the JSON key or its kebab/snake-case spelling.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        ResumeField::ALL
            .iter()
            .copied()
            .find(|field| field.key().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ScouterError::InvalidInput(format!("unknown resume field '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSection {
    Experience,
    Qualification,
    GithubExperience,
    Skill,
}

impl FromStr for ResumeSection {
    type Err = ScouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "experience" | "experiences" => Ok(ResumeSection::Experience),
            "qualification" | "qualifications" => Ok(ResumeSection::Qualification),
            "github" | "github-experience" | "github-experiences" => Ok(ResumeSection::GithubExperience),
            "skill" | "skills" => Ok(ResumeSection::Skill),
            other => Err(ScouterError::InvalidInput(format!("unknown resume section '{}'", other))),
        }
    }
}

/// One row of a list section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeRow {
    Dated(DatedEntry),
    Note(NoteEntry),
    Skill(SkillEntry),
}

impl ResumeSection {
    /// Builds a row from positional values: `YEAR MONTH CONTENT` for dated
    /// sections, `CONTENT` for GitHub experience, `CATEGORY CONTENT` for
    /// skills.
    pub fn row_from_values(self, values: &[String]) -> Result<ResumeRow> {
        let arity_error = |expected: &str| {
            ScouterError::InvalidInput(format!(
                "expected {} for this section, got {} value(s)",
                expected,
                values.len()
            ))
        };
        match (self, values) {
            (ResumeSection::Experience | ResumeSection::Qualification, [year, month, content]) => {
                Ok(ResumeRow::Dated(DatedEntry {
                    year: year.clone(),
                    month: month.clone(),
                    content: content.clone(),
                }))
            }
            (ResumeSection::Experience | ResumeSection::Qualification, _) => {
                Err(arity_error("YEAR MONTH CONTENT"))
            }
            (ResumeSection::GithubExperience, [content]) => Ok(ResumeRow::Note(NoteEntry {
                content: content.clone(),
            })),
            (ResumeSection::GithubExperience, _) => Err(arity_error("CONTENT")),
            (ResumeSection::Skill, [category, content]) => Ok(ResumeRow::Skill(SkillEntry {
                category: category.clone(),
                content: content.clone(),
            })),
            (ResumeSection::Skill, _) => Err(arity_error("CATEGORY CONTENT")),
        }
    }
}

fn mismatch(section: ResumeSection) -> ScouterError {
    ScouterError::InvalidInput(format!("row does not fit the {:?} section", section))
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(ScouterError::InvalidInput(format!(
            "row {} out of range ({} rows)",
            index, len
        )))
    }
}

fn place<T>(rows: &mut Vec<T>, index: Option<usize>, row: T) -> Result<()> {
    match index {
        None => rows.push(row),
        Some(i) => {
            check_index(i, rows.len())?;
            rows[i] = row;
        }
    }
    Ok(())
}

impl ResumeDocument {
    /// A fresh document filled in from a scan.
    pub fn seed(report: &ScanReport, locale: Locale, today: NaiveDate) -> Self {
        let labels = locale.labels();
        let top_languages: Vec<&str> = report
            .languages
            .iter()
            .take(2)
            .map(|l| l.name.as_str())
            .collect();

        ResumeDocument {
            furigana: report.handle.to_lowercase(),
            name: report.handle.clone(),
            personal_note: locale.personal_note(report.power_level, &top_languages),
            custom_github_experiences: seed_github_blocks(report, locale),
            custom_skills: seed_skills(report, labels),
            resume_date: locale.resume_date(today),
            ..Default::default()
        }
    }

    fn field_mut(&mut self, field: ResumeField) -> &mut String {
        match field {
            ResumeField::Furigana => &mut self.furigana,
            ResumeField::Name => &mut self.name,
            ResumeField::BirthYear => &mut self.birth_year,
            ResumeField::BirthMonth => &mut self.birth_month,
            ResumeField::BirthDay => &mut self.birth_day,
            ResumeField::Age => &mut self.age,
            ResumeField::Gender => &mut self.gender,
            ResumeField::PostalCode => &mut self.postal_code,
            ResumeField::Address => &mut self.address,
            ResumeField::Phone => &mut self.phone,
            ResumeField::Email => &mut self.email,
            ResumeField::ContactPostalCode => &mut self.contact_postal_code,
            ResumeField::ContactAddress => &mut self.contact_address,
            ResumeField::ContactPhone => &mut self.contact_phone,
            ResumeField::ContactEmail => &mut self.contact_email,
            ResumeField::PersonalNote => &mut self.personal_note,
            ResumeField::ResumeDate => &mut self.resume_date,
        }
    }

    pub fn set(&mut self, field: ResumeField, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    /// Appends a row, or replaces row `index` when given.
    pub fn put_row(&mut self, section: ResumeSection, index: Option<usize>, row: ResumeRow) -> Result<()> {
        match (section, row) {
            (ResumeSection::Experience, ResumeRow::Dated(entry)) => {
                place(&mut self.custom_experiences, index, entry)
            }
            (ResumeSection::Qualification, ResumeRow::Dated(entry)) => {
                place(&mut self.custom_qualifications, index, entry)
            }
            (ResumeSection::GithubExperience, ResumeRow::Note(entry)) => {
                place(&mut self.custom_github_experiences, index, entry)
            }
            (ResumeSection::Skill, ResumeRow::Skill(entry)) => {
                place(&mut self.custom_skills, index, entry)
            }
            (section, _) => Err(mismatch(section)),
        }
    }

    pub fn add_row(&mut self, section: ResumeSection, row: ResumeRow) -> Result<()> {
        self.put_row(section, None, row)
    }

    pub fn remove_row(&mut self, section: ResumeSection, index: usize) -> Result<()> {
        let len = self.row_count(section);
        check_index(index, len)?;
        match section {
            ResumeSection::Experience => {
                self.custom_experiences.remove(index);
            }
            ResumeSection::Qualification => {
                self.custom_qualifications.remove(index);
            }
            ResumeSection::GithubExperience => {
                self.custom_github_experiences.remove(index);
            }
            ResumeSection::Skill => {
                self.custom_skills.remove(index);
            }
        }
        Ok(())
    }

    pub fn row_count(&self, section: ResumeSection) -> usize {
        match section {
            ResumeSection::Experience => self.custom_experiences.len(),
            ResumeSection::Qualification => self.custom_qualifications.len(),
            ResumeSection::GithubExperience => self.custom_github_experiences.len(),
            ResumeSection::Skill => self.custom_skills.len(),
        }
    }

    /// Attaches a photo given as a base64 image data URL.
    pub fn set_photo(&mut self, data_url: &str) -> Result<()> {
        let data_url = data_url.trim();
        let Some(rest) = data_url.strip_prefix("data:image/") else {
            return Err(ScouterError::InvalidInput(
                "photo must be an image data URL (data:image/...)".to_string(),
            ));
        };
        let Some((_, payload)) = rest.split_once(";base64,") else {
            return Err(ScouterError::InvalidInput(
                "photo data URL must be base64 encoded".to_string(),
            ));
        };
        let bytes = STANDARD.decode(payload).map_err(|e| {
            ScouterError::InvalidInput(format!("photo payload is not valid base64: {}", e))
        })?;
        if bytes.is_empty() {
            return Err(ScouterError::InvalidInput("photo payload is empty".to_string()));
        }
        let size = bytes.len();
        if size > MAX_PHOTO_BYTES {
            return Err(ScouterError::InvalidInput(format!(
                "photo is {} bytes, the limit is {} bytes",
                size, MAX_PHOTO_BYTES
            )));
        }
        self.photo_data = Some(data_url.to_string());
        Ok(())
    }

    pub fn remove_photo(&mut self) {
        self.photo_data = None;
    }
}

/// Plain-text rendering, the terminal's stand-in for printing.
pub fn render_text(doc: &ResumeDocument, locale: Locale) -> String {
    let l = locale.labels();
    let mut out = String::new();

    let _ = writeln!(out, "{}    {}", l.title, doc.resume_date);
    out.push('\n');

    let scalars = [
        &doc.furigana,
        &doc.name,
        &doc.birth_year,
        &doc.birth_month,
        &doc.birth_day,
        &doc.age,
        &doc.gender,
        &doc.postal_code,
        &doc.address,
        &doc.phone,
        &doc.email,
        &doc.contact_postal_code,
        &doc.contact_address,
        &doc.contact_phone,
        &doc.contact_email,
    ];
    for (label, value) in l.field_names.iter().zip(scalars) {
        if !value.is_empty() {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }
    if doc.photo_data.is_some() {
        let _ = writeln!(out, "{}", l.photo_attached);
    }

    let dated_section = |out: &mut String, title: &str, rows: &[DatedEntry]| {
        if rows.is_empty() {
            return;
        }
        let _ = writeln!(out, "\n== {} ==", title);
        for row in rows {
            let _ = writeln!(out, "{:>4} {:>2}  {}", row.year, row.month, row.content);
        }
    };
    dated_section(&mut out, l.experiences, &doc.custom_experiences);
    dated_section(&mut out, l.qualifications, &doc.custom_qualifications);

    if !doc.custom_skills.is_empty() {
        let _ = writeln!(out, "\n== {} ==", l.skills);
        for skill in &doc.custom_skills {
            let _ = writeln!(out, "{}: {}", skill.category, skill.content);
        }
    }

    if !doc.custom_github_experiences.is_empty() {
        let _ = writeln!(out, "\n== {} ==", l.github_experiences);
        for block in &doc.custom_github_experiences {
            let _ = writeln!(out, "{}\n", block.content);
        }
    }

    if !doc.personal_note.is_empty() {
        let _ = writeln!(out, "\n== {} ==\n{}", l.field_names[15], doc.personal_note);
    }

    out
}

/// Saved résumés, one per handle.
pub struct ResumeBook<S> {
    store: S,
}

impl<S: KeyValueStore> ResumeBook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key(handle: &str) -> String {
        format!("{}{}", KEY_PREFIX, handle)
    }

    pub fn load(&self, handle: &str) -> Result<Option<ResumeDocument>> {
        match self.store.get(&Self::key(handle))? {
            Some(json) => {
                let doc = serde_json::from_str(&json).map_err(|e| {
                    ScouterError::Storage(format!("saved resume for '{}' is corrupt: {}", handle, e))
                })?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    pub fn save(&self, handle: &str, doc: &ResumeDocument) -> Result<()> {
        let json = serde_json::to_string(doc)?;
        self.store.set(&Self::key(handle), &json)?;
        debug!(handle, bytes = json.len(), "resume saved");
        Ok(())
    }

    /// The saved document for the report's handle, or a freshly seeded one
    /// (not yet saved). The flag is true when the document was seeded.
    pub fn load_or_seed(
        &self,
        report: &ScanReport,
        locale: Locale,
        today: NaiveDate,
    ) -> Result<(ResumeDocument, bool)> {
        match self.load(&report.handle)? {
            Some(doc) => Ok((doc, false)),
            None => {
                info!(handle = %report.handle, "seeding resume from scan");
                Ok((ResumeDocument::seed(report, locale, today), true))
            }
        }
    }

    pub fn discard(&self, handle: &str) -> Result<()> {
        self.store.remove(&Self::key(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!("birthYear".parse::<ResumeField>().unwrap(), ResumeField::BirthYear);
        assert_eq!("birth-year".parse::<ResumeField>().unwrap(), ResumeField::BirthYear);
        assert_eq!("contact_email".parse::<ResumeField>().unwrap(), ResumeField::ContactEmail);
        assert!("salary".parse::<ResumeField>().is_err());
    }

    #[test]
    fn test_row_editing() {
        let mut doc = ResumeDocument::default();
        let row = ResumeSection::Experience
            .row_from_values(&["2020".into(), "4".into(), "Joined Acme".into()])
            .unwrap();
        doc.add_row(ResumeSection::Experience, row).unwrap();
        assert_eq!(doc.custom_experiences[0].content, "Joined Acme");

        let skill = ResumeSection::Skill
            .row_from_values(&["Cloud".into(), "AWS".into()])
            .unwrap();
        assert!(doc.add_row(ResumeSection::Experience, skill.clone()).is_err());
        doc.add_row(ResumeSection::Skill, skill).unwrap();

        let replacement = ResumeRow::Skill(SkillEntry {
            category: "Cloud".into(),
            content: "AWS, GCP".into(),
        });
        doc.put_row(ResumeSection::Skill, Some(0), replacement).unwrap();
        assert_eq!(doc.custom_skills[0].content, "AWS, GCP");

        assert!(doc.remove_row(ResumeSection::Skill, 3).is_err());
        doc.remove_row(ResumeSection::Skill, 0).unwrap();
        assert_eq!(doc.row_count(ResumeSection::Skill), 0);

        assert!(ResumeSection::Skill.row_from_values(&["only".into()]).is_err());
    }

    #[test]
    fn test_photo_validation() {
        let mut doc = ResumeDocument::default();
        assert!(doc.set_photo("https://example.com/me.png").is_err());
        assert!(doc.set_photo("data:image/png,rawbytes").is_err());

        doc.set_photo("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert!(doc.photo_data.is_some());

        let oversized = format!("data:image/jpeg;base64,{}", "A".repeat(MAX_PHOTO_BYTES / 3 * 4 + 8));
        assert!(doc.set_photo(&oversized).is_err());

        let garbage = "data:image/png;base64,!!!not base64 at all ###";
        match doc.set_photo(garbage) {
            Err(ScouterError::InvalidInput(message)) => assert!(message.contains("base64")),
            other => panic!("Expected InvalidInput error, got: {:?}", other),
        }
        // previous photo kept after a rejected one
        assert!(doc.photo_data.as_deref().unwrap().starts_with("data:image/png"));

        doc.remove_photo();
        assert!(doc.photo_data.is_none());
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let mut doc = ResumeDocument::default();
        doc.set(ResumeField::ContactPostalCode, "100-0001");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["contactPostalCode"], "100-0001");
        assert!(json.get("customGithubExperiences").is_some());
        assert!(json["photoData"].is_null());
    }

    #[test]
    fn test_dates_per_locale() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Locale::Ja.resume_date(today), "2024年6月1日現在");
        assert_eq!(Locale::En.resume_date(today), "As of June 1, 2024");
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
    }
}
