mod common;

use chrono::NaiveDate;
use common::*;
use power_scouter::resume::{
    render_text, DatedEntry, Locale, ResumeBook, ResumeDocument, ResumeField, ResumeRow,
    ResumeSection,
};
use power_scouter::store::{clear_token, load_token, save_token, FileStore, KeyValueStore};
use power_scouter::{ScanReport, ScanStage, Scanner};
use tempfile::TempDir;

fn scanned_report() -> ScanReport {
    let scanner = Scanner::new(small_account(FakeApi::anonymous(), "octo")).at(now());
    tokio_test::block_on(scanner.scan("octo", &|_: ScanStage| {})).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn test_token_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = FileStore::open(&path).unwrap();
    save_token(&store, "github_pat_11ABCDEF").unwrap();
    drop(store);

    let reopened = FileStore::open(&path).unwrap();
    let credential = load_token(&reopened).unwrap().expect("token should persist");
    assert_eq!(credential.secret(), "github_pat_11ABCDEF");

    clear_token(&reopened).unwrap();
    let reopened = FileStore::open(&path).unwrap();
    assert!(load_token(&reopened).unwrap().is_none());
}

#[test]
fn test_writes_leave_only_the_store_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let store = FileStore::open(&path).unwrap();

    for i in 0..5 {
        store.set(&format!("key-{}", i), "value").unwrap();
    }
    store.remove("key-0").unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["store.json".to_string()]);

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("key-4").unwrap().as_deref(), Some("value"));
    assert_eq!(reopened.get("key-0").unwrap(), None);
}

#[test]
fn test_default_path_is_under_config_dir() {
    let path = FileStore::default_path().unwrap();
    assert!(path.ends_with("power-scouter/store.json"));
    assert!(path.starts_with(dirs::config_dir().unwrap()));
}

#[test]
fn test_corrupt_store_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json at all").unwrap();

    let error = FileStore::open(&path).unwrap_err();
    assert!(error.to_string().contains("not a valid store"));
}

#[test]
fn test_resume_round_trip_through_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let report = scanned_report();

    let store = FileStore::open(&path).unwrap();
    let book = ResumeBook::new(&store);
    let (mut doc, seeded) = book.load_or_seed(&report, Locale::Ja, today()).unwrap();
    assert!(seeded);
    assert_eq!(doc.name, "octo");
    assert_eq!(doc.resume_date, "2024年6月1日現在");
    assert!(!doc.custom_skills.is_empty());

    doc.set(ResumeField::Email, "octo@example.com");
    doc.set(ResumeField::BirthYear, "1990");
    doc.add_row(
        ResumeSection::Experience,
        ResumeRow::Dated(DatedEntry {
            year: "2020".to_string(),
            month: "4".to_string(),
            content: "Joined Example Corp".to_string(),
        }),
    )
    .unwrap();
    doc.set_photo("data:image/png;base64,iVBORw0KGgo=").unwrap();
    book.save(&report.handle, &doc).unwrap();

    let reopened = FileStore::open(&path).unwrap();
    let book = ResumeBook::new(&reopened);
    let (loaded, seeded) = book.load_or_seed(&report, Locale::Ja, today()).unwrap();
    assert!(!seeded);
    assert_eq!(loaded, doc);

    let text = render_text(&loaded, Locale::Ja);
    assert!(text.contains("Joined Example Corp"));
    assert!(text.contains("octo@example.com"));
}

#[test]
fn test_saved_resume_uses_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("store.json")).unwrap();
    let book = ResumeBook::new(&store);

    let mut doc = ResumeDocument::default();
    doc.set(ResumeField::ContactEmail, "c@example.com");
    book.save("octo", &doc).unwrap();

    let raw = store.get(&ResumeBook::<&FileStore>::key("octo")).unwrap().unwrap();
    assert!(raw.contains("\"contactEmail\":\"c@example.com\""));
    assert!(raw.contains("\"customGithubExperiences\""));
}

#[test]
fn test_discard_forgets_resume() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("store.json")).unwrap();
    let book = ResumeBook::new(&store);

    book.save("octo", &ResumeDocument::default()).unwrap();
    assert!(book.load("octo").unwrap().is_some());

    book.discard("octo").unwrap();
    assert!(book.load("octo").unwrap().is_none());
    // other handles are separate documents
    assert!(book.load("someone-else").unwrap().is_none());
}

#[test]
fn test_english_seed() {
    let report = scanned_report();
    let doc = ResumeDocument::seed(&report, Locale::En, today());

    assert_eq!(doc.resume_date, "As of June 1, 2024");
    let text = render_text(&doc, Locale::En);
    assert!(text.contains("octo"));
}
