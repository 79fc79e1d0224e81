use power_scouter::store::FileStore;

// Kept in its own test binary: it mutates the process environment.
#[test]
fn test_default_path_without_home() {
    std::env::remove_var("HOME");

    let path = FileStore::default_path().expect("config dir should resolve without HOME");

    assert!(path.ends_with("power-scouter/store.json"), "got {}", path.display());
}
