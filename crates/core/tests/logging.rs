use lodestar_core::logging::init_logging;

#[test]
fn test_init_logging_writes_to_log_dir_once() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");

    let guard = init_logging("lodestar-test", Some(&logs), false).unwrap();
    tracing::info!("locator ready");
    assert!(init_logging("lodestar-test", Some(&logs), false).is_err());
    drop(guard);

    let names: Vec<String> = std::fs::read_dir(&logs)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("lodestar-test")), "{:?}", names);
}
