// ==========================================
// CSV directory source end-to-end
// ==========================================
// Config file → csv_dir source → pipeline → SQLite file
// ==========================================


use roster_import::config::{ImportConfig, SourceKind};
use roster_import::domain::EntityKind;
use roster_import::importer::{inspect_source, open_source, ImportPipeline};
use roster_import::repository::RecordStore;
use std::fs;
use tempfile::tempdir;
use test_helpers::{count, query_text, write_roster_csv};

const CONFIG: &str = r#"
[database]
path = "out/roster.db"

[source]
kind = "csv_dir"
path = "sheets"

[columns.leaders]
phone = "telefono"
"#;

#[test]
fn test_csv_directory_with_column_override() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sheets")).unwrap();
    fs::create_dir_all(dir.path().join("out")).unwrap();
    write_roster_csv(&dir.path().join("sheets"), &[("Jefes", "celular", "telefono")]).unwrap();

    let config_path = dir.path().join("roster_import.toml");
    fs::write(&config_path, CONFIG).unwrap();

    let config = ImportConfig::load(&config_path).unwrap();
    assert_eq!(config.source.kind, SourceKind::CsvDir);
    assert_eq!(config.source.path, dir.path().join("sheets"));

    let store = RecordStore::open(&config.database.path).unwrap();
    store.build_schema().unwrap();

    let mut source = open_source(&config.source).unwrap();
    let report = ImportPipeline::new(&store, &config)
        .run(source.as_mut())
        .unwrap();

    assert_eq!(
        query_text(&store, "SELECT phone FROM leader WHERE name = 'Ana'"),
        Some("70000001".to_string())
    );
    assert_eq!(count(&store, EntityKind::PollingPlace), 3);
    assert_eq!(count(&store, EntityKind::TallySheet), 3);

    // third data line of Operadores.csv is line 4 of the file
    let operators = report.entity(EntityKind::Operator).unwrap();
    assert_eq!(operators.skipped, 1);
    assert_eq!(operators.issues[0].row_number, 4);

    // quoted cell "AB123, CD456" survives as a single field
    let tally = report.entity(EntityKind::TallySheet).unwrap();
    assert_eq!(tally.rows_read, 2);
    assert_eq!(tally.inserted, 3);
}

#[test]
fn test_csv_directory_missing_file_is_reported() {
    let dir = tempdir().unwrap();
    write_roster_csv(dir.path(), &[]).unwrap();
    fs::remove_file(dir.path().join("Cuentas.csv")).unwrap();

    let mut config = ImportConfig::default();
    config.source.kind = SourceKind::CsvDir;
    config.source.path = dir.path().to_path_buf();

    let store = RecordStore::open_in_memory().unwrap();
    store.build_schema().unwrap();

    let mut source = open_source(&config.source).unwrap();
    let err = ImportPipeline::new(&store, &config)
        .run(source.as_mut())
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("Cuentas"));
    assert_eq!(count(&store, EntityKind::Department), 0);
}

#[test]
fn test_inspect_csv_directory_without_writing() {
    let dir = tempdir().unwrap();
    write_roster_csv(dir.path(), &[("Jefes", "celular", "telefono")]).unwrap();
    fs::remove_file(dir.path().join("Actas.csv")).unwrap();

    let mut config = ImportConfig::default();
    config.source.kind = SourceKind::CsvDir;
    config.source.path = dir.path().to_path_buf();

    let mut source = open_source(&config.source).unwrap();
    let inspection = inspect_source(source.as_mut(), &config).unwrap();

    assert!(!inspection.is_ready());
    assert!(!inspection.entity(EntityKind::TallySheet).unwrap().present);

    let leaders = inspection.entity(EntityKind::Leader).unwrap();
    assert!(leaders.present);
    assert_eq!(leaders.rows, 1);
    assert_eq!(leaders.headers, vec!["nombre", "cargo", "telefono"]);
    assert_eq!(leaders.missing_columns, vec!["celular"]);

    let places = inspection.entity(EntityKind::PollingPlace).unwrap();
    assert!(places.is_ready());
    assert_eq!(places.rows, 3);
}
