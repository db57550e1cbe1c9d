// ==========================================
// Import pipeline integration tests
// ==========================================
// Full roster through every converter on a file-backed store
// ==========================================


use roster_import::config::ImportConfig;
use roster_import::domain::EntityKind;
use roster_import::importer::{ImportError, ImportPipeline, MemorySource, SheetSource, SourceError};
use roster_import::logging;
use roster_import::repository::{RepositoryError, StatsRepository};
use test_helpers::{
    count, create_empty_db, create_test_db, query_text, roster_fixture, roster_source, sheet, snapshot,
};

#[test]
fn test_full_roster_import() {
    logging::init_test();
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();
    let mut source = roster_source();

    let report = ImportPipeline::new(&store, &config).run(&mut source).unwrap();

    assert_eq!(report.entities.len(), EntityKind::ALL.len());
    assert!(report.finished_at.is_some());

    let expected = [
        (EntityKind::Leader, 1),
        (EntityKind::Coordinator, 1),
        (EntityKind::Group, 1),
        (EntityKind::Department, 2),
        (EntityKind::Province, 2),
        (EntityKind::Municipality, 2),
        (EntityKind::ElectoralSeat, 3),
        (EntityKind::PollingPlace, 3),
        (EntityKind::Operator, 2),
        (EntityKind::Notary, 1),
        (EntityKind::TallySheet, 3),
        (EntityKind::Account, 1),
    ];
    for (kind, rows) in expected {
        assert_eq!(count(&store, kind), rows, "{}", kind);
    }

    let groups = report.entity(EntityKind::Group).unwrap();
    assert_eq!(groups.skipped, 1);
    assert_eq!(groups.issues[0].message, "coordinator '999' not found");

    let operators = report.entity(EntityKind::Operator).unwrap();
    assert_eq!(operators.inserted, 2);
    assert_eq!(operators.skipped, 1);

    let tally = report.entity(EntityKind::TallySheet).unwrap();
    assert_eq!(tally.inserted, 3);
    assert_eq!(tally.dropped, 1);

    let totals = report.totals();
    assert_eq!(totals.skipped, 2);
    assert_eq!(totals.errors, 0);
}

#[test]
fn test_rerun_converges() {
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();
    let pipeline = ImportPipeline::new(&store, &config);

    let first = pipeline.run(&mut roster_source()).unwrap();
    let counts_after_first = store.table_counts().unwrap();
    let contents_after_first = snapshot(&store);

    let second = pipeline.run(&mut roster_source()).unwrap();
    let counts_after_second = store.table_counts().unwrap();
    let contents_after_second = snapshot(&store);

    assert_eq!(counts_after_first, counts_after_second);
    // tally sheets joined to their place and seat
    assert_eq!(contents_after_first[3].1.len(), 3);
    for ((sql, before), (_, after)) in contents_after_first.iter().zip(&contents_after_second) {
        assert_eq!(before, after, "{}", sql);
    }
    assert_eq!(second.totals().inserted, 0);
    assert_eq!(second.totals().updated, first.totals().inserted);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_same_place_name_binds_to_the_right_seat() {
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();
    ImportPipeline::new(&store, &config)
        .run(&mut roster_source())
        .unwrap();

    assert_eq!(
        query_text(&store, "SELECT electoral_seat FROM v_operator_full WHERE national_id = '555'"),
        Some("B".to_string())
    );
    assert_eq!(
        query_text(&store, "SELECT electoral_seat FROM v_notary_full WHERE national_id = '900'"),
        Some("A".to_string())
    );
    assert_eq!(
        query_text(
            &store,
            "SELECT full_name FROM v_polling_place_full WHERE electoral_seat = 'B'"
        ),
        Some("Murillo - B - Central".to_string())
    );
}

#[test]
fn test_leader_phone_updated_in_place() {
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();
    let pipeline = ImportPipeline::new(&store, &config);
    pipeline.run(&mut roster_source()).unwrap();

    let leader_id_before = query_text(&store, "SELECT CAST(id AS TEXT) FROM leader WHERE name = 'Ana'");

    let mut changed = roster_source().with_sheet(
        "Jefes",
        sheet(&["nombre", "cargo", "celular"], &[&["Ana", "Jefa de zona", "79999999"]]),
    );
    let report = pipeline.run(&mut changed).unwrap();

    let leaders = report.entity(EntityKind::Leader).unwrap();
    assert_eq!(leaders.updated, 1);
    assert_eq!(leaders.inserted, 0);
    assert_eq!(
        query_text(&store, "SELECT phone FROM leader WHERE name = 'Ana'"),
        Some("79999999".to_string())
    );
    assert_eq!(
        query_text(&store, "SELECT CAST(id AS TEXT) FROM leader WHERE name = 'Ana'"),
        leader_id_before
    );
}

#[test]
fn test_missing_sheet_aborts_before_any_write() {
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();

    let mut partial = roster_fixture()
        .into_iter()
        .filter(|(name, _, _)| *name != "Actas")
        .fold(MemorySource::new(), |source, (name, headers, rows)| {
            let data: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
            source.with_sheet(name, sheet(&headers, &data))
        });
    assert!(!partial.has_sheet("Actas").unwrap());

    let err = ImportPipeline::new(&store, &config)
        .run(&mut partial)
        .unwrap_err();

    match &err {
        ImportError::Source(SourceError::SheetMissing { sheet }) => assert_eq!(sheet, "Actas"),
        other => panic!("expected SheetMissing, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
    assert_eq!(count(&store, EntityKind::Leader), 0);
}

#[test]
fn test_import_requires_schema() {
    let (_file, store) = create_empty_db().unwrap();
    let config = ImportConfig::default();

    let err = ImportPipeline::new(&store, &config)
        .run(&mut roster_source())
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Repository(RepositoryError::SchemaMissing { .. })
    ));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_renamed_sheet_from_config() {
    let (_file, store) = create_test_db().unwrap();
    let mut config = ImportConfig::default();
    config.sheets.set(EntityKind::Leader, "Jefes 2025");

    let mut source = roster_source().with_sheet(
        "Jefes 2025",
        sheet(&["nombre", "cargo", "celular"], &[&["Beto", "Jefe", "7001"]]),
    );
    let report = ImportPipeline::new(&store, &config).run(&mut source).unwrap();

    assert_eq!(report.entity(EntityKind::Leader).unwrap().sheet, "Jefes 2025");
    assert_eq!(
        query_text(&store, "SELECT name FROM leader"),
        Some("Beto".to_string())
    );
    // coordinator Carla references leader Ana, absent from the renamed sheet
    assert_eq!(report.entity(EntityKind::Coordinator).unwrap().skipped, 1);
}

#[test]
fn test_stats_after_import() {
    let (_file, store) = create_test_db().unwrap();
    let config = ImportConfig::default();
    ImportPipeline::new(&store, &config)
        .run(&mut roster_source())
        .unwrap();

    let stats = StatsRepository::from_connection(store.connection())
        .collect()
        .unwrap();
    assert_eq!(stats.rows(EntityKind::TallySheet), 3);
    assert_eq!(stats.operators_by_area.urban, 1);
    assert_eq!(stats.operators_by_area.rural, 1);
    assert_eq!(stats.notaries_by_area.urban, 1);
    assert_eq!(stats.notaries_by_area.rural, 0);
}
