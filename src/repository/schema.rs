// ==========================================
// Roster import - schema
// ==========================================
// Tables, uniqueness/foreign-key constraints and the denormalized
// read views. CREATE ... IF NOT EXISTS only: running it twice is safe.
// ==========================================

use crate::db::CURRENT_SCHEMA_VERSION;
use crate::domain::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use tracing::{debug, info};

const TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- organization
CREATE TABLE IF NOT EXISTS leader (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    title TEXT,
    phone TEXT
);

CREATE TABLE IF NOT EXISTS coordinator (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    national_id TEXT NOT NULL UNIQUE,
    issued_in TEXT,
    phone TEXT,
    email TEXT,
    title TEXT,
    leader_id INTEGER NOT NULL,
    FOREIGN KEY (leader_id) REFERENCES leader(id)
);

CREATE TABLE IF NOT EXISTS work_group (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    coordinator_id INTEGER NOT NULL,
    FOREIGN KEY (coordinator_id) REFERENCES coordinator(id)
);

-- geography
CREATE TABLE IF NOT EXISTS department (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS province (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    department_id INTEGER NOT NULL,
    is_urban INTEGER NOT NULL DEFAULT 0,
    UNIQUE (department_id, name),
    FOREIGN KEY (department_id) REFERENCES department(id)
);

CREATE TABLE IF NOT EXISTS municipality (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    province_id INTEGER NOT NULL,
    UNIQUE (province_id, name),
    FOREIGN KEY (province_id) REFERENCES province(id)
);

CREATE TABLE IF NOT EXISTS electoral_seat (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    municipality_id INTEGER NOT NULL,
    UNIQUE (municipality_id, name),
    FOREIGN KEY (municipality_id) REFERENCES municipality(id)
);

-- place names repeat across seats: identity is (seat, name)
CREATE TABLE IF NOT EXISTS polling_place (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT,
    district INTEGER NOT NULL DEFAULT 0,
    electoral_seat_id INTEGER NOT NULL,
    UNIQUE (electoral_seat_id, name),
    FOREIGN KEY (electoral_seat_id) REFERENCES electoral_seat(id)
);

-- people
CREATE TABLE IF NOT EXISTS operator (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    national_id TEXT NOT NULL UNIQUE,
    issued_in TEXT,
    phone TEXT,
    email TEXT,
    title TEXT,
    polling_place_id INTEGER NOT NULL,
    work_group_id INTEGER NOT NULL,
    FOREIGN KEY (polling_place_id) REFERENCES polling_place(id),
    FOREIGN KEY (work_group_id) REFERENCES work_group(id)
);

CREATE TABLE IF NOT EXISTS notary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    national_id TEXT NOT NULL UNIQUE,
    issued_in TEXT,
    phone TEXT,
    email TEXT,
    title TEXT,
    polling_place_id INTEGER NOT NULL,
    FOREIGN KEY (polling_place_id) REFERENCES polling_place(id)
);

CREATE TABLE IF NOT EXISTS tally_sheet (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    polling_place_id INTEGER NOT NULL,
    FOREIGN KEY (polling_place_id) REFERENCES polling_place(id)
);

CREATE TABLE IF NOT EXISTS account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    operator_id INTEGER NOT NULL UNIQUE,
    FOREIGN KEY (operator_id) REFERENCES operator(id)
);

CREATE INDEX IF NOT EXISTS idx_polling_place_name ON polling_place(name);
CREATE INDEX IF NOT EXISTS idx_tally_sheet_place ON tally_sheet(polling_place_id);
"#;

const VIEWS_SQL: &str = r#"
CREATE VIEW IF NOT EXISTS v_polling_place_full AS
SELECT
    pp.id,
    pp.name,
    pp.address,
    pp.district,
    s.name AS electoral_seat,
    m.name AS municipality,
    p.name AS province,
    d.name AS department,
    CASE WHEN p.is_urban = 1 THEN 'urban' ELSE 'rural' END AS area_type,
    p.name || ' - ' || s.name || ' - ' || pp.name AS full_name
FROM polling_place pp
JOIN electoral_seat s ON pp.electoral_seat_id = s.id
JOIN municipality m ON s.municipality_id = m.id
JOIN province p ON m.province_id = p.id
JOIN department d ON p.department_id = d.id;

CREATE VIEW IF NOT EXISTS v_operator_full AS
SELECT
    o.id,
    o.name,
    o.national_id,
    o.phone,
    o.email,
    g.name AS work_group,
    c.name AS coordinator,
    l.name AS leader,
    pp.name AS polling_place,
    pp.address AS polling_place_address,
    s.name AS electoral_seat,
    m.name AS municipality,
    p.name AS province,
    d.name AS department,
    CASE WHEN p.is_urban = 1 THEN 'urban' ELSE 'rural' END AS area_type
FROM operator o
LEFT JOIN work_group g ON o.work_group_id = g.id
LEFT JOIN coordinator c ON g.coordinator_id = c.id
LEFT JOIN leader l ON c.leader_id = l.id
LEFT JOIN polling_place pp ON o.polling_place_id = pp.id
LEFT JOIN electoral_seat s ON pp.electoral_seat_id = s.id
LEFT JOIN municipality m ON s.municipality_id = m.id
LEFT JOIN province p ON m.province_id = p.id
LEFT JOIN department d ON p.department_id = d.id;

CREATE VIEW IF NOT EXISTS v_notary_full AS
SELECT
    n.id,
    n.name,
    n.national_id,
    n.phone,
    n.email,
    pp.name AS polling_place,
    s.name AS electoral_seat,
    m.name AS municipality,
    p.name AS province,
    d.name AS department,
    CASE WHEN p.is_urban = 1 THEN 'urban' ELSE 'rural' END AS area_type
FROM notary n
LEFT JOIN polling_place pp ON n.polling_place_id = pp.id
LEFT JOIN electoral_seat s ON pp.electoral_seat_id = s.id
LEFT JOIN municipality m ON s.municipality_id = m.id
LEFT JOIN province p ON m.province_id = p.id
LEFT JOIN department d ON p.department_id = d.id;
"#;

/// Create every table and view (idempotent) and stamp schema_version
pub fn build_schema(conn: &Connection) -> RepositoryResult<()> {
    conn.execute_batch(TABLES_SQL)?;
    debug!("tables ready");
    conn.execute_batch(VIEWS_SQL)?;
    debug!("views ready");
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    info!(version = CURRENT_SCHEMA_VERSION, "schema ready");
    Ok(())
}

/// Tables required by the importer that do not exist yet
pub fn missing_tables(conn: &Connection) -> RepositoryResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
    )?;
    let mut missing = Vec::new();
    for kind in EntityKind::ALL {
        if !stmt.exists(params![kind.table_name()])? {
            missing.push(kind.table_name().to_string());
        }
    }
    Ok(missing)
}

/// Fail with `SchemaMissing` unless every table exists
pub fn ensure_schema(conn: &Connection) -> RepositoryResult<()> {
    let tables = missing_tables(conn)?;
    if tables.is_empty() {
        Ok(())
    } else {
        Err(RepositoryError::SchemaMissing { tables })
    }
}
