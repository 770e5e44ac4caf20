use anyhow::{Context, Result};
use rusqlite::Connection;

use super::sql::{quote, Mapping};
use crate::models::{Category, LegoSet, Manual, Persistent};
use crate::naming::NamingStrategy;

/// A schema change. DDL is rendered from the naming strategy so table and
/// column names always match what statements resolve to.
struct Migration {
    version: &'static str,
    name: &'static str,
    sql: fn(&NamingStrategy) -> String,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "lego_sets",
        sql: lego_sets_ddl,
    },
    Migration {
        version: "002",
        name: "categories",
        sql: categories_ddl,
    },
];

fn lego_sets_ddl(naming: &NamingStrategy) -> String {
    let sets = Mapping::of::<LegoSet>(naming);
    let manuals = Mapping::of::<Manual>(naming);
    let back_reference = naming.back_reference_column(LegoSet::TYPE_NAME);
    let references = format!("REFERENCES {} ({})", quote(&sets.table), quote(sets.id_column()));

    let mut manual_columns = vec![format!("{} INTEGER PRIMARY KEY", quote(manuals.id_column()))];
    if back_reference == manuals.id_column() {
        manual_columns[0].push(' ');
        manual_columns[0].push_str(&references);
    } else {
        manual_columns.push(format!(
            "{} INTEGER NOT NULL UNIQUE {}",
            quote(&back_reference),
            references
        ));
    }
    manual_columns.push(format!("{} TEXT", quote(&manuals.columns[1])));
    manual_columns.push(format!("{} CLOB", quote(&manuals.columns[2])));

    format!(
        "CREATE TABLE {} (
            {} INTEGER PRIMARY KEY,
            {} TEXT NOT NULL,
            {} INTEGER NOT NULL DEFAULT 0,
            {} INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE {} (
            {}
        );",
        quote(&sets.table),
        quote(&sets.columns[0]),
        quote(&sets.columns[1]),
        quote(&sets.columns[2]),
        quote(&sets.columns[3]),
        quote(&manuals.table),
        manual_columns.join(",\n            "),
    )
}

fn categories_ddl(naming: &NamingStrategy) -> String {
    let categories = Mapping::of::<Category>(naming);
    let c = |i: usize| quote(&categories.columns[i]);
    format!(
        "CREATE TABLE {} (
            {} INTEGER PRIMARY KEY AUTOINCREMENT,
            {} TEXT NOT NULL,
            {} TEXT,
            {} TEXT,
            {} INTEGER NOT NULL DEFAULT 0,
            {} TEXT
        );",
        quote(&categories.table),
        c(0),
        c(1),
        c(2),
        c(3),
        c(4),
        c(5),
    )
}

pub fn run_migrations(conn: &Connection, naming: &NamingStrategy) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if !applied.iter().any(|v| v == migration.version) {
            apply_migration(conn, migration, naming)?;
        }
    }

    Ok(())
}

fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn apply_migration(conn: &Connection, migration: &Migration, naming: &NamingStrategy) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&(migration.sql)(naming))
        .with_context(|| {
            format!(
                "Failed to apply migration {}: {}",
                migration.version, migration.name
            )
        })?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (migration.version, migration.name, chrono::Utc::now().to_rfc3339()),
    )?;
    tx.commit()?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::naming::DefaultNaming;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |row| row.get::<_, i32>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &NamingStrategy::from(&NamingConfig::default())).unwrap();

        assert!(table_exists(&conn, "LegoSet"));
        assert!(table_exists(&conn, "Handbuch"));
        assert!(table_exists(&conn, "Category"));
        assert_eq!(get_applied_migrations(&conn).unwrap(), vec!["001", "002"]);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let naming = NamingStrategy::from(&NamingConfig::default());
        run_migrations(&conn, &naming).unwrap();
        run_migrations(&conn, &naming).unwrap();

        assert_eq!(get_applied_migrations(&conn).unwrap(), vec!["001", "002"]);
    }

    #[test]
    fn test_shared_key_column_is_both_id_and_back_reference() {
        let naming = NamingStrategy::from(&NamingConfig::default());
        let ddl = lego_sets_ddl(&naming);
        assert!(ddl.contains(r#""Handbuch_id" INTEGER PRIMARY KEY REFERENCES "LegoSet" ("id")"#));
        assert!(ddl.contains(r#""maxAge" INTEGER"#));
    }

    #[test]
    fn test_separate_back_reference_column() {
        let naming = NamingStrategy::new(DefaultNaming::SnakeCase);
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &naming).unwrap();

        assert!(table_exists(&conn, "lego_set"));
        assert!(table_exists(&conn, "manual"));
        let ddl = lego_sets_ddl(&naming);
        assert!(ddl.contains(r#""lego_set" INTEGER NOT NULL UNIQUE REFERENCES "lego_set" ("id")"#));
    }
}
