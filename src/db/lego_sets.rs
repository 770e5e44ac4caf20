use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row, Transaction};

use super::sql::{quote, Mapping};
use super::Database;
use crate::convert;
use crate::error::{Result, StoreError};
use crate::events::Aggregate;
use crate::models::{LegoSet, Manual, Persistent};

/// Resolved names for the set aggregate.
struct SetTables {
    sets: Mapping,
    manuals: Mapping,
    back_reference: String,
}

impl Database {
    fn set_tables(&self) -> SetTables {
        SetTables {
            sets: Mapping::of::<LegoSet>(&self.naming),
            manuals: Mapping::of::<Manual>(&self.naming),
            back_reference: self.naming.back_reference_column(LegoSet::TYPE_NAME),
        }
    }

    // ============================================================
    // LegoSet aggregate operations
    // ============================================================

    /// Saves the set and replaces its manual row.
    ///
    /// A new set gets its id from the pre-save hooks and is inserted; a
    /// persisted one is updated by id. Any existing manual row is deleted and
    /// the current manual, if any, inserted under the set's id. All of it runs
    /// in one transaction. If a new set fails to save, its id is reset to 0.
    pub fn save_lego_set(&self, set: &mut LegoSet) -> Result<()> {
        let is_new = set.is_new();
        self.interceptors
            .run(&mut Aggregate::LegoSet(&mut *set), &self.ids);
        if set.is_new() {
            return Err(StoreError::MissingId {
                entity: LegoSet::TYPE_NAME,
            });
        }

        let result = self.write_lego_set(set, is_new);
        match &result {
            Ok(()) => tracing::debug!(
                entity = LegoSet::TYPE_NAME,
                id = set.id,
                inserted = is_new,
                has_manual = set.manual.is_some(),
                "after save"
            ),
            Err(e) => {
                tracing::warn!(entity = LegoSet::TYPE_NAME, id = set.id, "save failed: {}", e);
                if is_new {
                    set.id = 0;
                }
            }
        }
        result
    }

    fn write_lego_set(&self, set: &LegoSet, is_new: bool) -> Result<()> {
        let tables = self.set_tables();
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let values = set.values();
        if is_new {
            let columns: Vec<&str> = tables.sets.columns.iter().map(String::as_str).collect();
            tx.execute(&tables.sets.insert(&columns), params_from_iter(values))?;
        } else {
            let mut params = values[1..].to_vec();
            params.push(Value::Integer(set.id));
            let rows = tx.execute(&tables.sets.update(), params_from_iter(params))?;
            if rows == 0 {
                return Err(StoreError::Stale {
                    entity: LegoSet::TYPE_NAME,
                    id: set.id,
                });
            }
        }

        replace_manual(&tx, &tables, set.id, set.manual.as_ref())?;
        tx.commit()?;
        Ok(())
    }

    pub fn find_all_lego_sets(&self) -> Result<Vec<LegoSet>> {
        let tables = self.set_tables();
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&select_sets(&tables, None))?;

        let mut rows = stmt.query([])?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next()? {
            sets.push(read_lego_set(row)?);
        }
        Ok(sets)
    }

    pub fn find_lego_set(&self, id: i64) -> Result<Option<LegoSet>> {
        let tables = self.set_tables();
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&select_sets(&tables, Some(tables.sets.id_column())))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_lego_set(row)?)),
            None => Ok(None),
        }
    }

    pub fn count_lego_sets(&self) -> Result<i64> {
        let tables = self.set_tables();
        let conn = self.conn.lock().expect("database lock poisoned");
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(&tables.sets.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Deletes the manual row and then the set. Returns whether the set
    /// existed; deleting an unknown id is a no-op.
    pub fn delete_lego_set(&self, set: &LegoSet) -> Result<bool> {
        self.delete_lego_set_by_id(set.id)
    }

    pub fn delete_lego_set_by_id(&self, id: i64) -> Result<bool> {
        let tables = self.set_tables();
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        tracing::debug!(entity = LegoSet::TYPE_NAME, id, "before delete");
        tx.execute(&tables.manuals.delete_where(&tables.back_reference), [id])?;
        let rows = tx.execute(&tables.sets.delete_where(tables.sets.id_column()), [id])?;
        tx.commit()?;
        tracing::debug!(entity = LegoSet::TYPE_NAME, id, deleted = (rows > 0), "after delete");

        Ok(rows > 0)
    }
}

/// Deletes whatever manual row belongs to `set_id` and inserts `manual` in its
/// place. Unchanged manuals are rewritten too.
fn replace_manual(
    tx: &Transaction<'_>,
    tables: &SetTables,
    set_id: i64,
    manual: Option<&Manual>,
) -> Result<()> {
    let removed = tx.execute(
        &tables.manuals.delete_where(&tables.back_reference),
        [set_id],
    )?;

    let Some(manual) = manual else {
        if removed > 0 {
            tracing::debug!(set_id, "manual removed");
        }
        return Ok(());
    };

    let mut columns: Vec<&str> = tables.manuals.columns.iter().map(String::as_str).collect();
    let mut values = manual.values();
    values[0] = Value::Integer(set_id);
    if !columns.contains(&tables.back_reference.as_str()) {
        columns.push(&tables.back_reference);
        values.push(Value::Integer(set_id));
    }
    tx.execute(&tables.manuals.insert(&columns), params_from_iter(values))?;
    Ok(())
}

/// Sets joined with their manual, optionally filtered by a set column.
fn select_sets(tables: &SetTables, filter: Option<&str>) -> String {
    let mut sql = format!(
        "SELECT {}, {} FROM {} s LEFT JOIN {} m ON m.{} = s.{}",
        tables.sets.select_list("s"),
        tables.manuals.select_list("m"),
        quote(&tables.sets.table),
        quote(&tables.manuals.table),
        quote(&tables.back_reference),
        quote(tables.sets.id_column()),
    );
    if let Some(column) = filter {
        sql.push_str(&format!(" WHERE s.{} = ?", quote(column)));
    }
    sql.push_str(&format!(" ORDER BY s.{}", quote(tables.sets.id_column())));
    sql
}

/// Columns 0..4 are the set, 4..7 the manual (all NULL without one).
fn read_lego_set(row: &Row<'_>) -> Result<LegoSet> {
    let manual = match row.get::<_, Option<i64>>(4)? {
        Some(id) => Some(Manual {
            id,
            author: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            text: convert::to_text(row.get_ref(6)?)?,
        }),
        None => None,
    };

    Ok(LegoSet {
        id: row.get(0)?,
        name: row.get(1)?,
        minimum_age: Some(convert::from_years(row.get(2)?)),
        maximum_age: Some(convert::from_years(row.get(3)?)),
        manual,
    })
}
