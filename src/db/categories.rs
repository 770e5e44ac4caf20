use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use super::sql::{quote, Mapping};
use super::Database;
use crate::error::{Result, StoreError};
use crate::events::Aggregate;
use crate::models::{AgeGroup, Category, Persistent, DATE_FORMAT};

impl Database {
    // ============================================================
    // Category operations
    // ============================================================

    /// Inserts a new category (the database picks the id) or updates an
    /// existing one by id.
    pub fn save_category(&self, category: &mut Category) -> Result<()> {
        self.save_categories(std::slice::from_mut(category))
    }

    /// Saves every category in one transaction. On failure nothing is
    /// written, and ids and timestamps set during the attempt are cleared
    /// again.
    pub fn save_categories(&self, categories: &mut [Category]) -> Result<()> {
        let mapping = Mapping::of::<Category>(&self.naming);
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let mut inserted = Vec::new();
        let mut stamped = Vec::new();
        let mut outcome = Ok(());
        for (index, category) in categories.iter_mut().enumerate() {
            let unstamped = category.inserted == 0;
            self.interceptors
                .run(&mut Aggregate::Category(&mut *category), &self.ids);
            if unstamped && category.inserted != 0 {
                stamped.push(index);
            }
            match write_category(&tx, &mapping, category) {
                Ok(true) => inserted.push(index),
                Ok(false) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        let outcome = outcome.and_then(|()| tx.commit().map_err(StoreError::from));
        if let Err(e) = outcome {
            for index in inserted {
                categories[index].id = None;
            }
            for index in stamped {
                categories[index].inserted = 0;
            }
            return Err(e);
        }

        for category in categories.iter() {
            tracing::debug!(entity = Category::TYPE_NAME, id = category.id, "after save");
        }
        Ok(())
    }

    pub fn find_all_categories(&self) -> Result<Vec<Category>> {
        let mapping = Mapping::of::<Category>(&self.naming);
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} c ORDER BY c.{}",
            mapping.select_list("c"),
            quote(&mapping.table),
            quote(mapping.id_column())
        ))?;

        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(read_category(row, &mapping)?);
        }
        Ok(categories)
    }

    pub fn find_category(&self, id: i64) -> Result<Option<Category>> {
        let mapping = Mapping::of::<Category>(&self.naming);
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} c WHERE c.{} = ?",
            mapping.select_list("c"),
            quote(&mapping.table),
            quote(mapping.id_column())
        ))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_category(row, &mapping)?)),
            None => Ok(None),
        }
    }

    pub fn count_categories(&self) -> Result<i64> {
        let mapping = Mapping::of::<Category>(&self.naming);
        let conn = self.conn.lock().expect("database lock poisoned");
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(&mapping.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Deletes the category. A category that was never saved, or is already
    /// gone, is a no-op.
    pub fn delete_category(&self, category: &Category) -> Result<bool> {
        let Some(id) = category.id else {
            return Ok(false);
        };
        let mapping = Mapping::of::<Category>(&self.naming);
        let conn = self.conn.lock().expect("database lock poisoned");

        tracing::debug!(entity = Category::TYPE_NAME, id, "before delete");
        let rows = conn.execute(&mapping.delete_where(mapping.id_column()), [id])?;
        tracing::debug!(entity = Category::TYPE_NAME, id, deleted = (rows > 0), "after delete");
        Ok(rows > 0)
    }
}

/// Returns `true` when the row was inserted.
fn write_category(conn: &Connection, mapping: &Mapping, category: &mut Category) -> Result<bool> {
    let values = category.values();
    match category.id {
        None => {
            let columns: Vec<&str> = mapping.columns[1..].iter().map(String::as_str).collect();
            conn.execute(&mapping.insert(&columns), params_from_iter(&values[1..]))?;
            category.id = Some(conn.last_insert_rowid());
            Ok(true)
        }
        Some(id) => {
            let mut params = values[1..].to_vec();
            params.push(Value::Integer(id));
            let rows = conn.execute(&mapping.update(), params_from_iter(params))?;
            if rows == 0 {
                return Err(StoreError::Stale {
                    entity: Category::TYPE_NAME,
                    id,
                });
            }
            Ok(false)
        }
    }
}

fn read_category(row: &Row<'_>, mapping: &Mapping) -> Result<Category> {
    let created = row
        .get::<_, Option<String>>(3)?
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| StoreError::InvalidValue {
                column: format!("{}.{}", mapping.table, mapping.columns[3]),
                value: s.clone(),
            })
        })
        .transpose()?;

    let age_group = row
        .get::<_, Option<String>>(5)?
        .map(|s| {
            AgeGroup::from_str(&s).ok_or_else(|| StoreError::InvalidValue {
                column: format!("{}.{}", mapping.table, mapping.columns[5]),
                value: s.clone(),
            })
        })
        .transpose()?;

    Ok(Category {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created,
        inserted: row.get(4)?,
        age_group,
    })
}
