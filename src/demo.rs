//! Scripted walkthroughs of the store, one per aggregate shape.
//!
//! Each returns the result of `find_all` after every step so callers can
//! print or inspect the history.

use std::fmt;

use chrono::Utc;
use serde::Serialize;

use crate::convert::Period;
use crate::db::Database;
use crate::error::Result;
use crate::models::{AgeGroup, Category, LegoSet, Manual};

const AUTHOR: &str = "Jens Schauder";

/// State of a repository after one step.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<T> {
    pub title: String,
    pub items: Vec<T>,
}

impl<T> Snapshot<T> {
    fn new(title: &str, items: Vec<T>) -> Self {
        Self {
            title: title.to_string(),
            items,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== {}", self.title)?;
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

/// Everything currently stored, one snapshot per repository.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub lego_sets: Snapshot<LegoSet>,
    pub categories: Snapshot<Category>,
}

pub fn listing(db: &Database) -> Result<Listing> {
    Ok(Listing {
        lego_sets: Snapshot::new("LegoSets", db.find_all_lego_sets()?),
        categories: Snapshot::new("Categories", db.find_all_categories()?),
    })
}

/// Builds a set with a manual, edits the manual in place, then swaps it for
/// a new one.
pub fn lego_sets(db: &Database) -> Result<Vec<Snapshot<LegoSet>>> {
    let mut small_car = LegoSet::new("Small Car 01");
    small_car.minimum_age = Some(Period::of_years(5));
    small_car.maximum_age = Some(Period::of_years(12));
    small_car.manual = Some(Manual::new(
        AUTHOR,
        "Just put all the pieces together in the right order",
    ));

    let mut snapshots = Vec::new();

    db.save_lego_set(&mut small_car)?;
    tracing::info!("Saved LegoSet {}", small_car.id);
    snapshots.push(Snapshot::new("Original LegoSet", db.find_all_lego_sets()?));

    if let Some(manual) = small_car.manual.as_mut() {
        manual.text = "Just make it so it looks like a car.".to_string();
    }
    db.save_lego_set(&mut small_car)?;
    snapshots.push(Snapshot::new("Updated", db.find_all_lego_sets()?));

    small_car.manual = Some(Manual::new(AUTHOR, "One last attempt: Just build a car! Ok?"));
    db.id_assigner().propagate(&mut small_car);
    db.save_lego_set(&mut small_car)?;
    snapshots.push(Snapshot::new("Manual replaced", db.find_all_lego_sets()?));

    Ok(snapshots)
}

/// Saves two categories with age groups, describes one and deletes the other.
pub fn categories(db: &Database) -> Result<Vec<Snapshot<Category>>> {
    let mut saved = vec![
        category(
            "Cars",
            Some("Anything that has approximately 4 wheels"),
            Some(AgeGroup::ThreeToEight),
        ),
        category("Buildings", None, Some(AgeGroup::TwelveAndOlder)),
    ];
    saved[0].created = Some(Utc::now().date_naive());
    run_category_script(db, saved)
}

/// Same flow as [`categories`] for a store built without timestamping.
pub fn single_class(db: &Database) -> Result<Vec<Snapshot<Category>>> {
    let saved = vec![
        category("Cars", Some("Anything that has approximately 4 wheels"), None),
        category("Buildings", None, None),
    ];
    run_category_script(db, saved)
}

fn run_category_script(db: &Database, mut saved: Vec<Category>) -> Result<Vec<Snapshot<Category>>> {
    let mut snapshots = Vec::new();

    db.save_categories(&mut saved)?;
    tracing::info!(
        "'{}' got id {:?}",
        saved[1].name,
        saved[1].id
    );
    snapshots.push(Snapshot::new(
        "`Cars` and `Buildings` got saved",
        db.find_all_categories()?,
    ));

    saved[1].description =
        Some("Famous and impressive buildings incl. the 'bike shed'.".to_string());
    db.save_category(&mut saved[1])?;
    snapshots.push(Snapshot::new(
        "`Buildings` has a description",
        db.find_all_categories()?,
    ));

    db.delete_category(&saved[0])?;
    snapshots.push(Snapshot::new("`Cars` is gone.", db.find_all_categories()?));

    Ok(snapshots)
}

fn category(name: &str, description: Option<&str>, age_group: Option<AgeGroup>) -> Category {
    Category {
        description: description.map(str::to_string),
        age_group,
        ..Category::new(name)
    }
}
