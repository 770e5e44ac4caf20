use aggregate_store::convert::{ConversionError, Period};
use aggregate_store::db::Database;
use aggregate_store::demo;
use aggregate_store::events::{Interceptors, PreSave};
use aggregate_store::models::*;
use aggregate_store::naming::{DefaultNaming, NamingStrategy};
use aggregate_store::StoreError;
use rusqlite::Connection;
use speculate2::speculate;

fn car_with_manual(text: &str) -> LegoSet {
    let mut set = LegoSet::new("Small Car 01");
    set.minimum_age = Some(Period::of_years(5));
    set.maximum_age = Some(Period::of_years(12));
    set.manual = Some(Manual::new("Jens Schauder", text));
    set
}

speculate! {
    before {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("aggregates.db");
    }

    describe "file backed store" {
        it "creates parent directories and persists across reopen" {
            {
                let db = Database::open(path.clone()).expect("Failed to open");
                db.migrate().expect("Failed to migrate");
                let mut set = car_with_manual("v1");
                db.save_lego_set(&mut set).expect("Failed to save");
            }

            let db = Database::open(path.clone()).expect("Failed to reopen");
            db.migrate().expect("Failed to migrate");
            let sets = db.find_all_lego_sets().expect("Query failed");
            assert_eq!(sets.len(), 1);
            assert_eq!(sets[0].manual.as_ref().unwrap().text, "v1");
        }

        it "continues the id sequence after the highest stored id" {
            {
                let db = Database::open(path.clone()).expect("Failed to open");
                db.migrate().expect("Failed to migrate");
                for _ in 0..3 {
                    db.save_lego_set(&mut car_with_manual("v1")).expect("Failed to save");
                }
            }

            let db = Database::open(path.clone()).expect("Failed to reopen");
            db.migrate().expect("Failed to migrate");
            let mut set = car_with_manual("v1");
            db.save_lego_set(&mut set).expect("Failed to save");
            assert_eq!(set.id, 4);
        }

        it "keeps ids unique after reopening with a custom interceptor list" {
            {
                let db = Database::open(path.clone()).expect("Failed to open");
                db.migrate().expect("Failed to migrate");
                db.save_lego_set(&mut car_with_manual("v1")).expect("Failed to save");
            }

            let db = Database::open(path.clone())
                .expect("Failed to reopen")
                .with_interceptors(Interceptors::new(vec![PreSave::AssignIds]));
            db.migrate().expect("Failed to migrate");
            let mut set = car_with_manual("v2");
            db.save_lego_set(&mut set).expect("Failed to save");
            assert_eq!(set.id, 2);
            assert_eq!(db.count_lego_sets().expect("Query failed"), 2);
        }

        it "rolls back the set when its manual cannot be written" {
            let db = Database::open(path.clone()).expect("Failed to open");
            db.migrate().expect("Failed to migrate");

            let raw = Connection::open(&path).expect("Failed to open raw connection");
            raw.execute_batch(
                r#"CREATE TRIGGER no_manuals BEFORE INSERT ON "Handbuch"
                   BEGIN SELECT RAISE(ABORT, 'manuals are read only'); END;"#,
            )
            .expect("Failed to create trigger");

            let mut set = car_with_manual("v1");
            assert!(db.save_lego_set(&mut set).is_err());
            assert_eq!(set.id, 0);
            assert_eq!(db.count_lego_sets().expect("Query failed"), 0);

            raw.execute_batch("DROP TRIGGER no_manuals").expect("Failed to drop trigger");
            db.save_lego_set(&mut set).expect("Failed to save");
            assert_eq!(db.count_lego_sets().expect("Query failed"), 1);
        }

        it "fails the read when manual text is not valid text" {
            let db = Database::open(path.clone()).expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            let mut set = car_with_manual("v1");
            db.save_lego_set(&mut set).expect("Failed to save");

            let raw = Connection::open(&path).expect("Failed to open raw connection");
            raw.execute(
                r#"UPDATE "Handbuch" SET "text" = X'FFFE00' WHERE "Handbuch_id" = ?"#,
                [set.id],
            )
            .expect("Failed to corrupt row");

            let err = db.find_all_lego_sets().unwrap_err();
            assert!(matches!(err, StoreError::Conversion(ConversionError::InvalidText(_))));
            assert!(db.find_lego_set(set.id).is_err());
        }

        it "rejects an unknown stored age group" {
            let db = Database::open(path.clone()).expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            let mut cars = Category::new("Cars");
            db.save_category(&mut cars).expect("Failed to save");

            let raw = Connection::open(&path).expect("Failed to open raw connection");
            raw.execute(r#"UPDATE "Category" SET "age_group" = 'toddler'"#, [])
                .expect("Failed to corrupt row");

            let err = db.find_all_categories().unwrap_err();
            assert!(matches!(err, StoreError::InvalidValue { .. }));
        }
    }

    describe "naming" {
        it "runs the aggregate on snake case names with a separate back reference" {
            let db = Database::open(path.clone())
                .expect("Failed to open")
                .with_naming(NamingStrategy::new(DefaultNaming::SnakeCase));
            db.migrate().expect("Failed to migrate");

            let mut set = car_with_manual("v1");
            db.save_lego_set(&mut set).expect("Failed to save");
            set.manual = Some(Manual::new("Jens Schauder", "v2"));
            db.save_lego_set(&mut set).expect("Failed to save");

            let raw = Connection::open(&path).expect("Failed to open raw connection");
            let (count, back_reference): (i64, i64) = raw
                .query_row(r#"SELECT COUNT(*), MAX("lego_set") FROM "manual""#, [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .expect("Query failed");
            assert_eq!(count, 1);
            assert_eq!(back_reference, set.id);

            let found = db.find_lego_set(set.id).expect("Query failed").unwrap();
            assert_eq!(found.manual.unwrap().text, "v2");
        }

        it "writes ages to their aliased columns" {
            let db = Database::open(path.clone()).expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            let mut set = car_with_manual("v1");
            db.save_lego_set(&mut set).expect("Failed to save");

            let raw = Connection::open(&path).expect("Failed to open raw connection");
            let (min_age, max_age): (i32, i32) = raw
                .query_row(r#"SELECT "minAge", "maxAge" FROM "LegoSet""#, [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .expect("Query failed");
            assert_eq!((min_age, max_age), (5, 12));
        }
    }

    describe "demos" {
        it "ends the lego walkthrough with only the replacement manual" {
            let db = Database::open_memory().expect("Failed to open");
            db.migrate().expect("Failed to migrate");

            let snapshots = demo::lego_sets(&db).expect("Demo failed");
            let titles: Vec<_> = snapshots.iter().map(|s| s.title.as_str()).collect();
            assert_eq!(titles, vec!["Original LegoSet", "Updated", "Manual replaced"]);

            let texts: Vec<_> = snapshots
                .iter()
                .map(|s| s.items[0].manual.as_ref().unwrap().text.clone())
                .collect();
            assert_eq!(
                texts,
                vec![
                    "Just put all the pieces together in the right order",
                    "Just make it so it looks like a car.",
                    "One last attempt: Just build a car! Ok?",
                ]
            );
            assert!(snapshots.iter().all(|s| s.items.len() == 1 && s.items[0].id == 1));
        }

        it "ends the category walkthrough with buildings only" {
            let db = Database::open_memory().expect("Failed to open");
            db.migrate().expect("Failed to migrate");

            let snapshots = demo::categories(&db).expect("Demo failed");
            assert_eq!(snapshots[0].items.len(), 2);
            assert_eq!(snapshots[0].items[0].age_group, Some(AgeGroup::ThreeToEight));
            assert!(snapshots[0].items[0].created.is_some());

            let last = &snapshots[2].items;
            assert_eq!(last.len(), 1);
            assert_eq!(last[0].name, "Buildings");
            assert!(last[0].description.is_some());
            assert!(last[0].inserted > 0);
        }

        it "runs the single class walkthrough without timestamps" {
            let db = Database::open_memory()
                .expect("Failed to open")
                .with_interceptors(Interceptors::default());
            db.migrate().expect("Failed to migrate");

            let snapshots = demo::single_class(&db).expect("Demo failed");
            let last = &snapshots[2].items;
            assert_eq!(last.len(), 1);
            assert_eq!(last[0].inserted, 0);
            assert!(last[0].age_group.is_none());
        }

        it "lists both repositories as one json document" {
            let db = Database::open_memory().expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            demo::lego_sets(&db).expect("Demo failed");
            demo::categories(&db).expect("Demo failed");

            let json = serde_json::to_string(&demo::listing(&db).expect("Listing failed"))
                .expect("Failed to serialize");
            let value: serde_json::Value = serde_json::from_str(&json).expect("Invalid JSON");
            assert_eq!(value["lego_sets"]["items"].as_array().map(Vec::len), Some(1));
            assert_eq!(value["categories"]["items"][0]["name"], "Buildings");
        }
    }
}
