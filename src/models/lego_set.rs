use std::fmt;

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use super::Persistent;
use crate::convert::{self, Period};

/// A buildable set, the root of its aggregate.
///
/// `id` is 0 until the first save. The ages are exposed as [`Period`]s but
/// persisted as whole years through [`LegoSet::min_age_years`] and
/// [`LegoSet::max_age_years`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegoSet {
    pub id: i64,
    pub name: String,
    pub minimum_age: Option<Period>,
    pub maximum_age: Option<Period>,
    pub manual: Option<Manual>,
}

impl LegoSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn min_age_years(&self) -> i32 {
        convert::to_years(self.minimum_age)
    }

    pub fn set_min_age_years(&mut self, years: i32) {
        self.minimum_age = Some(convert::from_years(years));
    }

    pub fn max_age_years(&self) -> i32 {
        convert::to_years(self.maximum_age)
    }

    pub fn set_max_age_years(&mut self, years: i32) {
        self.maximum_age = Some(convert::from_years(years));
    }
}

impl fmt::Display for LegoSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let age = |p: Option<Period>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
        write!(
            f,
            "LegoSet(id={}, name={}, minimumAge={}, maximumAge={})",
            self.id,
            self.name,
            age(self.minimum_age),
            age(self.maximum_age)
        )?;
        match &self.manual {
            Some(manual) => write!(
                f,
                "\n\tManual(id={}, author={}, text={})",
                manual.id, manual.author, manual.text
            ),
            None => write!(f, "\n\tno manual"),
        }
    }
}

impl Persistent for LegoSet {
    const TYPE_NAME: &'static str = "LegoSet";
    const PROPERTIES: &'static [&'static str] = &["id", "name", "min_age_years", "max_age_years"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.name.clone()),
            Value::Integer(self.min_age_years().into()),
            Value::Integer(self.max_age_years().into()),
        ]
    }
}

/// Building instructions owned by a [`LegoSet`].
///
/// `id` always equals the owning set's id once persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manual {
    pub id: i64,
    pub author: String,
    pub text: String,
}

impl Manual {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            author: author.into(),
            text: text.into(),
        }
    }
}

impl Persistent for Manual {
    const TYPE_NAME: &'static str = "Manual";
    const PROPERTIES: &'static [&'static str] = &["id", "author", "text"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.author.clone()),
            Value::Text(self.text.clone()),
        ]
    }
}
