use std::fmt;

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use super::Persistent;

/// A theme that sets can be grouped under.
///
/// `id` is generated by the database on first insert. `inserted` holds the
/// epoch millis of the first save and is 0 before that.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub created: Option<NaiveDate>,
    pub inserted: i64,
    pub age_group: Option<AgeGroup>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Records `now_millis` as the insert time unless one is already set.
    /// Returns whether the timestamp changed.
    pub fn time_stamp(&mut self, now_millis: i64) -> bool {
        if self.inserted != 0 {
            return false;
        }
        self.inserted = now_millis;
        true
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Category(id={},\n\tname={},\n\tdescription={},\n\tcreated={},\n\tinserted={},\n\tageGroup={})",
            self.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            self.name,
            self.description.as_deref().unwrap_or("-"),
            self.created.map_or_else(|| "-".to_string(), |d| d.to_string()),
            self.inserted,
            self.age_group.map_or("-", |g| g.as_str())
        )
    }
}

impl Persistent for Category {
    const TYPE_NAME: &'static str = "Category";
    const PROPERTIES: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "created",
        "inserted",
        "age_group",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.map_or(Value::Null, Value::Integer),
            Value::Text(self.name.clone()),
            self.description.clone().map_or(Value::Null, Value::Text),
            self.created
                .map_or(Value::Null, |d| Value::Text(d.format(DATE_FORMAT).to_string())),
            Value::Integer(self.inserted),
            self.age_group
                .map_or(Value::Null, |g| Value::Text(g.as_str().to_string())),
        ]
    }
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Recommended age bracket for a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgeGroup {
    #[serde(rename = "0to3")]
    ZeroToThree,
    #[serde(rename = "3to8")]
    ThreeToEight,
    #[serde(rename = "8to12")]
    EightToTwelve,
    #[serde(rename = "12andOlder")]
    TwelveAndOlder,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroToThree => "0to3",
            Self::ThreeToEight => "3to8",
            Self::EightToTwelve => "8to12",
            Self::TwelveAndOlder => "12andOlder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "0to3" => Some(Self::ZeroToThree),
            "3to8" => Some(Self::ThreeToEight),
            "8to12" => Some(Self::EightToTwelve),
            "12andOlder" => Some(Self::TwelveAndOlder),
            _ => None,
        }
    }
}
