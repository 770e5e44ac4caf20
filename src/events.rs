//! Hooks that run synchronously before an aggregate is written.
//!
//! Interceptors form an explicit ordered list owned by the store. Each one
//! matches on the [`Aggregate`] variant it understands and ignores the rest.

use chrono::Utc;

use crate::ids::IdAssigner;
use crate::models::{Category, LegoSet};

/// A root about to be saved.
#[derive(Debug)]
pub enum Aggregate<'a> {
    LegoSet(&'a mut LegoSet),
    Category(&'a mut Category),
}

impl Aggregate<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LegoSet(_) => "LegoSet",
            Self::Category(_) => "Category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreSave {
    /// Assigns ids to new sets from the store's sequence and copies them onto
    /// their manual.
    AssignIds,
    /// Records the first-save time on categories.
    StampInserted,
}

impl PreSave {
    pub fn apply(&self, target: &mut Aggregate<'_>, ids: &IdAssigner) {
        match (self, target) {
            (Self::AssignIds, Aggregate::LegoSet(set)) => {
                if ids.assign(set) {
                    tracing::debug!(entity = "LegoSet", id = set.id, "assigned id");
                }
            }
            (Self::StampInserted, Aggregate::Category(category)) => {
                category.time_stamp(Utc::now().timestamp_millis());
            }
            _ => {}
        }
    }
}

/// Ordered list of pre-save hooks.
#[derive(Debug, Clone, Default)]
pub struct Interceptors(Vec<PreSave>);

impl Interceptors {
    pub fn new(hooks: Vec<PreSave>) -> Self {
        Self(hooks)
    }

    /// Id assignment followed by insert timestamping.
    pub fn standard() -> Self {
        Self(vec![PreSave::AssignIds, PreSave::StampInserted])
    }

    /// Runs every hook in order. `ids` is the sequence owned by the store
    /// doing the save.
    pub fn run(&self, target: &mut Aggregate<'_>, ids: &IdAssigner) {
        tracing::debug!(entity = target.type_name(), "before save");
        for hook in &self.0 {
            hook.apply(target, ids);
        }
    }

    pub fn hooks(&self) -> &[PreSave] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ids::IdSequence;
    use crate::models::Manual;

    fn assigner() -> IdAssigner {
        IdAssigner::new(Arc::new(IdSequence::new()))
    }

    #[test]
    fn test_standard_hooks_act_on_matching_variant_only() {
        let ids = assigner();
        let interceptors = Interceptors::standard();

        let mut set = LegoSet::new("Small Car 01");
        set.manual = Some(Manual::new("Jens Schauder", "v1"));
        interceptors.run(&mut Aggregate::LegoSet(&mut set), &ids);
        assert_eq!(set.id, 1);
        assert_eq!(set.manual.as_ref().unwrap().id, 1);

        let mut category = Category::new("Cars");
        interceptors.run(&mut Aggregate::Category(&mut category), &ids);
        assert!(category.inserted > 0);
        assert_eq!(category.id, None);
    }

    #[test]
    fn test_stamp_keeps_existing_timestamp() {
        let interceptors = Interceptors::new(vec![PreSave::StampInserted]);
        let mut category = Category::new("Buildings");
        category.inserted = 42;
        interceptors.run(&mut Aggregate::Category(&mut category), &assigner());
        assert_eq!(category.inserted, 42);
    }

    #[test]
    fn test_empty_list_changes_nothing() {
        let interceptors = Interceptors::default();
        let mut set = LegoSet::new("Small Car 01");
        interceptors.run(&mut Aggregate::LegoSet(&mut set), &assigner());
        assert_eq!(set.id, 0);
    }

    #[test]
    fn test_assign_ids_draws_from_the_given_sequence() {
        let sequence = Arc::new(IdSequence::new());
        sequence.advance_to(7);
        let ids = IdAssigner::new(sequence);

        let mut set = LegoSet::new("Small Car 01");
        Interceptors::standard().run(&mut Aggregate::LegoSet(&mut set), &ids);
        assert_eq!(set.id, 8);
    }
}
