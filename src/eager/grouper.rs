//! Grouping of heterogeneous record batches for preloading.

use crate::eager::loader::AssociationPreloader;
use crate::error::{HydraError, HydraResult};
use crate::record::HydraRecord;
use crate::registry::{AssociationDescriptor, AttributeRegistry, ValueCategory};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Records of one concrete type still missing one category of values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadGroup {
    pub entity_type: String,
    pub category: ValueCategory,
    pub association: AssociationDescriptor,
    pub value_table: String,
    /// Positions in the batch, ascending
    pub indices: Vec<usize>,
}

impl PreloadGroup {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Splits a record batch into [`PreloadGroup`]s and runs one preload per group
#[derive(Clone)]
pub struct PreloadGrouper {
    registry: Arc<dyn AttributeRegistry>,
}

impl PreloadGrouper {
    pub fn new(registry: Arc<dyn AttributeRegistry>) -> Self {
        Self { registry }
    }

    /// Group `records` by (type tag, category).
    ///
    /// Empty for batches of zero or one record. Groups come out in order of first
    /// appearance of their type, then in `ValueCategory::ALL` order.
    ///
    /// # Errors
    ///
    /// `HydraError::Configuration` if a type declares a category without a value table.
    pub fn group<R: HydraRecord>(&self, records: &[R]) -> HydraResult<Vec<PreloadGroup>> {
        if records.len() <= 1 {
            return Ok(Vec::new());
        }

        let mut groups: Vec<PreloadGroup> = Vec::new();
        let mut slots: HashMap<(&str, ValueCategory), usize> = HashMap::new();
        let mut categories: HashMap<&str, Option<Vec<ValueCategory>>> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let entity_type = record.entity_type();
            let Some(type_categories) = categories
                .entry(entity_type)
                .or_insert_with(|| self.registry.value_categories(entity_type))
                .as_ref()
            else {
                log::trace!("skipping preload for `{entity_type}`: no dynamic attributes");
                continue;
            };

            for &category in type_categories {
                let association = self.registry.association_for(category);
                if record.is_association_loaded(&association) {
                    continue;
                }
                let slot = match slots.get(&(entity_type, category)) {
                    Some(&slot) => slot,
                    None => {
                        let value_table = self
                            .registry
                            .value_table(entity_type, category)
                            .ok_or_else(|| {
                                HydraError::Configuration(format!(
                                    "`{entity_type}` declares {category} attributes but no {category} value table is registered"
                                ))
                            })?;
                        groups.push(PreloadGroup {
                            entity_type: entity_type.to_string(),
                            category,
                            association,
                            value_table,
                            indices: Vec::new(),
                        });
                        slots.insert((entity_type, category), groups.len() - 1);
                        groups.len() - 1
                    }
                };
                groups[slot].indices.push(index);
            }
        }

        log::debug!(
            "grouped {} records into {} preload groups",
            records.len(),
            groups.len()
        );
        Ok(groups)
    }

    /// Group `records` and hand every group to `preloader`, sequentially.
    ///
    /// Returns the number of preload calls made. A failing group aborts the
    /// remaining ones and its error is returned as is.
    pub fn group_and_preload<R, P>(&self, records: &mut [R], preloader: &P) -> HydraResult<usize>
    where
        R: HydraRecord,
        P: AssociationPreloader<R> + ?Sized,
    {
        let groups = self.group(records)?;
        for group in &groups {
            let mut members: Vec<&mut R> = records
                .iter_mut()
                .enumerate()
                .filter(|(index, _)| group.indices.binary_search(index).is_ok())
                .map(|(_, record)| record)
                .collect();

            #[cfg(feature = "tracing")]
            let _span =
                tracing_helpers::preload_span(&group.entity_type, group.category, members.len())
                    .entered();

            preloader.preload(group, &mut members)?;
        }
        Ok(groups.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::registry::{EntityAttributes, StaticRegistry};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn registry() -> Arc<dyn AttributeRegistry> {
        Arc::new(
            StaticRegistry::new()
                .register(
                    "Car",
                    EntityAttributes::new()
                        .attribute("model", ValueCategory::String)
                        .attribute("seats", ValueCategory::Integer)
                        .with_conventional_tables("car"),
                )
                .register(
                    "Bike",
                    EntityAttributes::new()
                        .attribute("brand", ValueCategory::String)
                        .with_conventional_tables("bike"),
                ),
        )
    }

    /// Records each call and marks the group's association loaded
    #[derive(Default)]
    struct CountingPreloader {
        calls: Mutex<Vec<(String, ValueCategory, usize)>>,
    }

    impl AssociationPreloader<Record> for CountingPreloader {
        fn preload(&self, group: &PreloadGroup, records: &mut [&mut Record]) -> HydraResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((group.entity_type.clone(), group.category, records.len()));
            for record in records.iter_mut() {
                record.store_association(&group.association, BTreeMap::new());
            }
            Ok(())
        }
    }

    fn mixed_batch() -> Vec<Record> {
        let mut records = Vec::new();
        for id in 0..10i64 {
            let entity_type = if id % 5 < 3 { "Car" } else { "Bike" };
            records.push(Record::new(entity_type, id));
        }
        records
    }

    #[test]
    fn test_mixed_batch_issues_one_call_per_type_and_category() {
        let mut records = mixed_batch();
        let preloader = CountingPreloader::default();

        let calls = PreloadGrouper::new(registry())
            .group_and_preload(&mut records, &preloader)
            .unwrap();

        assert_eq!(calls, 3);
        let calls = preloader.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("Car".to_string(), ValueCategory::String, 6),
                ("Car".to_string(), ValueCategory::Integer, 6),
                ("Bike".to_string(), ValueCategory::String, 4),
            ]
        );
        assert!(records
            .iter()
            .all(|r| r.is_category_loaded(ValueCategory::String)));
    }

    #[test]
    fn test_single_record_is_never_preloaded() {
        let mut records = vec![Record::new("Car", 1i64)];
        let preloader = CountingPreloader::default();
        let calls = PreloadGrouper::new(registry())
            .group_and_preload(&mut records, &preloader)
            .unwrap();
        assert_eq!(calls, 0);
        assert!(preloader.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unconfigured_types_are_skipped() {
        let records = vec![
            Record::new("Car", 1i64),
            Record::new("Boat", 2i64),
            Record::new("Boat", 3i64),
        ];
        let groups = PreloadGrouper::new(registry()).group(&records).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.entity_type == "Car" && g.indices == [0]));
    }

    #[test]
    fn test_loaded_associations_are_not_reloaded() {
        let strings = AssociationDescriptor::for_category(ValueCategory::String);
        let mut loaded = Record::new("Car", 1i64);
        loaded.store_association(&strings, BTreeMap::new());
        let records = vec![loaded, Record::new("Car", 2i64)];

        let groups = PreloadGrouper::new(registry()).group(&records).unwrap();
        let string_group = groups
            .iter()
            .find(|g| g.category == ValueCategory::String)
            .unwrap();
        assert_eq!(string_group.indices, [1]);
        let integer_group = groups
            .iter()
            .find(|g| g.category == ValueCategory::Integer)
            .unwrap();
        assert_eq!(integer_group.indices, [0, 1]);
        assert_eq!(integer_group.value_table, "car_integer_values");
    }

    #[test]
    fn test_fully_loaded_batch_makes_no_calls() {
        let mut records = mixed_batch();
        let preloader = CountingPreloader::default();
        let grouper = PreloadGrouper::new(registry());
        grouper.group_and_preload(&mut records, &preloader).unwrap();
        let second = grouper.group_and_preload(&mut records, &preloader).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn test_missing_value_table_is_configuration_error() {
        let registry: Arc<dyn AttributeRegistry> = Arc::new(StaticRegistry::new().register(
            "Car",
            EntityAttributes::new().attribute("model", ValueCategory::String),
        ));
        let records = vec![Record::new("Car", 1i64), Record::new("Car", 2i64)];
        let err = PreloadGrouper::new(registry).group(&records).unwrap_err();
        assert!(matches!(err, HydraError::Configuration(_)));
    }
}
