use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::domain::{TableConfig, TableError};
use crate::table::{Document, FilterSelect, Table};

/// Dropdown filters over a fixed set of columns.
///
/// Created by [`FilterController::setup`], which also injects the dropdowns into the
/// header cells. Every change event updates the active filter and re-applies all of them.
#[derive(Debug, Clone)]
pub struct FilterController {
    wildcard: String,
    active: BTreeMap<usize, String>,
}

impl FilterController {
    /// Returns `None` when the document has no table.
    pub fn setup(doc: &mut Document, cfg: &TableConfig) -> Result<Option<Self>, TableError> {
        let Some(table) = doc.table.as_mut() else {
            debug!("No table in document, skipping filter setup");
            return Ok(None);
        };
        for &column in cfg.filterable_columns.iter() {
            table.check_column(column)?;
        }

        let mut controller = FilterController {
            wildcard: cfg.wildcard.clone(),
            active: BTreeMap::new(),
        };

        for &column in cfg.filterable_columns.iter() {
            let distinct: BTreeSet<&str> = table.column_values(column).into_iter().collect();
            let mut options = Vec::with_capacity(distinct.len() + 1);
            options.push(cfg.wildcard.clone());
            options.extend(distinct.into_iter().map(str::to_string));
            trace!("Filter on column {} offers {} values", column, options.len() - 1);

            table.headers[column].select = Some(FilterSelect {
                options,
                selected: cfg.wildcard.clone(),
            });
            controller.active.insert(column, cfg.wildcard.clone());
        }

        controller.apply(table);
        Ok(Some(controller))
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.keys().copied()
    }

    pub fn active(&self, column: usize) -> Option<&str> {
        self.active.get(&column).map(String::as_str)
    }

    pub fn is_wildcard(&self, value: &str) -> bool {
        value == self.wildcard
    }

    /// Toggle row visibility from the active filters. Never reorders or removes rows.
    pub fn apply(&self, table: &mut Table) {
        let mut nvisible = 0;
        for row in table.rows.iter_mut() {
            row.visible = self
                .active
                .iter()
                .all(|(&column, selected)| *selected == self.wildcard || row.cell(column) == selected);
            if row.visible {
                nvisible += 1;
            }
        }
        debug!("Filters leave {}/{} rows visible", nvisible, table.rows.len());
    }

    /// Change event of the dropdown on `column`.
    pub fn select(&mut self, table: &mut Table, column: usize, value: &str) -> Result<(), TableError> {
        let select = table.headers.get_mut(column).and_then(|h| h.select.as_mut());
        let (Some(select), Some(active)) = (select, self.active.get_mut(&column)) else {
            return Err(TableError::NotFilterable(column));
        };
        if !select.options.iter().any(|o| o == value) {
            return Err(TableError::UnknownFilterValue {
                column,
                value: value.to_string(),
            });
        }
        select.selected = value.to_string();
        *active = value.to_string();
        trace!("Filter on column {} set to \"{}\"", column, value);
        self.apply(table);
        Ok(())
    }

    /// Move the dropdown on `column` by `step` options, wrapping around.
    pub fn cycle(&mut self, table: &mut Table, column: usize, step: isize) -> Result<String, TableError> {
        let select = table
            .headers
            .get(column)
            .and_then(|h| h.select.as_ref())
            .ok_or(TableError::NotFilterable(column))?;
        let n = select.options.len() as isize;
        let current = select
            .options
            .iter()
            .position(|o| *o == select.selected)
            .unwrap_or(0) as isize;
        let next = select.options[(current + step).rem_euclid(n) as usize].clone();
        self.select(table, column, &next)?;
        Ok(next)
    }

    pub fn reset(&mut self, table: &mut Table) {
        for (&column, active) in self.active.iter_mut() {
            *active = self.wildcard.clone();
            if let Some(select) = table.headers.get_mut(column).and_then(|h| h.select.as_mut()) {
                select.selected = self.wildcard.clone();
            }
        }
        self.apply(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn results() -> Document {
        let rows = [
            ["Alice", "Zurich", "M40", "12"],
            ["Bob", "Bern", "M40", "7"],
            ["Carla", "Zurich", "W30", "3"],
            ["Dan", " Bern ", "W30", "21"],
            ["Eve", "Zurich", "M40", "9"],
        ];
        let table = Table::new(
            ["Name", "Club", "Category", "Points"].map(String::from).to_vec(),
            rows.iter().map(|r| r.map(String::from).to_vec()).collect(),
        );
        Document::with_table(table)
    }

    fn visible_names(doc: &Document) -> Vec<String> {
        doc.table
            .as_ref()
            .unwrap()
            .visible_rows()
            .map(|r| r.cell(0).to_string())
            .collect()
    }

    #[test]
    fn setup_injects_sorted_distinct_options_behind_wildcard() {
        let mut doc = results();
        let filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_ref().unwrap();

        let club = table.headers[1].select.as_ref().unwrap();
        assert_eq!(club.options, vec!["All", "Bern", "Zurich"]);
        assert_eq!(club.selected, "All");
        let category = table.headers[2].select.as_ref().unwrap();
        assert_eq!(category.options, vec!["All", "M40", "W30"]);
        assert!(table.headers[0].select.is_none());
        assert!(table.headers[3].select.is_none());

        assert_eq!(filters.columns().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(table.visible_rows().count(), 5);
    }

    #[test]
    fn setup_without_table_is_a_noop() {
        let mut doc = Document {
            title: Some("Races".into()),
            table: None,
        };
        let before = doc.clone();
        let filters = FilterController::setup(&mut doc, &TableConfig::default()).unwrap();
        assert!(filters.is_none());
        assert_eq!(doc, before);
    }

    #[test]
    fn setup_with_header_only_offers_wildcard() {
        let mut doc = Document::with_table(Table::new(
            ["a", "b", "c"].map(String::from).to_vec(),
            vec![],
        ));
        FilterController::setup(&mut doc, &TableConfig::default()).unwrap();
        let table = doc.table.unwrap();
        assert_eq!(table.headers[1].select.as_ref().unwrap().options, vec!["All"]);
    }

    #[test]
    fn setup_rejects_filter_column_outside_table() {
        let mut doc = results();
        let cfg = TableConfig::default().with_filterable_columns(vec![1, 9]);
        let err = FilterController::setup(&mut doc, &cfg).unwrap_err();
        assert!(matches!(err, TableError::ColumnOutOfRange { column: 9, .. }));
        assert!(doc.table.unwrap().headers[1].select.is_none());
    }

    #[test]
    fn selected_values_combine_with_and() {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();

        filters.select(table, 1, "Zurich").unwrap();
        assert_eq!(visible_names(&doc), vec!["Alice", "Carla", "Eve"]);

        let table = doc.table.as_mut().unwrap();
        filters.select(table, 2, "M40").unwrap();
        assert_eq!(visible_names(&doc), vec!["Alice", "Eve"]);

        let table = doc.table.as_mut().unwrap();
        filters.select(table, 1, "All").unwrap();
        assert_eq!(visible_names(&doc), vec!["Alice", "Bob", "Eve"]);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();
        filters.select(table, 1, "Bern").unwrap();
        let once = visible_names(&doc);
        let table = doc.table.as_mut().unwrap();
        filters.select(table, 1, "Bern").unwrap();
        filters.apply(table);
        assert_eq!(visible_names(&doc), once);
        assert_eq!(once, vec!["Bob", "Dan"]);
    }

    #[rstest]
    #[case("Zurich", "M40")]
    #[case("Bern", "W30")]
    #[case("Zurich", "W30")]
    #[case("Bern", "M40")]
    fn widening_a_filter_never_hides_rows(#[case] club: &str, #[case] category: &str) {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();
        filters.select(table, 1, club).unwrap();
        filters.select(table, 2, category).unwrap();
        let narrow = visible_names(&doc);

        for row in doc.table.as_ref().unwrap().visible_rows() {
            assert_eq!(row.cell(1), club);
            assert_eq!(row.cell(2), category);
        }

        for column in [1, 2] {
            let mut widened = doc.clone();
            let mut f = filters.clone();
            f.select(widened.table.as_mut().unwrap(), column, "All").unwrap();
            let wide = visible_names(&widened);
            assert!(narrow.iter().all(|n| wide.contains(n)));
        }
    }

    #[test]
    fn select_rejects_unknown_column_and_value() {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();
        assert!(matches!(
            filters.select(table, 0, "Alice"),
            Err(TableError::NotFilterable(0))
        ));
        assert!(matches!(
            filters.select(table, 1, "Geneva"),
            Err(TableError::UnknownFilterValue { column: 1, .. })
        ));
        assert_eq!(filters.active(1), Some("All"));
    }

    #[test]
    fn cycle_wraps_around_options() {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();
        assert_eq!(filters.cycle(table, 1, 1).unwrap(), "Bern");
        assert_eq!(filters.cycle(table, 1, 1).unwrap(), "Zurich");
        assert_eq!(filters.cycle(table, 1, 1).unwrap(), "All");
        assert_eq!(filters.cycle(table, 1, -1).unwrap(), "Zurich");
        assert_eq!(table.headers[1].select.as_ref().unwrap().selected, "Zurich");
    }

    #[test]
    fn reset_shows_every_row() {
        let mut doc = results();
        let mut filters = FilterController::setup(&mut doc, &TableConfig::default())
            .unwrap()
            .unwrap();
        let table = doc.table.as_mut().unwrap();
        filters.select(table, 2, "W30").unwrap();
        filters.reset(table);
        assert_eq!(table.visible_rows().count(), 5);
        assert!(filters.is_wildcard(filters.active(2).unwrap()));
    }
}
