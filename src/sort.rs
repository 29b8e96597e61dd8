use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use tracing::{debug, trace};

use crate::domain::{SortDirection, SortMemory, TableConfig, TableError};
use crate::table::{Row, Table};

/// Click-to-sort on header cells.
#[derive(Debug, Clone, Default)]
pub struct SortController {
    memory: SortMemory,
    sortable: Option<Vec<usize>>,
    directions: HashMap<usize, SortDirection>,
}

impl SortController {
    pub fn new(cfg: &TableConfig) -> Self {
        SortController {
            memory: cfg.sort_memory,
            sortable: cfg.sortable_columns.clone(),
            directions: HashMap::new(),
        }
    }

    pub fn direction(&self, column: usize) -> Option<SortDirection> {
        self.directions.get(&column).copied()
    }

    /// Reorder the data rows by `column` and return the direction that was used.
    pub fn sort(&mut self, table: &mut Table, column: usize) -> Result<SortDirection, TableError> {
        table.check_column(column)?;
        if let Some(sortable) = &self.sortable {
            if !sortable.contains(&column) {
                return Err(TableError::NotSortable(column));
            }
        }

        let direction = SortDirection::next(self.direction(column));
        if self.memory == SortMemory::SingleColumn {
            self.directions.clear();
        }
        self.directions.insert(column, direction);

        let rows = std::mem::take(&mut table.rows);
        table.rows = merge_sort_by(rows, &mut |a: &Row, b: &Row| {
            direction.apply(compare_cells(a.cell(column), b.cell(column)))
        });
        debug!("Sorted {} rows by column {} {:?}", table.rows.len(), column, direction);
        Ok(direction)
    }
}

/// Stable top-down merge sort that accepts an inconsistent comparator.
///
/// `compare_cells` is not transitive on columns mixing numbers and text, so
/// `slice::sort_by` is not an option here. Any comparator yields a permutation of the input.
fn merge_sort_by<T, F>(items: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, cmp);
    let right = merge_sort_by(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r) == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric when both sides are numbers, otherwise a case-insensitive natural order.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let ordering = natural_cmp(a, b);
            trace!("Compare \"{}\" <> \"{}\": {:?}", a, b, ordering);
            ordering
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Digit runs compare by value, everything else by lowercase character.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let ordering = cmp_digit_runs(&take_digits(&mut ca), &take_digits(&mut cb));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                ca.next();
                cb.next();
            }
        }
    }
}
