//! FILENAME: table-core/src/row_models/sorted.rs
//! Sorted row model: stable multi-key sort, applied at every tree level.

use std::cmp::Ordering;
use std::rc::Rc;
use smallvec::SmallVec;
use value::CellValue;
use crate::column::SortUndefined;
use crate::error::Result;
use crate::features::row_sorting::{RowSorting, SortingState, SORTING};
use crate::fns::SortFn;
use crate::memo::ByRef;
use crate::row::{Row, RowData};
use crate::row_model::RowModel;
use crate::state::SliceDep;
use crate::table::Table;

pub(crate) struct SortedDeps<T: RowData> {
    input: ByRef<RowModel<T>>,
    sorting: SliceDep,
    manual: bool,
    tie_breaker: Option<String>,
}

impl<T: RowData> PartialEq for SortedDeps<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
            && self.sorting == other.sorting
            && self.manual == other.manual
            && self.tie_breaker == other.tie_breaker
    }
}

/// One resolved sort key.
struct SortKey {
    column_id: String,
    sort_fn: SortFn,
    desc: bool,
    invert: bool,
    undefined: SortUndefined,
}

impl SortKey {
    fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        let mut ord = Ordering::Equal;
        if self.undefined != SortUndefined::Ignore && (a.is_empty() || b.is_empty()) {
            match (a.is_empty(), b.is_empty()) {
                (true, true) => return Ordering::Equal,
                (a_empty, _) => match self.undefined {
                    SortUndefined::First => return if a_empty { Ordering::Less } else { Ordering::Greater },
                    SortUndefined::Last => return if a_empty { Ordering::Greater } else { Ordering::Less },
                    SortUndefined::Lower => ord = if a_empty { Ordering::Less } else { Ordering::Greater },
                    _ => ord = if a_empty { Ordering::Greater } else { Ordering::Less },
                },
            }
        }
        if ord == Ordering::Equal {
            ord = self.sort_fn.compare(a, b);
        }
        if self.desc {
            ord = ord.reverse();
        }
        if self.invert {
            ord = ord.reverse();
        }
        ord
    }
}

impl<T: RowData> Table<T> {
    pub fn pre_sorted_row_model(&self) -> Result<Rc<RowModel<T>>> {
        self.filtered_row_model()
    }

    pub fn sorted_row_model(&self) -> Result<Rc<RowModel<T>>> {
        let input = self.pre_sorted_row_model()?;
        if !self.has_feature(RowSorting::NAME) {
            return Ok(input);
        }
        self.caches.sorted.get(
            || {
                let options = self.opts();
                Ok(SortedDeps {
                    input: ByRef::new(&input),
                    sorting: SliceDep(self.slice_value(SORTING)),
                    manual: options.settings.manual_sorting,
                    tie_breaker: options.settings.sort_tie_breaker.clone(),
                })
            },
            |deps| self.sort_row_model(&input, deps),
        )
    }

    fn sort_row_model(&self, input: &Rc<RowModel<T>>, deps: &SortedDeps<T>) -> Result<Rc<RowModel<T>>> {
        let sorting = self.sorting_state();
        if deps.manual || sorting.is_empty() || input.rows.is_empty() {
            return Ok(Rc::clone(input));
        }

        let keys = self.sort_keys(&sorting)?;
        if keys.is_empty() {
            return Ok(Rc::clone(input));
        }
        let tie_breaker = match &deps.tie_breaker {
            Some(id) => Some(self.column(id)?.id.clone()),
            None => None,
        };

        let rows = sort_rows(&input.rows, &keys, tie_breaker.as_deref())?;
        Ok(Rc::new(RowModel::from_rows(rows)))
    }

    /// Sort entries whose column exists and can sort, with their functions.
    fn sort_keys(&self, sorting: &SortingState) -> Result<Vec<SortKey>> {
        let mut keys = Vec::with_capacity(sorting.len());
        for entry in sorting {
            let column = match self.entity_graph()?.column(&entry.id) {
                Some(column) => Rc::clone(column),
                None => continue,
            };
            if !self.column_can_sort(&column.id)? {
                continue;
            }
            keys.push(SortKey {
                column_id: column.id.clone(),
                sort_fn: self.column_sort_fn(&column.id)?,
                desc: entry.desc,
                invert: column.def.invert_sorting,
                undefined: column.def.sort_undefined,
            });
        }
        Ok(keys)
    }
}

fn sort_rows<T: RowData>(
    rows: &[Rc<Row<T>>],
    keys: &[SortKey],
    tie_breaker: Option<&str>,
) -> Result<Vec<Rc<Row<T>>>> {
    // Read every key value up front so accessor errors propagate.
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let values: SmallVec<[CellValue; 4]> = keys
            .iter()
            .map(|key| row.get_value(&key.column_id))
            .collect::<Result<_>>()?;
        let tie = match tie_breaker {
            Some(id) => Some(row.get_value(id)?),
            None => None,
        };
        entries.push((row, values, tie));
    }

    // Vec::sort_by is stable: equal rows keep their input order.
    entries.sort_by(|(_, a, a_tie), (_, b, b_tie)| {
        keys.iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(key, (a, b))| key.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| match (a_tie, b_tie) {
                (Some(a), Some(b)) => value::compare_values(a, b),
                _ => Ordering::Equal,
            })
    });

    let mut sorted = Vec::with_capacity(entries.len());
    for (row, _, _) in entries {
        if row.has_sub_rows() {
            let children = sort_rows(&row.sub_rows, keys, tie_breaker)?;
            sorted.push(row.with_sub_rows(children, row.depth).into_shared());
        } else {
            sorted.push(Rc::clone(row));
        }
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fns::sort::builtin_sort_fns;

    fn key(undefined: SortUndefined, desc: bool) -> SortKey {
        SortKey {
            column_id: "v".to_string(),
            sort_fn: builtin_sort_fns().get("basic").cloned().unwrap(),
            desc,
            invert: false,
            undefined,
        }
    }

    #[test]
    fn empty_placement() {
        let empty = CellValue::Empty;
        let one = CellValue::Number(1.0);
        assert_eq!(key(SortUndefined::Last, true).compare(&empty, &one), Ordering::Greater);
        assert_eq!(key(SortUndefined::First, true).compare(&empty, &one), Ordering::Less);
        assert_eq!(key(SortUndefined::Higher, false).compare(&empty, &one), Ordering::Greater);
        assert_eq!(key(SortUndefined::Higher, true).compare(&empty, &one), Ordering::Less);
        assert_eq!(key(SortUndefined::Lower, false).compare(&empty, &one), Ordering::Less);
    }

    #[test]
    fn direction_and_inversion() {
        let a = CellValue::Number(1.0);
        let b = CellValue::Number(2.0);
        assert_eq!(key(SortUndefined::Ignore, false).compare(&a, &b), Ordering::Less);
        assert_eq!(key(SortUndefined::Ignore, true).compare(&a, &b), Ordering::Greater);
        let mut inverted = key(SortUndefined::Ignore, true);
        inverted.invert = true;
        assert_eq!(inverted.compare(&a, &b), Ordering::Less);
    }
}
