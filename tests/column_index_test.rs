use revgrid_core::config::config::ColumnsConfig;
use revgrid_core::data::column_index::{ColumnIndexKind, ColumnIndexTable, ColumnPlacement};
use revgrid_core::data::datatable::SchemaField;
use std::collections::HashSet;

fn create_table(count: usize) -> ColumnIndexTable {
    let schema: Vec<SchemaField> = (0..count)
        .map(|i| SchemaField::new(format!("col_{}", i)))
        .collect();
    let mut table = ColumnIndexTable::new(&ColumnsConfig::default());
    table.create_columns(&schema);
    table
}

/// Small deterministic generator so the sequence is reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

fn assert_consistent(table: &ColumnIndexTable, duplicates_allowed: bool) {
    let all = table.all_column_count();
    for &idx in table.active_all_indexes() {
        assert!(idx < all, "active entry {} outside all columns ({})", idx, all);
    }
    if !duplicates_allowed {
        let unique: HashSet<usize> = table.active_all_indexes().iter().copied().collect();
        assert_eq!(unique.len(), table.active_column_count(), "{:?}", table.active_all_indexes());
    }
}

#[test]
fn test_active_columns_stay_consistent() {
    let mut table = create_table(8);
    let mut rng = Lcg(7);

    for _ in 0..500 {
        let active = table.active_column_count();
        match rng.next(5) {
            0 => {
                let index = rng.next(8);
                let before = rng.next(active + 1);
                table.show_columns(ColumnIndexKind::All, &[index], ColumnPlacement::Before(before), false);
            }
            1 => {
                table.hide_columns(ColumnIndexKind::Active, &[rng.next(active)]);
            }
            2 => {
                table.move_column_before(rng.next(active), rng.next(active));
            }
            3 => {
                table.move_column_after(rng.next(active), rng.next(active));
            }
            _ => {
                let indexes = [rng.next(8), rng.next(8), rng.next(8)];
                table.show_columns(ColumnIndexKind::All, &indexes, ColumnPlacement::Append, false);
            }
        }
        assert_consistent(&table, false);
    }
}

#[test]
fn test_duplicates_only_with_explicit_request() {
    let mut table = create_table(3);
    table.show_columns(ColumnIndexKind::All, &[0], ColumnPlacement::Append, true);
    assert_eq!(table.active_all_indexes(), &[0, 1, 2, 0]);
    assert_consistent(&table, true);

    // Both copies go, and the one in front moves the insertion point down
    table.show_columns(ColumnIndexKind::All, &[0], ColumnPlacement::Before(2), false);
    assert_eq!(table.active_all_indexes(), &[1, 0, 2]);

    table.show_columns(ColumnIndexKind::All, &[2, 2], ColumnPlacement::Append, false);
    assert_eq!(table.active_all_indexes(), &[1, 0, 2]);
}

#[test]
fn test_lookup_misses_return_none() {
    let mut table = create_table(4);
    table.hide_columns(ColumnIndexKind::All, &[2]);
    assert_eq!(table.active_index_by_all_index(2), None);
    assert_eq!(table.active_index_by_name("col_2"), None);
    assert_eq!(table.active_index_by_name("nope"), None);
    assert_eq!(table.active_index_by_name("col_3"), Some(2));
    assert!(table.active_column(10).is_none());
}

#[test]
fn test_move_out_of_range_is_noop() {
    let mut table = create_table(3);
    assert_eq!(table.move_column_before(0, 3), None);
    assert_eq!(table.move_column_after(5, 0), None);
    assert_eq!(table.active_all_indexes(), &[0, 1, 2]);
}

#[test]
fn test_set_active_columns_by_names() {
    let mut table = create_table(4);
    table.set_active_columns_by_names(&["col_3", "missing", "col_0"]);
    assert_eq!(table.active_column_names(), vec!["col_3", "col_0"]);
}
