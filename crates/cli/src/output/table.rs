//! Tabular rendering of object listings

use comfy_table::presets::NOTHING;
use comfy_table::{CellAlignment, Table};
use sss_core::ObjectInfo;

const NO_DATE: &str = "-";

/// Build a borderless table of objects: modified time, size, key
pub fn object_table(items: &[ObjectInfo]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec!["LAST MODIFIED", "SIZE", "KEY"]);

    for item in items {
        let date = item
            .last_modified
            .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| NO_DATE.to_string());
        let size = if item.is_dir {
            "DIR".to_string()
        } else {
            item.size_human.clone().unwrap_or_else(|| "0 B".to_string())
        };
        table.add_row(vec![date, size, item.key.clone()]);
    }

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    table
}
