//! Plain-text "Last Updated" table

use std::fmt;

use crate::freshness::resolver::Resolution;
use crate::freshness::types::LookupStatus;

pub const HEADERS: [&str; 2] = ["Plugin Name", "Last Updated"];

/// Appended to the date of stale plugins
pub const STALE_MARKER: &str = "  ←";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub name: String,
    pub last_updated: String,
}

/// Table of resolved plugins. Unresolved plugins get no row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastUpdatedTable {
    rows: Vec<TableRow>,
}

impl LastUpdatedTable {
    pub fn from_resolutions(resolutions: &[Resolution]) -> Self {
        let rows = resolutions
            .iter()
            .filter(|r| r.status == LookupStatus::Found)
            .filter_map(|r| {
                let timestamp = r.raw_timestamp.as_deref()?;
                let marker = if r.is_stale() { STALE_MARKER } else { "" };
                Some(TableRow {
                    name: r.name.clone(),
                    last_updated: format!("{}{}", timestamp, marker),
                })
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> [usize; 2] {
        self.rows.iter().fold(
            [HEADERS[0].chars().count(), HEADERS[1].chars().count()],
            |[name, date], row| {
                [
                    name.max(row.name.chars().count()),
                    date.max(row.last_updated.chars().count()),
                ]
            },
        )
    }
}

fn write_border(f: &mut fmt::Formatter<'_>, widths: [usize; 2]) -> fmt::Result {
    writeln!(
        f,
        "+{}+{}+",
        "-".repeat(widths[0] + 2),
        "-".repeat(widths[1] + 2)
    )
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: [usize; 2], cells: [&str; 2]) -> fmt::Result {
    let pad = |cell: &str, width: usize| " ".repeat(width - cell.chars().count());
    writeln!(
        f,
        "| {}{} | {}{} |",
        cells[0],
        pad(cells[0], widths[0]),
        cells[1],
        pad(cells[1], widths[1])
    )
}

impl fmt::Display for LastUpdatedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();

        write_border(f, widths)?;
        write_row(f, widths, HEADERS)?;
        write_border(f, widths)?;
        for row in &self.rows {
            write_row(f, widths, [&row.name, &row.last_updated])?;
        }
        write_border(f, widths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(name: &str, timestamp: &str, is_stale: bool) -> Resolution {
        Resolution {
            name: name.to_string(),
            slug: name.to_lowercase(),
            status: LookupStatus::Found,
            raw_timestamp: Some(timestamp.to_string()),
            is_stale: Some(is_stale),
        }
    }

    fn unresolved(name: &str, status: LookupStatus) -> Resolution {
        Resolution {
            name: name.to_string(),
            slug: name.to_lowercase(),
            status,
            raw_timestamp: None,
            is_stale: None,
        }
    }

    #[test]
    fn from_resolutions_omits_unresolved_plugins() {
        let table = LastUpdatedTable::from_resolutions(&[
            found("Akismet", "2025-01-01", false),
            unresolved("Custom", LookupStatus::NotFound),
            unresolved("Flaky", LookupStatus::Failed),
            found("Legacy", "2019-02-03", true),
        ]);

        assert_eq!(
            table.rows(),
            &[
                TableRow {
                    name: "Akismet".to_string(),
                    last_updated: "2025-01-01".to_string(),
                },
                TableRow {
                    name: "Legacy".to_string(),
                    last_updated: "2019-02-03  ←".to_string(),
                },
            ]
        );
    }

    #[test]
    fn display_renders_aligned_table() {
        let table = LastUpdatedTable::from_resolutions(&[
            found("Akismet Anti-spam", "2025-01-01", false),
            found("Old", "2019-02-03", true),
        ]);

        let expected = "\
+-------------------+---------------+
| Plugin Name       | Last Updated  |
+-------------------+---------------+
| Akismet Anti-spam | 2025-01-01    |
| Old               | 2019-02-03  ← |
+-------------------+---------------+
";
        assert_eq!(table.to_string(), expected);
    }

    #[test]
    fn display_renders_header_only_when_empty() {
        let table = LastUpdatedTable::from_resolutions(&[unresolved(
            "Custom",
            LookupStatus::NotFound,
        )]);

        assert!(table.is_empty());
        assert_eq!(
            table.to_string(),
            "\
+-------------+--------------+
| Plugin Name | Last Updated |
+-------------+--------------+
+-------------+--------------+
"
        );
    }
}
