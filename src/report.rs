use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};

/// Whether a factorization accepted a pivot for every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankStatus {
    FullRank,
    RankDeficient,
}

/// Outcome of eliminating a single column.
#[derive(Debug, Clone)]
pub struct PivotReport {
    pub pass: usize,
    /// Position in the column ordering of this pass.
    pub position: usize,
    /// Original column index.
    pub column: usize,
    /// Row the reflector pivoted on, if accepted.
    pub pivot_row: Option<usize>,
    pub original_norm: f64,
    pub remaining_norm: f64,
    pub accepted: bool,
}

pub(crate) fn emit_line(line: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{line}");
    } else {
        println!("{line}");
    }
}

pub trait Reporter {
    fn on_pivot(&mut self, report: &PivotReport);
    fn on_pass_end(&mut self, _pass: usize, _rank: usize) {}
    fn on_finish(&mut self) {}
}

/// Collects pivot reports and prints them as a table when the factorization
/// finishes.
pub struct TableReporter {
    rows: Vec<PivotReport>,
}

impl TableReporter {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TableReporter {
    fn on_pivot(&mut self, report: &PivotReport) {
        self.rows.push(report.clone());
    }

    fn on_pass_end(&mut self, pass: usize, rank: usize) {
        log::debug!("pass {pass} finished with rank {rank}");
    }

    fn on_finish(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if !log::log_enabled!(log::Level::Info) {
            println!();
        }
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("pass").set_alignment(CellAlignment::Right),
            Cell::new("pos").set_alignment(CellAlignment::Right),
            Cell::new("col").set_alignment(CellAlignment::Right),
            Cell::new("pivot row").set_alignment(CellAlignment::Right),
            Cell::new("norm").set_alignment(CellAlignment::Right),
            Cell::new("remaining").set_alignment(CellAlignment::Right),
            Cell::new("accepted"),
        ]);
        for row in &self.rows {
            let pivot_row = row
                .pivot_row
                .map_or_else(|| "-".to_string(), |r| r.to_string());
            table.add_row(vec![
                Cell::new(row.pass).set_alignment(CellAlignment::Right),
                Cell::new(row.position).set_alignment(CellAlignment::Right),
                Cell::new(row.column).set_alignment(CellAlignment::Right),
                Cell::new(pivot_row).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4e}", row.original_norm)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4e}", row.remaining_norm))
                    .set_alignment(CellAlignment::Right),
                Cell::new(if row.accepted { "yes" } else { "no" }),
            ]);
        }

        for line in table.to_string().lines() {
            emit_line(line);
        }
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_reporter_drains_rows_on_finish() {
        let mut reporter = TableReporter::new();
        reporter.on_pivot(&PivotReport {
            pass: 0,
            position: 0,
            column: 2,
            pivot_row: Some(1),
            original_norm: 2.0,
            remaining_norm: 2.0,
            accepted: true,
        });
        reporter.on_pivot(&PivotReport {
            pass: 0,
            position: 1,
            column: 0,
            pivot_row: None,
            original_norm: 1.0,
            remaining_norm: 0.0,
            accepted: false,
        });
        assert_eq!(reporter.rows.len(), 2);
        reporter.on_finish();
        assert!(reporter.rows.is_empty());
    }
}
