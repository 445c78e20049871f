use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use fmv_cli::types::RunResult;
use fmv_report::DomainSummary;

pub fn print_summary(result: &RunResult) {
    println!("Folder: {}", result.folder.display());
    println!("Today: {}", result.today);
    match &result.outputs {
        Some(outputs) => {
            println!("Output: {}", outputs.output_dir.display());
            println!("Run report: {}", outputs.report_json.display());
            println!("Workbook: {}", outputs.workbook.display());
        }
        None => println!("Output: dry run, nothing written"),
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("Description"),
        header_cell("Records"),
        header_cell("Invalid"),
        header_cell("Warnings"),
        header_cell("Merged"),
        header_cell("Skipped files"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut totals = [0usize; 5];
    for summary in &result.summaries {
        let counts = [
            summary.records,
            summary.invalid,
            summary.warnings,
            summary.merges,
            summary.skipped_files,
        ];
        for (total, count) in totals.iter_mut().zip(counts) {
            *total += count;
        }
        table.add_row(vec![
            Cell::new(summary.domain.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.domain.description()),
            Cell::new(summary.records),
            count_cell(summary.invalid, Color::Red),
            count_cell(summary.warnings, Color::Yellow),
            count_cell(summary.merges, Color::Cyan),
            count_cell(summary.skipped_files, Color::Red),
        ]);
    }
    for failed in &result.outcome.failed {
        table.add_row(vec![
            Cell::new(failed.domain.as_str()).fg(Color::Red),
            Cell::new("failed").fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new("All domains")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(totals[0]).add_attribute(Attribute::Bold),
        count_cell(totals[1], Color::Red).add_attribute(Attribute::Bold),
        count_cell(totals[2], Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(totals[3], Color::Cyan).add_attribute(Attribute::Bold),
        count_cell(totals[4], Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_metrics_table(&result.summaries);
    print_problems(result);
}

fn print_metrics_table(summaries: &[DomainSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("Metric"),
        header_cell("Value"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut has_rows = false;
    for summary in summaries {
        for (metric, value) in summary.metrics.rows() {
            table.add_row(vec![
                Cell::new(summary.domain.as_str()).fg(Color::Blue),
                Cell::new(metric),
                Cell::new(value),
            ]);
            has_rows = true;
        }
    }
    if has_rows {
        println!();
        println!("Metrics:");
        println!("{table}");
    }
}

fn print_problems(result: &RunResult) {
    let skipped: Vec<_> = result
        .outcome
        .domains
        .iter()
        .flat_map(|domain| domain.skipped_files.iter().map(move |file| (domain.domain, file)))
        .collect();
    if !skipped.is_empty() {
        eprintln!("Skipped files:");
        for (domain, file) in skipped {
            eprintln!("- [{domain}] {}: {}", file.file, file.reason);
        }
    }
    if !result.outcome.failed.is_empty() {
        eprintln!("Failed domains:");
        for failed in &result.outcome.failed {
            eprintln!("- {}: {}", failed.domain, failed.reason);
        }
    }
    if !result.ignored_files.is_empty() {
        eprintln!("Ignored files: {}", result.ignored_files.join(", "));
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
