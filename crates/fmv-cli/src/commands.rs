use anyhow::Result;
use chrono::Local;
use comfy_table::Table;
use fmv_cli::cli::RunArgs;
use fmv_cli::pipeline;
use fmv_cli::types::RunResult;
use fmv_model::Domain;

use crate::summary::apply_table_style;

pub fn run_domains() {
    let mut table = Table::new();
    table.set_header(vec!["Domain", "Description", "Fields"]);
    apply_table_style(&mut table);
    for domain in Domain::ALL {
        let fields = domain
            .fields()
            .iter()
            .map(|field| format!("{} ({})", field.name, field.kind.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            domain.as_str().to_string(),
            domain.description().to_string(),
            fields,
        ]);
    }
    println!("{table}");
}

/// The engine never reads the clock; the run date is fixed here.
pub fn run_folder(args: &RunArgs) -> Result<RunResult> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    pipeline::run_folder(args, today)
}
