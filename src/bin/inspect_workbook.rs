use std::{env, path::Path, process::exit};

use sheetserve::{extract, workbook};

fn main() {
    // Expect a workbook path and an optional sheet name.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <WORKBOOK_FILE> [SHEET_NAME]", args[0]);
        exit(1);
    }
    let sheet = args.get(2).map(String::as_str);
    if let Err(e) = inspect_workbook(Path::new(&args[1]), sheet) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Load the workbook, run table extraction, and print what the server
/// would be serving.
fn inspect_workbook(path: &Path, sheet: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let grid = workbook::load_grid(path, sheet)?;

    println!("=== Workbook: {} ===", path.display());
    println!("Grid rows:        {}", grid.height());

    let tables = extract::extract(&grid)?;
    println!("Tables extracted: {}", tables.len());
    println!();

    for table in tables.iter() {
        println!("--- {} ---", table.name);
        println!(
            "  Columns ({}): {}",
            table.column_labels.len(),
            table.column_labels.join(", ")
        );
        println!("  Rows ({}):", table.row_labels.len());
        for (label, values) in table.row_labels.iter().zip(&table.values) {
            let rendered: Vec<String> = values
                .iter()
                .map(|v| match v {
                    Some(n) => n.to_string(),
                    None => "<absent>".to_string(),
                })
                .collect();
            println!("    {:<40} | {}", label, rendered.join(", "));
        }
        println!();
    }

    Ok(())
}
