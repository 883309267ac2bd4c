//! Headless report runner over a JSON workbook.
//!
//! ```text
//! virtue-report <workbook.json> [--config <config.json>] <command> [args]
//! ```
//!
//! Writer commands update the workbook file in place. Diagnostic commands
//! print JSON to stdout.
//!
//! Set `RUST_LOG=debug` for build summaries and cache activity.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use virtue_engine::prelude::*;

const USAGE: &str = "\
usage: virtue-report <workbook.json> [--config <config.json>] <command> [args]

commands:
  results                  write the projection to the results sheet
  keys-only                write the four key columns to the results sheet
  raw-table [--stacked]    pivot the data sheet into the raw mission table
  bootstrap-aliases        write identity aliases for every observed label
  solver-summary           write expected drops for the solver flights
  bom <item> <quantity>    write the netted BOM rollup
  best-ships               write the top ships per fuel class
  diag-levels <ship> <duration>
  diag-param <ship> <duration>
  diag-headers
  diag-sample
  diag-coverage
  diag-ships [filter]
  diag-missing-aliases";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let workbook_path = PathBuf::from(args.remove(0));
    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let Some(path) = args.get(i + 1).cloned() else {
                bail!("--config needs a path\n\n{USAGE}");
            };
            args.drain(i..=i + 1);
            EngineConfig::load(Path::new(&path)).with_context(|| format!("loading config {path}"))?
        }
        None => EngineConfig::default(),
    };
    let Some(command) = args.first().cloned() else {
        bail!("missing command\n\n{USAGE}");
    };
    let rest = &args[1..];

    let json = std::fs::read_to_string(&workbook_path)
        .with_context(|| format!("reading workbook {}", workbook_path.display()))?;
    let workbook = MemoryWorkbook::from_json_str(&json).context("decoding workbook")?;
    let cache = CacheLayer::new(Arc::new(MemoryCache::new()));
    let mut engine = Engine::new(workbook, cache, config);

    let written = match command.as_str() {
        "results" => Some(engine.write_results()?),
        "keys-only" => Some(engine.write_results_keys_only()?),
        "raw-table" => {
            let layout = if rest.iter().any(|a| a == "--stacked") {
                HeaderLayout::Stacked
            } else {
                HeaderLayout::Single
            };
            Some(engine.write_raw_mission_table(layout)?)
        }
        "bootstrap-aliases" => Some(engine.write_alias_bootstrap()?),
        "solver-summary" => Some(engine.write_solver_summary()?),
        "best-ships" => Some(engine.write_best_ships()?),
        "bom" => {
            let [item, quantity] = rest else {
                bail!("bom needs <item> <quantity>");
            };
            let quantity: f64 = quantity
                .parse()
                .with_context(|| format!("quantity '{quantity}' is not a number"))?;
            Some(engine.write_bom_rollup(item, quantity)?)
        }
        "diag-levels" => {
            let [ship, duration] = rest else {
                bail!("diag-levels needs <ship> <duration>");
            };
            print_json(&engine.levels_for_pair(ship, duration)?)?;
            None
        }
        "diag-param" => {
            let [ship, duration] = rest else {
                bail!("diag-param needs <ship> <duration>");
            };
            print_json(&engine.param_for_pair(ship, duration)?)?;
            None
        }
        "diag-headers" => {
            print_json(&engine.headers()?)?;
            None
        }
        "diag-sample" => {
            print_json(&engine.sample()?)?;
            None
        }
        "diag-coverage" => {
            print_json(&engine.coverage()?)?;
            None
        }
        "diag-ships" => {
            print_json(&engine.known_ships(rest.first().map(String::as_str))?)?;
            None
        }
        "diag-missing-aliases" => {
            print_json(&engine.missing_aliases()?)?;
            None
        }
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    };

    if let Some(rows) = written {
        let json = engine.workbook().to_json_string().context("encoding workbook")?;
        std::fs::write(&workbook_path, json)
            .with_context(|| format!("writing workbook {}", workbook_path.display()))?;
        println!("{command}: wrote {rows} rows");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
