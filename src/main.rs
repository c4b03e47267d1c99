use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tabular_anon::cli::{check_technique, Cli, Commands};
use tabular_anon::output::{self, RunReport};
use tabular_anon::{logging, pipeline, readers, AnonymizationConfig, Result};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            out,
            report,
            recode_out,
            verbose,
            quiet,
        } => {
            logging::init_logging(verbose, quiet)?;

            let config = AnonymizationConfig::from_file(&config)?;
            let table = config.apply_roles(&readers::read_table(&input)?)?;
            let outcome = pipeline::run(&table, &config.technique)?;

            // Write sidekick recode file if any pseudonymization was done
            if outcome.recodings.has_recodings() {
                let sidekick_path = recode_out.unwrap_or_else(|| input.with_extension("recode.txt"));
                std::fs::write(&sidekick_path, outcome.recodings.generate_sidekick_content())?;
                eprintln!("Recode mapping written to: {}", sidekick_path.display());
            }

            if let Some(out_path) = out {
                output::write_table_file(&outcome.table, &out_path)?;
                eprintln!("Anonymized table written to: {}", out_path.display());
            } else {
                output::write_table_stdout(&outcome.table)?;
            }

            let run_report = RunReport::new(&outcome, table.len(), file_name(&input));
            if let Some(report_path) = report {
                output::write_json_file(&run_report, &report_path)?;
                eprintln!("Report written to: {}", report_path.display());
            }
            for verdict in &run_report.verdicts {
                eprintln!(
                    "{}: {} ({} record(s) dropped)",
                    verdict.stage,
                    if verdict.verdict.is_satisfied() { "satisfied" } else { "violated" },
                    verdict.dropped_records
                );
            }

            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            input,
            quasi,
            sensitive,
            k,
            l,
            t,
            verbose,
            quiet,
        } => {
            logging::init_logging(verbose, quiet)?;

            let technique = check_technique(&quasi, sensitive.as_deref(), k, l, t)?;
            let table = readers::read_table(&input)?;
            let outcome = pipeline::run(&table, &technique)?;

            let run_report = RunReport::new(&outcome, table.len(), file_name(&input));
            output::write_json_stdout(&run_report)?;

            if run_report.all_satisfied {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
