//! docxmerge CLI
//!
//! 対象ディレクトリ内のすべてのスプレッドシート（*.xlsx）と
//! テンプレート文書（*.docx）に対して差し込み処理を実行する
//! コマンドラインツール。

use std::process;

use docxmerge::{DocxMergeError, MergeReport, MergerBuilder};

fn main() {
    // RUST_LOG未設定時はinfoレベルで進捗を表示する
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut dir = ".".to_string();
    let mut output_dir: Option<String> = None;
    let mut json = false;
    let mut dir_given = false;

    // Parse options
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output-dir" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --output-dir requires a value");
                    process::exit(1);
                }
                output_dir = Some(args[i + 1].clone());
                i += 2;
            }
            "--json" => {
                json = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage(&args[0]);
                process::exit(1);
            }
            arg => {
                if dir_given {
                    eprintln!("Error: Multiple directories given: '{}' and '{}'", dir, arg);
                    process::exit(1);
                }
                dir = arg.to_string();
                dir_given = true;
                i += 1;
            }
        }
    }

    match run(&dir, output_dir.as_deref(), json) {
        Ok(report) => {
            // 1つも生成できなかった実行は失敗として扱う
            if !report.is_success() {
                process::exit(1);
            }
        }
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn run(dir: &str, output_dir: Option<&str>, json: bool) -> Result<MergeReport, DocxMergeError> {
    let mut builder = MergerBuilder::new();
    if let Some(name) = output_dir {
        builder = builder.with_output_dir(name);
    }
    let merger = builder.build()?;

    let report = merger.merge_directory(dir)?;

    if json {
        let serialized = serde_json::to_string_pretty(&report)
            .map_err(|e| DocxMergeError::Config(format!("Failed to serialize report: {}", e)))?;
        println!("{}", serialized);
    } else {
        print_summary(&report);
    }

    Ok(report)
}

fn print_summary(report: &MergeReport) {
    println!("Generated {} document(s)", report.success_count());
    for (index, name) in report.produced.iter().enumerate() {
        println!("  {:2}. {}", index + 1, name);
    }

    if !report.skipped.is_empty() {
        println!("Skipped {} spreadsheet(s):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  - {}: {}", skipped.spreadsheet, skipped.reason);
        }
    }

    if !report.failures.is_empty() {
        println!("Failed {} pair(s):", report.failures.len());
        for failure in &report.failures {
            println!(
                "  - {} x {}: {}",
                failure.record_key, failure.template, failure.reason
            );
        }
    }

    if !report.is_success() {
        println!("No documents were generated; check the input files");
    }
}

fn handle_error(error: DocxMergeError) {
    eprintln!("Error: {}", error);
    if let DocxMergeError::MissingInput(_) = error {
        eprintln!(
            "Hint: the target directory must contain at least one .xlsx and one .docx file"
        );
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [DIR] [options]", program);
    eprintln!();
    eprintln!("Reads every *.xlsx spreadsheet in DIR (default: current directory),");
    eprintln!("and for each data row generates a copy of every *.docx template with");
    eprintln!("placeholder tokens ({{field}}, {{{{field}}}}, [field], <field>) replaced.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output-dir <name>  Name of the output directory (default: generated)");
    eprintln!("  --json               Print the merge report as JSON");
    eprintln!("  -h, --help           Show this help");
}
