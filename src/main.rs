use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use remove_void_args::{
    CompilationDatabase, FixedCompilationDatabase, JsonCompilationDatabase, RewriteTool,
    RunOutput,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remove-void-args")]
#[command(about = "Rewrite C/C++ `(void)` parameter lists to `()`", long_about = None)]
#[command(version)]
#[command(after_help = "Compiler arguments given after `--` are used for every source \
file instead of reading compile_commands.json from <BUILD_PATH>.")]
struct Cli {
    /// Build directory containing compile_commands.json
    build_path: PathBuf,

    /// Source files to rewrite, as listed in the compilation database
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Compute edits without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Write the computed edits as JSON to this file
    #[arg(long, value_name = "FILE")]
    export_fixes: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cwd = env::current_dir().context("cannot determine current directory")?;
    let (args, fixed) = FixedCompilationDatabase::from_command_line(env::args().collect(), &cwd);
    let cli = Cli::parse_from(args);

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let json;
    let database: &dyn CompilationDatabase = match &fixed {
        Some(fixed) => fixed,
        None => {
            json = JsonCompilationDatabase::load_from_directory(&cli.build_path)
                .with_context(|| {
                    format!(
                        "cannot load compilation database from {}",
                        cli.build_path.display()
                    )
                })?;
            &json
        }
    };

    let output = RewriteTool::new(database, cli.sources.clone()).run()?;

    if let Some(path) = &cli.export_fixes {
        let exported = serde_json::to_string_pretty(&output.edits.to_export())?;
        fs::write(path, exported)
            .with_context(|| format!("cannot write fixes to {}", path.display()))?;
        println!("Exported {} edits to {}", output.edits.len(), path.display());
    }

    if cli.diff {
        show_diffs(&output);
    }

    let failed = if cli.dry_run {
        report_dry_run(&output)
    } else {
        report_save(&output)
    };

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} functions visited", output.functions_seen);
    println!(
        "  {} edits in {} files",
        format!("{}", output.edits.len()).green(),
        output.edits.files().count()
    );
    println!("  {} files failed", format!("{}", failed).red());

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print what would change. Returns the number of files that could not be
/// rewritten in memory.
fn report_dry_run(output: &RunOutput) -> usize {
    println!("{}", "[DRY RUN - no files modified]".cyan());
    let mut failed = 0;
    for (file, result) in output.preview() {
        match result {
            Ok(preview) => println!(
                "{} {}: would rewrite {} functions",
                "✓".green(),
                file.display(),
                preview.rewrite.applied()
            ),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                failed += 1;
            }
        }
    }
    failed
}

/// Write every file and report per-file outcomes. Returns the failure count.
fn report_save(output: &RunOutput) -> usize {
    let mut failed = 0;
    for (file, result) in output.save() {
        match result {
            Ok(rewrite) if rewrite.applied() == 0 => {
                println!("{} {}: already rewritten", "⊙".yellow(), file.display());
            }
            Ok(rewrite) => {
                println!(
                    "{} {}: rewrote {} functions",
                    "✓".green(),
                    file.display(),
                    rewrite.applied()
                );
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                failed += 1;
            }
        }
    }
    failed
}

fn show_diffs(output: &RunOutput) {
    for (file, result) in output.preview() {
        if let Ok(preview) = result {
            if preview.original != preview.rewrite.text {
                display_diff(&file, &preview.original, &preview.rewrite.text);
            }
        }
    }
}

/// Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
    }
}
