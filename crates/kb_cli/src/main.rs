use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use kb_cli::{run_check, run_compare, run_snapshot, CheckOptions};
use kb_core::EXIT_ENGINE_FAULT;

#[derive(Parser)]
#[command(
    name = "kb-cli",
    version,
    about = "Structural quality gate for knowledge-base corpora"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Check(CheckArgs),
    Snapshot(SnapshotArgs),
    Compare(CompareArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// Corpus root to validate (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Fast mode: run only per-document rules, skipping link resolution and
    /// coverage (which need the full corpus index)
    #[arg(long)]
    fast: bool,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SnapshotArgs {
    /// Corpus root to snapshot (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Baseline slot path (default: <root>/.kb/baseline.json)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct CompareArgs {
    /// Corpus root to compare (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Baseline slot path (default: <root>/.kb/baseline.json)
    #[arg(long, value_name = "PATH")]
    baseline: Option<PathBuf>,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => run_check_cmd(args),
        Commands::Snapshot(args) => run_snapshot_cmd(args),
        Commands::Compare(args) => run_compare_cmd(args),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(EXIT_ENGINE_FAULT);
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn run_check_cmd(args: CheckArgs) -> Result<i32, String> {
    let options = CheckOptions {
        fast: args.fast,
        ..CheckOptions::for_today()
    };
    let outcome = run_check(&args.path, &options).map_err(|err| err.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "issues": outcome.issues,
            "summary": outcome.summary,
            "skipped_rules": outcome.skipped_rules,
            "verdict": outcome.verdict,
            "exit_code": outcome.exit_code,
        }))
        .map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
    } else {
        for issue in &outcome.issues {
            println!(
                "issue severity={} rule={} file={} message={}",
                issue.severity.as_str(),
                issue.rule_id,
                issue.file,
                issue.message
            );
        }
        println!("files_scanned={}", outcome.summary.total_files);
        println!("fails={}", outcome.summary.fail_count);
        println!("warns={}", outcome.summary.warn_count);
        println!("passes={}", outcome.summary.pass_count);
        if !outcome.skipped_rules.is_empty() {
            println!("skipped_rules={}", outcome.skipped_rules.join(","));
        }
        println!("verdict={}", outcome.verdict.as_str());
        println!("exit_code={}", outcome.exit_code);
    }

    Ok(outcome.exit_code)
}

fn run_snapshot_cmd(args: SnapshotArgs) -> Result<i32, String> {
    let outcome = run_snapshot(&args.path, args.out.as_deref(), now_rfc3339())
        .map_err(|err| err.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "slot": outcome.slot.display().to_string(),
            "sha256": outcome.sha256,
            "snapshot": outcome.snapshot,
        }))
        .map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
    } else {
        println!("slot={}", outcome.slot.display());
        println!("sha256={}", outcome.sha256);
        println!("timestamp={}", outcome.snapshot.timestamp);
        println!("total_files={}", outcome.snapshot.total_files);
        println!("total_tokens={}", outcome.snapshot.total_tokens);
        println!("total_lines={}", outcome.snapshot.total_lines);
        println!("total_bytes={}", outcome.snapshot.total_bytes);
        println!("large_files={}", outcome.snapshot.large_files.len());
    }

    Ok(0)
}

fn run_compare_cmd(args: CompareArgs) -> Result<i32, String> {
    let outcome = run_compare(&args.path, args.baseline.as_deref(), now_rfc3339())
        .map_err(|err| err.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "baseline_timestamp": outcome.baseline_timestamp,
            "baseline_sha256": outcome.baseline_sha256,
            "current_timestamp": outcome.current.timestamp,
            "deltas": outcome.deltas,
        }))
        .map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
    } else {
        println!("baseline_timestamp={}", outcome.baseline_timestamp);
        println!("baseline_sha256={}", outcome.baseline_sha256);
        for delta in &outcome.deltas {
            let pct = match delta.pct_change {
                Some(pct) => format!("{:+.1}%", pct),
                None => "new".to_string(),
            };
            println!(
                "delta metric={} baseline={} current={} pct_change={} trend={}",
                delta.metric,
                delta.baseline,
                delta.current,
                pct,
                delta.trend.as_str()
            );
        }
    }

    Ok(0)
}
