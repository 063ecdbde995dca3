use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use patchrun_cli::config::{LoadedRules, RULES_FILE_NAME, generate_init_template, load_rules};
use patchrun_cli::rules::{PatchPlan, compile_plan};
use patchrun_cli::runner::{RunOptions, run_plan};

#[derive(Parser)]
#[command(name = "patchrun")]
#[command(
	author,
	version,
	about = "Apply ordered regex rewrite rules to a batch of source files"
)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Rule file to use instead of discovering .patchrun.toml
	#[arg(short, long, value_name = "FILE", global = true)]
	rules: Option<PathBuf>,

	/// Resolve relative target paths against DIR instead of the rule file's base-dir
	#[arg(long, value_name = "DIR", global = true)]
	base_dir: Option<PathBuf>,

	/// Show what would change without writing any file
	#[arg(long)]
	dry_run: bool,

	/// Keep a <file>.bak copy of each file before replacing it
	#[arg(long)]
	backup: bool,

	/// Create a template .patchrun.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .patchrun.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// Only log errors
	#[arg(short, long, global = true, conflicts_with = "verbose")]
	quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Rule file inspection commands
	Rules {
		#[command(subcommand)]
		action: RulesAction,
	},
}

#[derive(Subcommand)]
enum RulesAction {
	/// Display the compiled plan: each target file and its rules
	Show,
	/// Check the rule file for errors without touching any target
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: u8, quiet: bool) {
	let level = match (quiet, verbose) {
		(true, _) => "error",
		(false, 0) => "warn",
		(false, 1) => "info",
		(false, 2) => "debug",
		(false, _) => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	if let Some(Commands::Rules { action }) = cli.command {
		return match action {
			RulesAction::Show => {
				handle_rules_show(&cwd, cli.rules.as_deref(), cli.base_dir.as_deref())
			}
			RulesAction::Validate => {
				handle_rules_validate(&cwd, cli.rules.as_deref(), cli.base_dir.as_deref())
			}
		};
	}

	let options = RunOptions {
		dry_run: cli.dry_run,
		backup: cli.backup,
	};
	handle_run(&cwd, cli.rules.as_deref(), cli.base_dir.as_deref(), options)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let rules_path = PathBuf::from(RULES_FILE_NAME);

	if rules_path.exists() && !force {
		anyhow::bail!("{RULES_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&rules_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", rules_path.display()))?;

	println!("Created {RULES_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn load_plan(
	cwd: &Path,
	rules: Option<&Path>,
	base_dir: Option<&Path>,
) -> Result<(LoadedRules, PatchPlan)> {
	let loaded = load_rules(rules, cwd).context("Failed to load rule file")?;
	let plan = compile_plan(&loaded, base_dir)
		.with_context(|| format!("Failed to compile rules in {}", loaded.path.display()))?;
	Ok((loaded, plan))
}

fn handle_run(
	cwd: &Path,
	rules: Option<&Path>,
	base_dir: Option<&Path>,
	options: RunOptions,
) -> Result<ExitCode> {
	let (loaded, plan) = load_plan(cwd, rules, base_dir)?;
	tracing::info!(
		rules = %loaded.path.display(),
		files = plan.entries.len(),
		dry_run = options.dry_run,
		"starting batch"
	);

	let report = run_plan(&plan, options);

	for file in &report.files {
		if let Some(ref diff) = file.diff {
			print!("{diff}");
		}
		println!("{}", file.status_line());
	}
	println!();
	println!("{}", report.summary(options.dry_run));

	if report.has_failures() {
		Ok(ExitCode::FAILURE)
	} else {
		Ok(ExitCode::SUCCESS)
	}
}

fn handle_rules_show(
	cwd: &Path,
	rules: Option<&Path>,
	base_dir: Option<&Path>,
) -> Result<ExitCode> {
	let (loaded, plan) = load_plan(cwd, rules, base_dir)?;

	println!("# Source: {}", loaded.path.display());
	println!("# base-dir: {}", plan.base_dir.display());
	println!(
		"# flags: multi-line={} dot-matches-new-line={} case-insensitive={}",
		loaded.rules.flags.multi_line,
		loaded.rules.flags.dot_matches_new_line,
		loaded.rules.flags.case_insensitive
	);
	println!("# files: {}, rules: {}", plan.entries.len(), plan.rule_count());
	println!();

	for (i, patch) in loaded.rules.patches.iter().enumerate() {
		if let Some(ref description) = patch.description {
			println!("# Patch {}: {}", i + 1, description);
		}
	}

	for entry in &plan.entries {
		println!("{}", entry.name);
		for (i, rule) in entry.rules.iter().enumerate() {
			println!("  Rule {}: {}", i + 1, rule);
		}
		println!();
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_rules_validate(
	cwd: &Path,
	rules: Option<&Path>,
	base_dir: Option<&Path>,
) -> Result<ExitCode> {
	match load_plan(cwd, rules, base_dir) {
		Ok((loaded, plan)) => {
			println!(
				"Rule file is valid: {} ({} files, {} rules)",
				loaded.path.display(),
				plan.entries.len(),
				plan.rule_count()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Rule file error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}
