//! signguard CLI
//!
//! Fail-fast release-signing guard for Android Gradle builds.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use signguard_android::credentials::{self, RedactedCredentials};
use signguard_android::gradle::GradleProject;
use signguard_android::intent::{self, BuildIntent, BuildVariant};
use signguard_android::{ReleaseSigningValidator, SigningConfig, SigningCredentials, SigningError};
use signguard_cli::output::{format_count, format_duration, Status};
use signguard_core::config::{Config, ResolvedPaths};
use signguard_core::error::exit_codes;
use signguard_core::process::command_exists;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signguard")]
#[command(about = "Fail-fast release-signing guard for Android Gradle builds")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Android project directory (overrides [project] root)
    #[arg(long, global = true, env = "SIGNGUARD_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the requested Gradle tasks may run
    Check {
        /// Requested Gradle task names
        tasks: Vec<String>,
        /// Also require the keystore file to exist
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved signing configuration (passwords masked)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build after checking release signing
    Build {
        /// Build configuration: debug, release
        #[arg(long, default_value = "debug")]
        configuration: BuildVariant,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Clean before building
        #[arg(long)]
        clean: bool,
    },

    /// Write the credentials file from ANDROID_* environment variables
    Init {
        /// Replace an existing credentials file
        #[arg(long)]
        force: bool,
    },

    /// Diagnose the signing setup
    Doctor,
}

/// Everything a command needs, resolved once per invocation
struct Context {
    config: Config,
    paths: ResolvedPaths,
    validator: ReleaseSigningValidator,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    Status::set_quiet(cli.quiet);
    init_tracing(cli.verbose, !cli.no_color);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let ctx = match load_context(&cli, &cwd) {
        Ok(ctx) => ctx,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    let exit_code = match cli.command {
        Commands::Check { tasks, strict, json } => run_check(&ctx, &tasks, strict, json)?,
        Commands::Show { json } => run_show(&ctx, json)?,
        Commands::Build {
            configuration,
            bundle,
            clean,
        } => run_build(&ctx, configuration, bundle, clean),
        Commands::Init { force } => run_init(&ctx, force)?,
        Commands::Doctor => run_doctor(&ctx),
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: u8, color: bool) {
    use std::io::IsTerminal;

    let level = match verbose {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color && std::io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .init();
}

fn load_context(cli: &Cli, cwd: &std::path::Path) -> signguard_core::Result<Context> {
    let config = Config::load(cli.config.as_deref(), cwd)?;
    let paths = config.resolve(cli.project_dir.as_deref(), cwd)?;
    let validator = ReleaseSigningValidator::from_config(&paths, &config.schema);
    tracing::debug!(
        config = ?config.path,
        properties = %paths.properties_file.display(),
        "context resolved"
    );
    Ok(Context {
        config,
        paths,
        validator,
    })
}

/// Print a signing failure and pick the exit code
fn print_failure(err: &SigningError) -> i32 {
    match err {
        SigningError::MissingCredentials(missing) => Status::fatal_block(&missing.to_string()),
        other => Status::error(&other.to_string()),
    }
    err.exit_code()
}

/// Like [`print_failure`], as a JSON error report when `json` is set
fn report_failure(err: SigningError, json: bool) -> Result<i32> {
    if !json {
        return Ok(print_failure(&err));
    }
    let code = err.exit_code();
    let report = err.into_report_error().to_report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(code)
}

#[derive(Serialize)]
struct CheckReport<'a> {
    ok: bool,
    intent: &'a BuildIntent,
    credentials_file: PathBuf,
    credentials_file_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    signing: Option<RedactedCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keystore: Option<PathBuf>,
}

fn run_check(ctx: &Context, tasks: &[String], strict: bool, json: bool) -> Result<i32> {
    let validator = &ctx.validator;
    let plan = match validator.prepare(tasks) {
        Ok(plan) => plan,
        Err(e) => return report_failure(e, json),
    };

    let keystore = match (strict, plan.release_signing()) {
        (true, Some(creds)) => match validator.verify_keystore(creds) {
            Ok(path) => Some(path),
            Err(e) => return report_failure(e, json),
        },
        _ => None,
    };

    if json {
        let report = CheckReport {
            ok: true,
            intent: &plan.intent,
            credentials_file: validator.expected_path(),
            credentials_file_exists: validator.credentials_file_exists(),
            signing: plan
                .release_signing()
                .map(|c| c.redacted(validator.store_base_dir())),
            keystore,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(exit_codes::SUCCESS);
    }

    match (&plan.intent, plan.release_signing()) {
        (BuildIntent::Release { tasks: matched }, Some(creds)) => {
            Status::success(&format!(
                "Release signing configured for {} (key '{}')",
                matched.join(", "),
                creds.key_alias
            ));
            if let Some(path) = keystore {
                Status::success(&format!("Keystore found: {}", path.display()));
            }
        }
        _ => {
            if tasks.is_empty() {
                Status::info("No tasks given; nothing to enforce");
            } else {
                Status::success("No release task requested; release signing not required");
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}

fn run_show(ctx: &Context, json: bool) -> Result<i32> {
    let validator = &ctx.validator;
    let creds = match validator.resolve_signing_config() {
        Ok(SigningConfig::Present(creds)) => creds,
        Ok(SigningConfig::Absent) => {
            Status::warning(&format!(
                "No signing credentials at {}",
                validator.expected_path().display()
            ));
            return Ok(exit_codes::FAILURE);
        }
        Err(e) => return report_failure(e, json),
    };

    let view = creds.redacted(validator.store_base_dir());
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(exit_codes::SUCCESS);
    }

    Status::header("Release signing");
    Status::field("file", &validator.expected_path().display().to_string());
    Status::field("keyAlias", &view.key_alias);
    Status::field("keyPassword", view.key_password);
    Status::field("storeFile", &view.store_file.display().to_string());
    Status::field("resolved", &view.resolved_store_file.display().to_string());
    Status::field("storePassword", view.store_password);
    Ok(exit_codes::SUCCESS)
}

fn run_build(ctx: &Context, configuration: BuildVariant, bundle: bool, clean: bool) -> i32 {
    let project = GradleProject::from_paths(&ctx.paths);

    let mut tasks = Vec::new();
    if clean {
        tasks.push("clean".to_string());
    }
    tasks.push(intent::task_for(configuration, bundle));

    Status::info(&format!(
        "Building {} {}...",
        configuration,
        if bundle { "bundle" } else { "APK" }
    ));

    let started = Instant::now();
    match project.run_guarded(&ctx.validator, &tasks) {
        Ok(build) => {
            let signing = if build.signed { "release-signed" } else { "unsigned by signguard" };
            Status::success(&format!(
                "Build succeeded in {} ({})",
                format_duration(started.elapsed()),
                signing
            ));
            exit_codes::SUCCESS
        }
        Err(e) => print_failure(&e),
    }
}

fn run_init(ctx: &Context, force: bool) -> Result<i32> {
    let path = &ctx.paths.properties_file;
    if path.exists() && !force {
        Status::error(&format!(
            "{} already exists; pass --force to replace it",
            path.display()
        ));
        return Ok(exit_codes::FAILURE);
    }

    let creds = match SigningCredentials::from_lookup(|var| std::env::var(var).ok()) {
        Ok(creds) => creds,
        Err(e) => {
            Status::error(&e.message);
            Status::info(&format!(
                "Export {}, {}, {} and {} (e.g. from {})",
                credentials::env_vars::KEY_ALIAS,
                credentials::env_vars::KEY_PASSWORD,
                credentials::env_vars::STORE_FILE,
                credentials::env_vars::STORE_PASSWORD,
                ctx.config.schema.remediation.ci_reference
            ));
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = format!(
        "# Release signing credentials. Do not commit this file.\n{}",
        creds.to_properties()
    );
    write_private(path, &text).with_context(|| format!("Failed to write {}", path.display()))?;

    // Read it back through the same path a build uses.
    if let Err(e) = ctx.validator.load_credentials() {
        return Ok(print_failure(&e));
    }

    Status::success(&format!("Wrote {}", path.display()));
    if let Err(e) = ctx.validator.verify_keystore(&creds) {
        Status::warning(&e.to_string());
    }
    Ok(exit_codes::SUCCESS)
}

/// Write a file readable only by its owner.
///
/// The mode is set at creation; a replaced file is narrowed before any
/// bytes are written.
fn write_private(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(text.as_bytes())?;
    file.sync_all()
}

fn run_doctor(ctx: &Context) -> i32 {
    let validator = &ctx.validator;
    let mut issues = 0;

    println!(
        "{}",
        "Signing Setup Check".if_supports_color(Stream::Stdout, |t| t.bold())
    );
    println!();

    match &ctx.config.path {
        Some(path) => Status::success(&format!("config: {}", path.display())),
        None => Status::info("config: none found, using defaults"),
    }

    if ctx.paths.project_root.is_dir() {
        Status::success(&format!("project: {}", ctx.paths.project_root.display()));
    } else {
        Status::error(&format!("project: {} not found", ctx.paths.project_root.display()));
        issues += 1;
    }

    if GradleProject::from_paths(&ctx.paths).wrapper_exists() {
        Status::success(&format!("gradle wrapper: {}", ctx.paths.gradle_wrapper.display()));
    } else {
        Status::warning(&format!(
            "gradle wrapper: {} not found",
            ctx.paths.gradle_wrapper.display()
        ));
        issues += 1;
    }

    let release_tasks: Vec<&str> = validator.release_tasks().names().collect();
    Status::info(&format!("release tasks: {}", release_tasks.join(", ")));

    match validator.resolve_signing_config() {
        Ok(SigningConfig::Present(creds)) => {
            Status::success(&format!(
                "credentials: {} (key '{}')",
                validator.expected_path().display(),
                creds.key_alias
            ));
            match validator.verify_keystore(&creds) {
                Ok(path) => Status::success(&format!("keystore: {}", path.display())),
                Err(e) => {
                    Status::error(&format!("keystore: {}", e));
                    issues += 1;
                }
            }
        }
        Ok(SigningConfig::Absent) => {
            Status::warning(&format!(
                "credentials: {} not found; release builds will be refused",
                validator.expected_path().display()
            ));
            issues += 1;
        }
        Err(e) => {
            Status::error(&format!("credentials: {}", e));
            issues += 1;
        }
    }

    if command_exists("keytool") {
        Status::success("keytool: installed");
    } else {
        Status::warning("keytool: not found (needed to create a keystore)");
    }

    println!();
    if issues == 0 {
        Status::success("Release signing is ready");
        exit_codes::SUCCESS
    } else {
        Status::warning(&format!("Found {}", format_count(issues, "issue", "issues")));
        exit_codes::FAILURE
    }
}
