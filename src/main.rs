use anyhow::Context;
use clap::Parser;
use mailbot_launcher::config::{AuditArgs, LauncherCommand, RunArgs};
use mailbot_launcher::core::audit;
use mailbot_launcher::domain::model::InstallOutcome;
use mailbot_launcher::domain::ports::Operator;
use mailbot_launcher::utils::{logger, validation::Validate};
use mailbot_launcher::{
    AutoOperator, ConsoleOperator, LauncherCli, LauncherConfig, LauncherEngine, LauncherError,
    TokioProcessRunner,
};
use std::path::{Path, PathBuf};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = LauncherCli::parse();

    logger::init_cli_logger(cli.global.verbose, cli.global.log_format);
    tracing::debug!("CLI: {:?}", cli);

    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| LauncherCommand::Run(RunArgs::default()));

    let (mut config, source) = match LauncherConfig::discover(cli.global.config.as_deref(), &cwd) {
        Ok(loaded) => loaded,
        Err(e) => fail(&e),
    };
    if let LauncherCommand::Run(run) = &command {
        run.apply_to(&mut config);
    }
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let project_dir =
        config.resolve_project_dir(cli.global.project_dir.as_deref(), source.as_deref(), &cwd);

    let result = match command {
        LauncherCommand::Run(run) if run.no_pause => {
            run_launcher(AutoOperator::new(false), config, project_dir, run).await
        }
        LauncherCommand::Run(run) => {
            run_launcher(ConsoleOperator::new(), config, project_dir, run).await
        }
        LauncherCommand::Audit(args) => run_audit(&config, &project_dir, &cwd, &args),
    };

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => fail(&e),
    }
}

fn fail(e: &LauncherError) -> ! {
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    std::process::exit(e.exit_code());
}

async fn run_launcher<O: Operator>(
    operator: O,
    config: LauncherConfig,
    project_dir: PathBuf,
    run: RunArgs,
) -> Result<i32, LauncherError> {
    let engine = LauncherEngine::new(TokioProcessRunner::new(), operator, config, project_dir)
        .with_extra_args(run.args);

    if run.dry_run {
        tracing::info!("DRY RUN - the bot will not be started");
        let report = engine.check().await?;
        println!("Project:     {}", report.project_dir.display());
        println!("Interpreter: {}", report.resolved_interpreter.display());
        match &report.install {
            InstallOutcome::Installed { manifest } => {
                println!("Dependencies installed from {}", manifest.display())
            }
            InstallOutcome::ManifestMissing { manifest } => {
                println!("No manifest at {}", manifest.display())
            }
            InstallOutcome::Failed { manifest, exit } => println!(
                "Install from {} failed with status {}",
                manifest.display(),
                exit
            ),
        }
        for check in &report.config_checks {
            let state = if check.present { "ok" } else { "MISSING" };
            println!("{:<8} {}", state, check.path.display());
        }
        return Ok(0);
    }

    let summary = engine.run().await?;
    println!(
        "MailBot finished (status {}). Output is in {}",
        summary.launch.exit,
        summary.launch.log_path.display()
    );

    if run.propagate_exit_code {
        return Ok(summary.launch.exit.code.unwrap_or(1));
    }
    Ok(0)
}

fn run_audit(
    config: &LauncherConfig,
    project_dir: &Path,
    cwd: &Path,
    args: &AuditArgs,
) -> Result<i32, LauncherError> {
    let root = match (&args.root, &config.audit.root) {
        (Some(root), _) => cwd.join(root),
        (None, Some(root)) => project_dir.join(root),
        (None, None) => project_dir.to_path_buf(),
    };

    let report = audit::build_report(&root, &config.audit)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", audit::render_text(&report));
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}
