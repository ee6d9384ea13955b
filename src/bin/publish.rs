use anyhow::Context;
use clap::Parser;
use mailbot_launcher::core::publish::{publish, PublishOptions};
use mailbot_launcher::config::toml_config::PublishSection;
use mailbot_launcher::domain::model::PublishReport;
use mailbot_launcher::domain::ports::Operator;
use mailbot_launcher::utils::{logger, validation::Validate};
use mailbot_launcher::{
    AutoOperator, ConsoleOperator, LauncherConfig, LauncherError, PublishCli, TokioProcessRunner,
};
use std::path::Path;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = PublishCli::parse();

    logger::init_cli_logger(args.verbose, args.log_format);

    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let root = cwd.join(&args.dir);

    let (mut config, _) = match LauncherConfig::discover(args.config.as_deref(), &cwd) {
        Ok(loaded) => loaded,
        Err(e) => fail(&e),
    };
    args.apply_to(&mut config.publish);
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let options = PublishOptions {
        assume_yes: args.yes,
        dry_run: args.dry_run,
    };
    let result = if args.yes {
        run_publish(AutoOperator::new(true), &root, &config.publish, &options).await
    } else {
        run_publish(ConsoleOperator::new(), &root, &config.publish, &options).await
    };

    match result {
        Ok(report) => {
            print_report(&report, args.dry_run);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

async fn run_publish<O: Operator>(
    operator: O,
    root: &Path,
    section: &PublishSection,
    options: &PublishOptions,
) -> Result<PublishReport, LauncherError> {
    let runner = TokioProcessRunner::new();
    publish(&runner, &operator, root, section, options).await
}

fn print_report(report: &PublishReport, dry_run: bool) {
    let verb = if dry_run { "Would remove" } else { "Removed" };
    println!("{} {} entries, kept {}", verb, report.removed.len(), report.kept.len());
    for path in &report.removed {
        println!("  - {}", path.display());
    }
    match (&report.commit_message, report.committed) {
        (Some(message), true) => println!("Committed: {}", message),
        (Some(message), false) => println!("Commit message would be: {}", message),
        (None, _) => println!("Nothing to commit"),
    }
    if report.pushed {
        println!("Pushed");
    }
}

fn fail(e: &LauncherError) -> ! {
    tracing::error!("{} (Category: {:?})", e, e.category());
    tracing::error!("Suggestion: {}", e.recovery_suggestion());
    eprintln!("{}", e.user_friendly_message());
    std::process::exit(e.exit_code());
}
