//! Command dispatch
//!
//! Each command loads settings, applies its flags on top and calls into the
//! application layer. Output goes through [`crate::cli::output`].

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{moving_mean_std, simulate, simulate_batch, SimulationReport};
use crate::cli::args::{Cli, Commands, ConfigCommands, WorldArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    ensure_satisfiable, fill_positional, ComboTree, EvaluationOutcome, ToTermTree, World,
};
use crate::infrastructure::di::ServiceContainer;

/// Run the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };
    let config_dir = cli.config_dir.as_deref();

    match command {
        Commands::Simulate {
            world,
            seed,
            iterations,
            trace,
            allow_unsatisfiable,
            seeds,
            window,
        } => {
            let mut settings = settings_with_world(config_dir, world)?;
            if let Some(seed) = seed {
                settings.seed = *seed;
            }
            if let Some(iterations) = iterations {
                settings.iterations = *iterations;
            }
            settings.trace |= *trace;
            settings.allow_unsatisfiable |= *allow_unsatisfiable;

            if seeds.is_empty() {
                cmd_simulate(settings, *window)
            } else {
                cmd_simulate_batch(settings, seeds)
            }
        }
        Commands::Validate { world } => cmd_validate(settings_with_world(config_dir, world)?),
        Commands::Tree { world, prune } => {
            cmd_tree(settings_with_world(config_dir, world)?, prune)
        }
        Commands::Config { command } => cmd_config(config_dir, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn settings_with_world(config_dir: Option<&Path>, world: &WorldArgs) -> CliResult<Settings> {
    let mut settings = Settings::load(config_dir)?;
    if let Some(path) = &world.world {
        settings.world_file = Some(path.clone());
    }
    if let Some(path) = &world.preferences {
        settings.preferences_file = Some(path.clone());
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

#[instrument(skip(settings), fields(seed = settings.seed, iterations = settings.iterations))]
fn cmd_simulate(settings: Settings, window: Option<usize>) -> CliResult<()> {
    let trace = settings.trace;
    let iterations = settings.iterations;
    let container = ServiceContainer::new(settings);
    let mut dm = container.dungeon_master()?;

    let report = simulate(&mut dm, iterations, false)?;

    if trace {
        print_rounds(dm.world(), &report);
    }
    output::action(
        "acceptance rate",
        &format!(
            "{:.3} ({} of {} rounds)",
            report.acceptance_rate(),
            report.results.iter().filter(|r| r.is_accepted()).count(),
            report.len()
        ),
    );
    if let Some(window) = window {
        let (means, stds) = moving_mean_std(&report.outcome_values(), window);
        output::header(&format!("moving acceptance (window {window})"));
        for (i, (mean, std)) in means.iter().zip(&stds).enumerate() {
            output::detail(&format!("{:>4}  {:.3} ± {:.3}", i + window, mean, std));
        }
    }
    Ok(())
}

fn print_rounds(world: &World, report: &SimulationReport) {
    for record in report.records() {
        let context = fill_positional(&world.context_format, record.context.values());
        let offer = fill_positional(&world.offer_format, &record.offer.values()[..]);
        let line = format!("{} {}", context, offer);
        match record.outcome {
            EvaluationOutcome::Accepted => output::accepted(&line, record.outcome),
            EvaluationOutcome::Rejected | EvaluationOutcome::InvalidOffer => {
                output::rejected(&line, record.outcome)
            }
        }
    }
}

fn cmd_simulate_batch(settings: Settings, seeds: &[u64]) -> CliResult<()> {
    let iterations = settings.iterations;
    let allow_unsatisfiable = settings.allow_unsatisfiable;
    let world = ServiceContainer::new(settings).load_world()?;

    let reports = simulate_batch(&world, seeds, iterations, allow_unsatisfiable)?;

    output::header(&format!("{} runs of {} rounds", reports.len(), iterations));
    for (seed, report) in &reports {
        output::detail(&format!("seed {:>6}  {:.3}", seed, report.acceptance_rate()));
    }
    let mean = reports
        .iter()
        .map(|(_, r)| r.acceptance_rate())
        .sum::<f64>()
        / reports.len().max(1) as f64;
    output::action("mean acceptance rate", &format!("{mean:.3}"));
    Ok(())
}

fn cmd_validate(settings: Settings) -> CliResult<()> {
    let world = ServiceContainer::new(settings).load_world()?;

    ensure_satisfiable(
        &world.context_categories.lists(),
        &world.preferences,
        false,
    )?;

    output::success("All contexts can be satisfied by the given preferences.");
    Ok(())
}

fn cmd_tree(settings: Settings, prune: &[String]) -> CliResult<()> {
    let world = ServiceContainer::new(settings).load_world()?;

    let tree = prune.iter().fold(
        ComboTree::build(&world.context_categories.lists())?,
        |tree, item| tree.without_value(item),
    );

    output::info(&tree.to_tree_string());
    output::detail(&format!(
        "{} leaves, {} levels{}",
        tree.leaf_count(),
        tree.levels(),
        if prune.is_empty() {
            String::new()
        } else {
            format!(", pruned: {}", prune.iter().join(", "))
        }
    ));
    Ok(())
}

fn cmd_config(config_dir: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(config_dir)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory for this platform"),
            }
            let local = local_config_path(config_dir.unwrap_or_else(|| Path::new(".")));
            output::action("local", &local.display());
        }
    }
    Ok(())
}
