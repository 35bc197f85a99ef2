//! Command dispatch: settings are loaded per command, results go to stdout or a file.

use std::fs;
use std::io;

use chrono::Utc;
use clap::CommandFactory;
use clap_complete::generate;
use termtree::Tree;
use tracing::{debug, info, instrument};

use crate::application::services::{BenchmarkService, TreeGenerator, TreeStore};
use crate::application::{ApplicationResult, Reporter};
use crate::cli::args::{BenchArgs, Cli, Commands, ConfigCommands, TreeArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{self, RandomShapeConfig, Settings};
use crate::domain::{NodeId, TreeShape};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Bench(args)) => cmd_bench(cli, args),
        Some(Commands::Tree(args)) => cmd_tree(args),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    Ok(Settings::load(cli.config.as_deref())?)
}

/// Fold command line overrides into the loaded settings.
pub fn apply_bench_args(settings: &mut Settings, args: &BenchArgs) -> CliResult<()> {
    let bench = &mut settings.benchmark;
    if let Some(branching) = args.branching {
        bench.branching = branching;
    }
    if !args.depths.is_empty() {
        bench.depths = args.depths.clone();
    }
    if let Some(range) = &args.random {
        let [min_branching, max_branching] = range.as_slice() else {
            return Err(CliError::InvalidArgs(
                "--random expects MIN,MAX".to_string(),
            ));
        };
        let seed = args
            .seed
            .or_else(|| bench.random.as_ref().map(|r| r.seed))
            .unwrap_or_else(|| RandomShapeConfig::default().seed);
        bench.random = Some(RandomShapeConfig {
            min_branching: *min_branching,
            max_branching: *max_branching,
            seed,
        });
    }
    if let Some(mode) = args.delete_mode {
        bench.delete_mode = mode;
    }
    if args.no_delete {
        bench.measure_deletion = false;
    }
    if args.parallel {
        bench.parallel = true;
    }

    let report = &mut settings.report;
    if let Some(format) = args.format {
        report.format = format;
    }
    if args.per_node {
        report.per_node = true;
    }
    if let Some(output) = &args.output {
        report.output = Some(output.clone());
    }

    if settings.benchmark.depths.is_empty() {
        return Err(CliError::Usage("no depths configured".to_string()));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_bench(cli: &Cli, args: &BenchArgs) -> CliResult<()> {
    let mut settings = load_settings(cli)?;
    apply_bench_args(&mut settings, args)?;
    debug!("effective settings: {:?}", settings);

    let shapes = settings.shapes();
    let service = BenchmarkService::new(settings.benchmark_options());
    let runs = service.run_all(&shapes)?;
    info!("finished {} configuration(s)", runs.len());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    let reporter = Reporter::new();
    let report = reporter.render(
        &runs,
        settings.report.format,
        settings.report.per_node,
        &reporter.run_header(&host, Utc::now()),
    );

    match &settings.report.output {
        Some(path) => {
            fs::write(path, report).map_err(|e| {
                InfraError::io(format!("write report to {}", path.display()), e)
            })?;
            output::action("Wrote", &path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

#[instrument]
fn cmd_tree(args: &TreeArgs) -> CliResult<()> {
    let mut store = TreeStore::in_memory();
    TreeGenerator::new(TreeShape::uniform(args.branching, args.depth)).generate(&mut store)?;

    if let Some(pair) = &args.move_to {
        let [node, parent] = pair.as_slice() else {
            return Err(CliError::InvalidArgs(
                "--move expects NODE,NEW_PARENT".to_string(),
            ));
        };
        let new_parent = (*parent != 0).then(|| NodeId::new(*parent));
        store.reparent(NodeId::new(*node), new_parent)?;
        output::action("Moved", &format!("{node} -> {parent}"));
    }
    if let Some(id) = args.delete {
        let removed = store.delete_node(NodeId::new(id), args.mode)?;
        output::action(
            "Deleted",
            &format!("{} node(s) ({})", removed.len(), args.mode),
        );
    }

    store.verify()?;
    for root in store
        .node_ids()
        .into_iter()
        .filter(|&id| store.node(id).map(|n| n.is_root()).unwrap_or(false))
    {
        output::info(&render_tree(&store, root)?);
    }
    Ok(())
}

/// Render the subtree below `id` as `label [#id]` lines.
pub fn render_tree(store: &TreeStore, id: NodeId) -> ApplicationResult<Tree<String>> {
    let node = store.node(id)?;
    let leaves = store
        .closure()
        .children(id)?
        .into_iter()
        .map(|child| render_tree(store, child))
        .collect::<ApplicationResult<Vec<_>>>()?;
    Ok(Tree::new(format!("{} [#{}]", node.display_label(), id)).with_leaves(leaves))
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config files (lowest to highest precedence)");
            match config::global_config_path() {
                Some(path) => output::detail(&format!(
                    "global: {} {}",
                    path.display(),
                    exists_marker(path.exists())
                )),
                None => output::warning("no home directory, global config disabled"),
            }
            let local = cli.config.clone().unwrap_or_else(config::local_config_path);
            output::detail(&format!(
                "local:  {} {}",
                local.display(),
                exists_marker(local.exists())
            ));
            output::detail("env:    CLOSURE_TREE__<SECTION>__<KEY>");
        }
    }
    Ok(())
}

fn exists_marker(exists: bool) -> &'static str {
    if exists {
        "(found)"
    } else {
        "(not found)"
    }
}
