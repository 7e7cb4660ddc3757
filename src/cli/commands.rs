//! Command dispatch: every subcommand loads settings, wires services and prints.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::HierarchyView;
use crate::cli::args::{CampaignArgs, Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{create_branches, TreeNodeConvert};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Campaigns) => _campaigns(cli),
        Some(Commands::Tree { selection }) => _tree(cli, selection),
        Some(Commands::Graph { selection, pretty }) => _graph(cli, selection, *pretty),
        Some(Commands::Branches { selection }) => _branches(cli, selection),
        Some(Commands::Stats { selection }) => _stats(cli, selection),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `teamtree --help`".to_string(),
        )),
    }
}

fn load_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.data_dir.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings)?)
}

/// Load the selected campaigns and compute forest, graph and summary.
fn build_view(cli: &Cli, selection: &CampaignArgs) -> CliResult<HierarchyView> {
    let container = load_container(cli)?;
    let set = container.participants.load(&selection.campaigns)?;
    let exclude = cli
        .exclude
        .as_deref()
        .or(container.settings.exclude_id.as_deref());
    debug!(
        "campaigns: {:?}, exclude: {:?}",
        set.selection.ids(),
        exclude
    );
    let view = container
        .hierarchy
        .build_view(&set.participants, &set.selection, exclude);
    for id in &view.report.orphan_followers {
        debug!("follower without multiplier leader: {}", id);
    }
    Ok(view)
}

#[instrument(skip(cli))]
fn _campaigns(cli: &Cli) -> CliResult<()> {
    let container = load_container(cli)?;
    let campaigns = container.participants.list_campaigns()?;
    if campaigns.is_empty() {
        output::warning(&format!(
            "no campaign files in {}",
            container.participants.data_dir().display()
        ));
        return Ok(());
    }
    for campaign in campaigns {
        output::action(&campaign.id, &campaign.name);
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli, selection: &CampaignArgs) -> CliResult<()> {
    let view = build_view(cli, selection)?;
    output::info(&view.forest.to_tree_string(&view.summary.campaign_label));
    Ok(())
}

#[instrument(skip(cli))]
fn _graph(cli: &Cli, selection: &CampaignArgs, pretty: bool) -> CliResult<()> {
    let view = build_view(cli, selection)?;
    let json = if pretty {
        serde_json::to_string_pretty(&view.graph)
    } else {
        serde_json::to_string(&view.graph)
    }
    .map_err(InfraError::from)?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(cli))]
fn _branches(cli: &Cli, selection: &CampaignArgs) -> CliResult<()> {
    let view = build_view(cli, selection)?;
    let branches = create_branches(&view.forest);
    output::header(&format!("Found {} branches:", branches.len()));
    for branch in branches {
        output::detail(&branch.iter().join(" <- "));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _stats(cli: &Cli, selection: &CampaignArgs) -> CliResult<()> {
    let view = build_view(cli, selection)?;
    let s = &view.summary;
    output::header(&s.campaign_label);
    output::action("multipliers", &s.multipliers);
    output::action("followers", &s.followers);
    output::action("roots", &s.roots);
    output::action("max depth", &s.max_depth);
    if let Some(team) = &s.largest_team {
        output::action(
            "largest team",
            &format!("{} ({}) with {}", team.label, team.id, team.size),
        );
    }
    if s.orphan_followers > 0 {
        output::warning(&format!(
            "{} followers without a multiplier leader",
            s.orphan_followers
        ));
    }
    if s.promoted_cycle_roots > 0 {
        output::warning(&format!(
            "{} multipliers promoted to roots to break leader cycles: {}",
            s.promoted_cycle_roots,
            view.report.promoted_cycle_roots.iter().join(", ")
        ));
    }
    if !view.report.reserved_ids.is_empty() {
        output::warning(&format!(
            "records with reserved id ignored: {}",
            view.report.reserved_ids.iter().join(", ")
        ));
    }
    if s.duplicate_ids > 0 {
        output::warning(&format!(
            "{} duplicate participant ids ignored: {}",
            s.duplicate_ids,
            view.report.duplicate_ids.iter().join(", ")
        ));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.data_dir.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("cannot determine the global config directory".to_string())
            })?;
            init_config(&RealFileSystem, &path, *force)?;
            output::success(&format!("created {}", path.display()));
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", &"(unavailable)"),
            }
            let settings = Settings::load(cli.data_dir.as_deref())?;
            output::action("local", &local_config_path(&settings.data_dir).display());
        }
    }
    Ok(())
}

fn init_config(fs: &dyn FileSystem, path: &Path, force: bool) -> CliResult<()> {
    if fs.exists(path) && !force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
