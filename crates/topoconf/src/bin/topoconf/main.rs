mod cli;

use topoconf::document::{ClusterDocument, ConfigurationReport};
use topoconf::processor::ConfigurationProcessor;
use topoconf::registry::UpdaterRegistry;
use topoconf::topology::ClusterTopology;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TOPOCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!("topoconf: cannot resolve -C/--directory {}: {e}", new_path.display());
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("topoconf: cannot change into {}: {err}", cwd.display());
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let registry = UpdaterRegistry::default();
    let processor = ConfigurationProcessor::new(&registry);

    let command_result = match cli.command {
        cli::Command::Create(command) => create(&processor, command),
        cli::Command::Export(command) => export(&processor, command),
        cli::Command::RequiredGroups(command) => required_groups(&processor, command),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("topoconf: {error}")
        }
        std::process::exit(1);
    }
}

fn create(processor: &ConfigurationProcessor, command: cli::ProcessCommand) -> anyhow::Result<()> {
    let mut topology = load(&command.input)?;
    processor.update_for_cluster_create(&mut topology)?;

    output(&command.output, &ConfigurationReport::from(&topology))
}

fn export(processor: &ConfigurationProcessor, command: cli::ProcessCommand) -> anyhow::Result<()> {
    let mut topology = load(&command.input)?;
    processor.update_for_blueprint_export(&mut topology);

    output(&command.output, &ConfigurationReport::from(&topology))
}

fn required_groups(
    processor: &ConfigurationProcessor,
    command: cli::ProcessCommand,
) -> anyhow::Result<()> {
    let topology = load(&command.input)?;
    let groups = processor.required_host_groups(&topology)?;

    output(&command.output, &groups)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<ClusterTopology> {
    let document = match &input.file {
        Some(file_path) => ClusterDocument::load_file(file_path)?,
        None => {
            let stdin = std::io::read_to_string(std::io::stdin())?;
            ClusterDocument::parse(&stdin, input.format.into())?
        }
    };

    Ok(ClusterTopology::try_from(document)?)
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
