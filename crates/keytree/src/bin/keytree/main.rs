mod cli;

use keytree::key_path::KeyPath;
use keytree::projector::{Properties, TreeProjector};
use keytree::sink::{EventRecorder, EventSink, TreeBuilder};
use serde::Serialize;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("KEYTREE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let command_result = match cli.command {
        cli::Command::Tree(project_cli) => tree(project_cli),
        cli::Command::Events(project_cli) => events(project_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn tree(cli: cli::ProjectCommand) -> anyhow::Result<()> {
    let properties = load(&cli.input)?;

    let mut builder = TreeBuilder::new();
    project(&cli, &properties, &mut builder);

    output(&cli.output, &builder.finish())
}

pub fn events(cli: cli::ProjectCommand) -> anyhow::Result<()> {
    let properties = load(&cli.input)?;

    let mut recorder = EventRecorder::new();
    project(&cli, &properties, &mut recorder);

    output(&cli.output, recorder.events())
}

fn project(cli: &cli::ProjectCommand, properties: &Properties, sink: &mut dyn EventSink) {
    let projector = TreeProjector::new();
    if cli.parent_values {
        projector.process_source(properties, sink);
    } else {
        projector.process(properties, sink);
    }
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Properties> {
    let text = match &input.file {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading file");
            std::fs::read_to_string(path)?
        }
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let properties: Properties = match input.format {
        cli::Format::Json => serde_json::from_str(&text)?,
        cli::Format::Yaml => serde_yaml::from_str(&text)?,
    };

    tracing::debug!(count = properties.len(), "properties loaded");
    Ok(properties)
}

fn output<T: Serialize + ?Sized>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::Format::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::Format::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

#[derive(Serialize)]
struct KeyDiff {
    common: KeyPath,
    difference: KeyPath,
}

/// (keytree-)developer utilities
///
/// A quick way to expose key tokenization for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let output_args = cli::OutputArgs {
        format: cli::Format::Yaml,
    };

    match cli.command {
        Segments { key } => {
            let key = KeyPath::parse(key);
            let segments: Vec<_> = key.iter().collect();
            output(&output_args, &segments)
        }
        Diff { left, right } => {
            let left = KeyPath::parse(left);
            let right = KeyPath::parse(right);
            output(
                &output_args,
                &KeyDiff {
                    common: left.common_key(&right),
                    difference: left.difference_key(&right),
                },
            )
        }
    }
}
