use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use cairn_codec::{CodecConfig, Container, Decoded, MessageEnvelope, ObjectCodec};
use cairn_repo::Repository;
use cairn_store::{Link, NodeBody};
use cairn_types::ObjectType;

use crate::cli::*;

const DEMO_LEAF: ObjectType = ObjectType::new(1, 1);
const DEMO_NODE: ObjectType = ObjectType::new(2, 1);

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect(args) => cmd_inspect(&args.file, &config, cli.format),
        Command::Unpack(args) => cmd_unpack(&args.file, &config, cli.format),
        Command::Demo(args) => cmd_demo(&args, &config),
        Command::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(CodecConfig::from_toml_str(&text)?)
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_inspect(path: &Path, config: &CodecConfig, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = read_file(path)?;
    let container = Container::from_bytes(&bytes, config)?;

    if format == OutputFormat::Json {
        let elements: Vec<_> = container
            .iter()
            .map(|e| {
                json!({
                    "key": e.key.to_hex(),
                    "type": e.object_type.to_string(),
                    "leaf": e.is_leaf,
                    "size": e.size(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "bytes": bytes.len(), "elements": elements }))?);
        return Ok(());
    }

    println!(
        "{} {} ({} elements, {} bytes)",
        "Container".bold(),
        path.display(),
        container.len(),
        bytes.len()
    );
    for (i, element) in container.iter().enumerate() {
        let role = if i == 0 { "head".green().bold() } else { "item".normal() };
        let kind = if element.is_leaf { "leaf" } else { "node" };
        println!(
            "  {} {}  type {}  {}  {} bytes",
            role,
            element.key.short_hex().yellow(),
            element.object_type.to_string().cyan(),
            kind,
            element.size()
        );
    }
    Ok(())
}

fn cmd_unpack(path: &Path, config: &CodecConfig, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = read_file(path)?;
    let decoded = ObjectCodec::new(config.clone()).unpack(&bytes)?;
    let repo = decoded.repository();
    let commit = repo.head_commit().context("unpacked repository has no commit")?;
    let branch = repo.current_branch()?.unwrap_or_default();
    let excluded: Vec<String> = repo.excluded_types().iter().map(|t| t.to_string()).collect();

    let view = if decoded.is_message() { "message" } else { "root" };

    if format == OutputFormat::Json {
        let mut out = json!({
            "root": decoded.root().key().to_hex(),
            "root_type": decoded.root().object_type().to_string(),
            "commit": commit.id.to_hex(),
            "branch": branch,
            "status": repo.status().to_string(),
            "elements": repo.index().len(),
            "excluded_types": excluded,
            "view": view,
        });
        if let Decoded::Message(view) = &decoded {
            out["message_type"] = json!(view.message_type().map(|t| t.to_string()));
            out["data_bytes"] = json!(view.data().len());
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} Unpacked {}", "✓".green().bold(), path.display());
    println!("  Root: {} (type {})", decoded.root().key().short_hex().yellow(), decoded.root().object_type());
    println!("  Commit: {} \"{}\"", commit.id.short_hex().yellow(), commit.comment);
    println!("  Branch: {}", branch.green());
    println!("  Status: {}", repo.status());
    println!("  Elements: {}", repo.index().len());
    if !excluded.is_empty() {
        println!("  Excluded types: {}", excluded.join(", ").dimmed());
    }
    match &decoded {
        Decoded::Message(view) => {
            let message_type = view.message_type().map(|t| t.to_string()).unwrap_or_else(|| "none".into());
            println!("  View: {} wrapping type {} ({} bytes of data)", "message".cyan(), message_type, view.data().len());
        }
        Decoded::Root(_) => println!("  View: {}", "root".cyan()),
    }
    Ok(())
}

fn cmd_demo(args: &DemoArgs, config: &CodecConfig) -> anyhow::Result<()> {
    let mut repo = build_demo(args.message)?;
    let bytes = ObjectCodec::new(config.clone()).pack(&mut repo, &BTreeSet::new())?;
    std::fs::write(&args.file, &bytes).with_context(|| format!("writing {}", args.file.display()))?;
    let root = repo.root().context("demo repository has no root")?;
    println!(
        "{} Wrote {} ({} bytes, root {})",
        "✓".green().bold(),
        args.file.display(),
        bytes.len(),
        root.short_hex().yellow()
    );
    Ok(())
}

fn cmd_config(config: &CodecConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// R -> {A, B}, A -> C, B -> C, optionally wrapped in a message envelope.
fn build_demo(message: bool) -> anyhow::Result<Repository> {
    let mut repo = Repository::new();
    let c = repo.write_leaf(DEMO_LEAF, b"C: shared leaf".to_vec())?;
    let child = |data: &str| NodeBody::new().with_data(data.as_bytes()).with_link(Link::new(c, DEMO_LEAF));
    let a = repo.write_node(DEMO_NODE, &child("A"))?;
    let b = repo.write_node(DEMO_NODE, &child("B"))?;
    let r = repo.write_node(
        DEMO_NODE,
        &NodeBody::new()
            .with_data(b"R".to_vec())
            .with_link(Link::new(a, DEMO_NODE))
            .with_link(Link::new(b, DEMO_NODE)),
    )?;

    if message {
        MessageEnvelope::new(Link::new(r, DEMO_NODE))
            .with_data(b"demo".to_vec())
            .write(&mut repo)?;
    } else {
        repo.set_root(r)?;
    }
    Ok(repo)
}
