use anyhow::{Context, Result};
use marginalia_config::Config;
use marginalia_engine::{DocumentTree, Highlighter, NodeSpec};
use std::cell::Cell;
use std::rc::Rc;
use std::{env, fs, path::PathBuf, process};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "<document.json> [anchors.json] [--verbose]";

fn init_logging(verbose: bool) {
    // RUST_LOG wins over the flag
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,marginalia_cli={level},marginalia_engine={level},marginalia_config={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_document(path: &PathBuf) -> Result<DocumentTree> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document '{}'", path.display()))?;
    let spec: NodeSpec = serde_json::from_str(&content)
        .with_context(|| format!("Document '{}' is not a valid node tree", path.display()))?;
    Ok(DocumentTree::from_spec(&spec)?)
}

fn read_anchors(path: &PathBuf) -> Result<Vec<serde_json::Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read anchors '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Anchors '{}' must be a JSON array", path.display()))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| *a != "--verbose").collect();
    init_logging(verbose);

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (document_path, anchors_path) = match positional.as_slice() {
        [document] => match &config.anchors_path {
            Some(anchors) => (PathBuf::from(document.as_str()), anchors.clone()),
            None => {
                eprintln!("Error: No anchors file given and none configured");
                eprintln!("Usage: {} {USAGE}", args[0]);
                eprintln!(
                    "Or set anchors_path in {}",
                    Config::config_path().display()
                );
                process::exit(1);
            }
        },
        [document, anchors] => (PathBuf::from(document.as_str()), PathBuf::from(anchors.as_str())),
        _ => {
            eprintln!("Usage: {} {USAGE}", args[0]);
            process::exit(1);
        }
    };

    let mut tree = read_document(&document_path)?;
    let anchors = read_anchors(&anchors_path)?;

    let mut options = config.highlight.to_options();
    options.verbose |= verbose;
    let mut highlighter = Highlighter::new(options);
    let failures = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&failures);
    highlighter.on_diagnostic(move |_| counter.set(counter.get() + 1));

    let rendered = highlighter.restore_json(&mut tree, &anchors);
    info!(
        stored = anchors.len(),
        rendered = rendered.len(),
        failed = failures.get(),
        "restored highlights"
    );

    println!("{}", tree.to_markup(tree.root()));
    Ok(())
}
