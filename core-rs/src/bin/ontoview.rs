//! ontoview - browse and edit ontology sources from the command line
//!
//! State lives under the configured data directory: the quad store and
//! settings.json (sources, scopes, token).

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ontoview_core::drivers::{AuthProvider, OAuthProxyDriver, RemoteSources};
use ontoview_core::workspace::{load_token, save_token};
use ontoview_core::{JsonFileStore, KeyValueStore, OntologyWorkspace, ResourceTreeNode, WorkspaceConfig};

#[derive(Parser)]
#[command(name = "ontoview")]
#[command(version)]
#[command(about = "Browse and edit OWL/RDFS ontologies kept in Turtle files", long_about = None)]
struct Cli {
    /// Path to ontoview.yaml (defaults to ./ontoview.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an ontology source (GitHub blob URL or plain URL) and load it
    Add { url: String },
    /// Remove a source together with its graph
    Remove { url: String },
    /// List sources and their load state
    List {
        #[arg(long)]
        json: bool,
    },
    /// Re-fetch a source, or every source with --all
    Reload {
        url: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Show or hide a source in the trees
    Toggle { url: String },
    /// Print a derived tree over the visible sources
    Tree {
        #[arg(value_enum)]
        kind: TreeKind,
        #[arg(long)]
        json: bool,
    },
    /// Print the display label of an IRI
    Label { iri: String },
    /// Print everything known about an IRI
    Show { iri: String },
    /// Autocomplete IRIs and labels
    Suggest {
        text: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Write a source's graph as Turtle
    Serialize {
        url: String,
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Serialize a source and commit it to GitHub
    Commit {
        url: String,
        #[arg(long, short = 'm')]
        message: String,
    },
    /// Exchange an OAuth code (or refresh the stored token) through the OAuth proxy
    Login {
        #[arg(long, conflicts_with = "refresh")]
        code: Option<String>,
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TreeKind {
    Classes,
    Properties,
    Decomposition,
    Individuals,
}

type Workspace = OntologyWorkspace<RemoteSources>;

fn open_workspace(config: &WorkspaceConfig, settings: Arc<dyn KeyValueStore>) -> anyhow::Result<Workspace> {
    let token = match &config.github.token {
        Some(token) => Some(token.clone()),
        None => load_token(settings.as_ref())?.map(|t| t.access_token),
    };
    let drivers = RemoteSources::new(&config.github.api_url, &config.github.user_agent, token)?;
    let workspace = OntologyWorkspace::open(config, settings, drivers)
        .with_context(|| format!("opening workspace in {}", config.data_dir.display()))?;
    Ok(workspace)
}

fn print_tree(nodes: &[ResourceTreeNode], depth: usize) {
    for node in nodes {
        println!(
            "{}{} {}",
            "  ".repeat(depth),
            node.label.bold(),
            format!("({})", node.prefixed_iri).dimmed()
        );
        print_tree(&node.children, depth + 1);
    }
}

fn print_sources(workspace: &Workspace) {
    println!("\n{:<8} {:<8} {:<48} {}", "VISIBLE", "LOADED", "GRAPH", "URL");
    println!("{}", "-".repeat(120));
    for source in workspace.sources() {
        let visible = if source.visible { "yes".green() } else { "no".dimmed() };
        let loaded = if source.loaded { "yes".green() } else { "no".red() };
        println!(
            "{:<8} {:<8} {:<48} {}",
            visible,
            loaded,
            source.graph.as_deref().unwrap_or("-"),
            source.url
        );
        if let Some(error) = &source.error {
            println!("         {} {}", "error:".red(), error);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ONTOVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = WorkspaceConfig::resolve(cli.config.as_deref())?;
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
    let settings: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(config.settings_path())?);

    if let Commands::Login { code, refresh } = &cli.command {
        let Some(proxy) = &config.oauth.proxy_url else {
            bail!("no OAuth proxy configured (set oauth.proxyUrl or ONTOVIEW_OAUTH_PROXY)");
        };
        let auth = OAuthProxyDriver::new(proxy)?;
        let tokens = match (code, refresh) {
            (Some(code), _) => auth.exchange_code(code).await?,
            (None, true) => {
                let stored = load_token(settings.as_ref())?.context("no stored token to refresh")?;
                let refresh_token = stored.refresh_token.context("stored token has no refresh token")?;
                auth.refresh_token(&refresh_token).await?
            }
            (None, false) => bail!("pass --code <CODE> or --refresh"),
        };
        save_token(settings.as_ref(), &tokens)?;
        println!("{} token stored ({})", "✓".green(), tokens.scope.as_deref().unwrap_or("no scope"));
        return Ok(());
    }

    let mut workspace = open_workspace(&config, settings)?;

    match cli.command {
        Commands::Add { url } => {
            workspace.load_builtins()?;
            let details = workspace.add_source(&url).await?;
            println!("{} Loaded {}", "✓".green(), details.graph.as_deref().unwrap_or(&details.url));
            if details.is_editable() {
                println!(
                    "  Editable: {}/{} @ {} : {}",
                    details.owner.as_deref().unwrap_or_default(),
                    details.repo.as_deref().unwrap_or_default(),
                    details.branch.as_deref().unwrap_or_default(),
                    details.path.as_deref().unwrap_or_default(),
                );
            }
        }

        Commands::Remove { url } => {
            let removed = workspace.remove_source(&url)?;
            println!("{} Removed {}", "✓".green(), removed.url);
        }

        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(workspace.sources())?);
            } else {
                print_sources(&workspace);
            }
        }

        Commands::Reload { url, all } => {
            if all {
                workspace.initialize().await?;
                print_sources(&workspace);
            } else {
                let Some(url) = url else {
                    bail!("pass a source URL or --all");
                };
                workspace.load_builtins()?;
                let details = workspace.reload_source(&url).await?;
                println!(
                    "{} Reloaded {} (revision {})",
                    "✓".green(),
                    details.url,
                    details.revision.as_deref().unwrap_or("-"),
                );
            }
        }

        Commands::Toggle { url } => {
            let visible = workspace.toggle_visibility(&url)?;
            println!("{} {}", url, if visible { "visible".green() } else { "hidden".dimmed() });
        }

        Commands::Tree { kind, json } => {
            workspace.load_builtins()?;
            let tree = match kind {
                TreeKind::Classes => workspace.class_tree()?,
                TreeKind::Properties => workspace.property_tree()?,
                TreeKind::Decomposition => workspace.decomposition_tree()?,
                TreeKind::Individuals => workspace.individuals_tree()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else if tree.is_empty() {
                println!("(empty - no visible source contributes to this tree)");
            } else {
                print_tree(&tree, 0);
            }
        }

        Commands::Label { iri } => {
            workspace.load_builtins()?;
            println!("{}", workspace.label(&iri)?);
        }

        Commands::Show { iri } => {
            use ontoview_core::ontology::query;

            workspace.load_builtins()?;
            println!(
                "{} {}",
                workspace.label(&iri)?.bold(),
                format!("({})", workspace.prefixed_form(&iri)).dimmed(),
            );
            let types = query::rdf_types(workspace.index(), workspace.prefixes(), &iri)?;
            if !types.is_empty() {
                println!("  types: {}", types.join(", "));
            }
            for quad in workspace.subject_quads(&iri)? {
                println!("  {} {}", workspace.prefixed_form(quad.predicate.as_str()).cyan(), quad.object);
            }
        }

        Commands::Suggest { text, limit } => {
            workspace.load_builtins()?;
            for candidate in workspace.suggest(&text, limit)? {
                println!("{}", candidate);
            }
        }

        Commands::Serialize { url, output } => {
            let turtle = workspace.serialize(&url)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, turtle)?;
                    println!("{} Wrote {}", "✓".green(), path.display());
                }
                None => print!("{}", turtle),
            }
        }

        Commands::Commit { url, message } => {
            let revision = workspace.commit(&url, &message).await?;
            println!("{} Committed {} ({})", "✓".green(), url, revision);
        }

        Commands::Login { .. } => {}
    }

    workspace.close()?;
    Ok(())
}
