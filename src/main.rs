use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paperscope::config::{find_config_file, get_config, load_config, SessionStore};
use paperscope::feed::{Browser, Phase, SavedCollectionStore};
use paperscope::models::{Filters, SearchQuery, SearchType, Tab, TimeWindow};
use paperscope::query::compose_similar;
use paperscope::session::{CallbackGate, SessionGate};
use paperscope::{ApiError, CorpusApi, HttpApi};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// paperscope - browse and filter an arXiv-like paper corpus from the terminal
#[derive(Parser, Debug)]
#[command(name = "paperscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and filter an arXiv-like paper corpus", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Base URL of the corpus service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse papers with the active query and filters
    #[command(alias = "p")]
    Papers {
        /// Free-text query; omit for an unfiltered feed
        #[arg(long, short)]
        query: Option<String>,

        /// Query match mode (full_text, author)
        #[arg(long, default_value = "full_text")]
        search_type: SearchType,

        /// Time window (last_day, last_three_days, last_week, last_four_weeks,
        /// last_six_months, last_year, all_time)
        #[arg(long, short, default_value = "last_day")]
        time: TimeWindow,

        /// Restrict to a primary category (repeatable)
        #[arg(long, short)]
        category: Vec<String>,

        /// Restrict to an affiliation (repeatable)
        #[arg(long, short)]
        affiliation: Vec<String>,

        /// Tab to browse (all, favorites)
        #[arg(long, default_value = "all")]
        tab: Tab,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Emit raw JSON instead of cards
        #[arg(long)]
        json: bool,
    },

    /// Look up papers related to a given paper
    Similar {
        /// Paper id to find relatives of
        paper_id: String,

        /// Time window
        #[arg(long, short, default_value = "all_time")]
        time: TimeWindow,

        /// Emit raw JSON instead of cards
        #[arg(long)]
        json: bool,
    },

    /// List the category vocabulary
    Categories,

    /// List the known affiliations
    Organizations,

    /// Manage saved filter collections
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },

    /// Manage favorites
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommands,
    },

    /// Log in and persist the session cookie
    Login {
        /// User name
        #[arg(long, short)]
        name: String,

        /// Password
        #[arg(long, short)]
        password: String,
    },

    /// Invalidate the session
    Logout,

    /// Show who is logged in
    Whoami,
}

#[derive(Subcommand, Debug)]
enum SavedCommands {
    /// List saved collections
    List {
        /// Emit raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Save the given query and filters as a collection
    Add {
        /// Description shown on the collection panel
        #[arg(long, short)]
        description: String,

        /// Free-text query to save
        #[arg(long, short)]
        query: Option<String>,

        /// Query match mode
        #[arg(long, default_value = "full_text")]
        search_type: SearchType,

        /// Time window
        #[arg(long, short, default_value = "last_day")]
        time: TimeWindow,

        /// Category restriction (repeatable)
        #[arg(long, short)]
        category: Vec<String>,

        /// Affiliation restriction (repeatable)
        #[arg(long, short)]
        affiliation: Vec<String>,
    },

    /// Delete a saved collection by id
    Delete {
        /// Server id of the collection (see `saved list`)
        query_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum FavoriteCommands {
    /// Bookmark a paper
    Add {
        /// Paper id
        paper_id: String,
    },

    /// Remove a bookmark
    Remove {
        /// Paper id
        paper_id: String,
    },
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "paperscope={level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_filters(time: TimeWindow, categories: Vec<String>, affiliations: Vec<String>) -> Filters {
    Filters::for_window(time)
        .with_categories(categories)
        .with_affiliations(affiliations)
}

fn build_query(value: Option<String>, kind: SearchType) -> SearchQuery {
    SearchQuery {
        value: value.unwrap_or_default(),
        kind,
    }
}

/// Forward a 403 to the gate before surfacing the error.
fn gate_on_unauthorized<T>(
    result: std::result::Result<T, ApiError>,
    gate: &dyn SessionGate,
) -> Result<T> {
    match result {
        Err(err) if err.is_unauthorized() => {
            gate.force_logout();
            bail!("session expired; run `paperscope login`")
        }
        other => Ok(other?),
    }
}

/// Friendlier message for operations that gate internally.
fn session_hint(err: ApiError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::anyhow!("session expired; run `paperscope login`")
    } else {
        err.into()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    // Configuration: explicit path > discovered file > env/defaults
    let mut config = if let Some(path) = &cli.config {
        load_config(path).with_context(|| format!("loading config {}", path.display()))?
    } else if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        load_config(&path).with_context(|| format!("loading config {}", path.display()))?
    } else {
        get_config()
    };
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    let api = Arc::new(HttpApi::new(
        &config.api.base_url,
        Duration::from_secs(cli.timeout),
    )?);

    let session = SessionStore::new();
    if let Some(cookie) = session.load() {
        api.set_session_cookie(Some(cookie));
    }
    let gate: Arc<dyn SessionGate> = {
        let session = session.clone();
        Arc::new(CallbackGate::new(move || {
            if let Err(err) = session.clear() {
                tracing::warn!(error = %err, "failed to clear session file");
            }
            eprintln!("logged out: the server no longer accepts this session");
        }))
    };

    match cli.command {
        Commands::Papers {
            query,
            search_type,
            time,
            category,
            affiliation,
            tab,
            pages,
            json,
        } => {
            if tab == Tab::Custom {
                bail!("the custom tab is browsed with `paperscope saved`");
            }
            let mut browser = Browser::new(Arc::clone(&api), Arc::clone(&gate));
            browser.set_logged_in(api.session_cookie().is_some());
            browser.set_scope(build_query(query, search_type), build_filters(time, category, affiliation), tab);

            let spinner = paperscope::ui::FetchSpinner::new("fetching papers...");
            browser.refresh().await;
            for _ in 1..pages {
                if browser.engine().phase() == Phase::Error {
                    break;
                }
                browser.load_more().await;
            }
            spinner.finish();

            if browser.engine().phase() == Phase::Error {
                bail!("page fetch failed; partial results withheld");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(browser.engine().items())?);
            } else {
                paperscope::ui::print_papers(browser.engine().items());
                if browser.engine().is_exhausted() {
                    println!("(end of results)");
                }
            }
        }

        Commands::Similar {
            paper_id,
            time,
            json,
        } => {
            let params = compose_similar(&paper_id, &Filters::for_window(time), Tab::All, 0);
            let spinner = paperscope::ui::FetchSpinner::new("fetching related papers...");
            let page = api.fetch_page(&params).await;
            spinner.finish();
            let page = page?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page.papers)?);
            } else {
                paperscope::ui::print_papers(&page.papers);
            }
        }

        Commands::Categories => {
            let categories = api.categories().await?;
            paperscope::ui::print_name_list(&categories);
        }

        Commands::Organizations => {
            let organizations = api.organizations().await?;
            paperscope::ui::print_name_list(&organizations);
        }

        Commands::Saved { command } => {
            let mut store = SavedCollectionStore::new(Arc::clone(&api), Arc::clone(&gate));
            match command {
                SavedCommands::List { json } => {
                    let collections = api.saved_collections().await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&collections)?);
                    } else {
                        paperscope::ui::print_saved_table(&collections);
                    }
                }
                SavedCommands::Add {
                    description,
                    query,
                    search_type,
                    time,
                    category,
                    affiliation,
                } => {
                    let query = build_query(query, search_type);
                    let filters = build_filters(time, category, affiliation);
                    store
                        .add(&description, &query, &filters)
                        .await
                        .map_err(session_hint)?;
                    println!("saved \"{description}\"");
                }
                SavedCommands::Delete { query_id } => {
                    store.list().await?;
                    let index = store
                        .entries()
                        .iter()
                        .position(|e| e.collection.id == query_id)
                        .with_context(|| format!("no saved collection with id {query_id}"))?;
                    store.remove_at(index).await.map_err(session_hint)?;
                    println!("deleted {query_id}");
                }
            }
        }

        Commands::Favorite { command } => {
            let (paper_id, favorite) = match command {
                FavoriteCommands::Add { paper_id } => (paper_id, true),
                FavoriteCommands::Remove { paper_id } => (paper_id, false),
            };
            let result = if favorite {
                api.add_favorite(&paper_id).await
            } else {
                api.remove_favorite(&paper_id).await
            };
            gate_on_unauthorized(result, gate.as_ref())?;
            println!(
                "{} {}",
                if favorite { "bookmarked" } else { "unbookmarked" },
                paper_id
            );
        }

        Commands::Login { name, password } => {
            let cookie = api.login(&name, &password).await?;
            session
                .save(&cookie)
                .with_context(|| format!("writing session to {}", session.path().display()))?;
            println!("logged in as {name}");
        }

        Commands::Logout => {
            if let Err(err) = api.logout().await {
                tracing::warn!(error = %err, "server-side logout failed");
            }
            session.clear()?;
            println!("logged out");
        }

        Commands::Whoami => {
            let status = api.login_check().await?;
            if status.logged_in {
                println!("logged in as {}", status.user.unwrap_or_else(|| "?".into()));
            } else {
                println!("not logged in");
            }
        }
    }

    Ok(())
}
