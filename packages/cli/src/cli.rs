//! Command-line interface for Reading Coach.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use readcoach_core::config::{BackendConfig, Provider, ProviderEntry, DEFAULT_MAX_ATTEMPTS};
use readcoach_core::{create_backend, PracticeSession, PracticeStore, UserProfile};
use readcoach_store::config::DATA_DIR_ENV;
use readcoach_store::{data_root, format_log, format_summary, FileStore};

use crate::error::{CliError, Result};
use crate::practice::run_practice;

/// Reading Coach - Personalised reading practice from your own word bank.
#[derive(Parser)]
#[command(name = "readcoach")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding user data (default: ./users)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List existing users.
    Users,

    /// Create a new user.
    CreateUser {
        name: String,
    },

    /// Show the user's profile, or update it when --age or --lexile is given.
    Profile {
        user: String,

        #[arg(long)]
        age: Option<u32>,

        /// Lexile reading level
        #[arg(long)]
        lexile: Option<u32>,
    },

    /// Manage the user's word bank.
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },

    /// Manage the user's provider credentials.
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },

    /// Generate a test, answer it and get it graded.
    Practice {
        user: String,

        /// Provider to use (anthropic, openai, dashscope); default: first configured
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use; default: first model listed for the provider
        #[arg(short, long)]
        model: Option<String>,

        /// Attempts per generation or grading call
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        attempts: u32,
    },

    /// Show past test results, newest first.
    History {
        user: String,

        /// Show the full report of test number N from the list
        #[arg(long, value_name = "N")]
        show: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum WordsAction {
    /// Add words (duplicates are skipped).
    Add {
        user: String,
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// List all words.
    List { user: String },
    /// Remove case-insensitive duplicates.
    Dedupe { user: String },
    /// Import words from a text file.
    Import { user: String, file: PathBuf },
}

#[derive(Subcommand)]
pub enum ApiAction {
    /// Store the API key for a provider.
    Set {
        user: String,
        provider: String,

        #[arg(long)]
        key: String,

        /// Model to offer; repeat for several, the first is the default
        #[arg(long = "model")]
        models: Vec<String>,

        /// Override the provider API base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Show configured providers and models (keys are hidden).
    Show { user: String },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = FileStore::new(data_root(cli.data_dir));
    tracing::debug!(root = %store.root().display(), "using data directory");

    match cli.command {
        Commands::Users => users_command(&store),
        Commands::CreateUser { name } => create_user_command(&store, &name),
        Commands::Profile { user, age, lexile } => profile_command(&store, &user, age, lexile),
        Commands::Words { action } => words_command(&store, action),
        Commands::Api { action } => api_command(&store, action),
        Commands::Practice {
            user,
            provider,
            model,
            attempts,
        } => practice_command(&store, &user, provider.as_deref(), model.as_deref(), attempts),
        Commands::History { user, show } => history_command(&store, &user, show),
    }
}

fn require_user(store: &FileStore, user: &str) -> Result<()> {
    if store.user_exists(user) {
        Ok(())
    } else {
        Err(CliError::UserNotFound(user.to_string()))
    }
}

fn users_command(store: &FileStore) -> Result<()> {
    let users = store.list_users()?;
    if users.is_empty() {
        println!("No users yet. Create one with `readcoach create-user <name>`.");
        return Ok(());
    }
    for user in users {
        println!("{user}");
    }
    Ok(())
}

fn create_user_command(store: &FileStore, name: &str) -> Result<()> {
    if store.create_user(name)? {
        println!("{} {}", style("Created user").green().bold(), style(name).cyan());
    } else {
        println!("User {} already exists", style(name).cyan());
    }
    Ok(())
}

fn profile_command(
    store: &FileStore,
    user: &str,
    age: Option<u32>,
    lexile: Option<u32>,
) -> Result<()> {
    require_user(store, user)?;
    let current = store.profile_or_default(user)?;

    if age.is_some() || lexile.is_some() {
        let profile = UserProfile::new(
            age.unwrap_or(current.age),
            lexile.unwrap_or(current.lexile_level),
        )?;
        store.save_profile(user, &profile)?;
        println!("{}", style("Profile saved").green().bold());
        print_profile(&profile);
    } else {
        print_profile(&current);
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("  Age: {}", profile.age);
    println!("  Lexile level: {}", profile.lexile_level);
}

fn words_command(store: &FileStore, action: WordsAction) -> Result<()> {
    match action {
        WordsAction::Add { user, words } => {
            require_user(store, &user)?;
            let added = store.add_words(&user, &words)?;
            println!(
                "Added {} word(s), {} in total",
                style(added).green(),
                store.word_count(&user)?
            );
        }
        WordsAction::List { user } => {
            require_user(store, &user)?;
            let bank = store.read_words(&user)?;
            for word in bank.words() {
                println!("{word}");
            }
            eprintln!("{} word(s)", bank.len());
        }
        WordsAction::Dedupe { user } => {
            require_user(store, &user)?;
            let removed = store.deduplicate_words(&user)?;
            println!(
                "Removed {} duplicate(s), {} word(s) left",
                style(removed).yellow(),
                store.word_count(&user)?
            );
        }
        WordsAction::Import { user, file } => {
            require_user(store, &user)?;
            let added = store.import_words(&user, &file)?;
            println!(
                "Imported {} new word(s) from {}, {} in total",
                style(added).green(),
                file.display(),
                store.word_count(&user)?
            );
        }
    }
    Ok(())
}

fn api_command(store: &FileStore, action: ApiAction) -> Result<()> {
    match action {
        ApiAction::Set {
            user,
            provider,
            key,
            models,
            base_url,
        } => {
            require_user(store, &user)?;
            let provider = Provider::parse(&provider)?;
            let mut config = store.load_api_config(&user)?;
            config.set(
                provider,
                ProviderEntry {
                    api_key: key.trim().to_string(),
                    models,
                    base_url,
                },
            );
            store.save_api_config(&user, &config)?;
            println!(
                "{} {}",
                style("Saved API key for").green().bold(),
                style(provider).cyan()
            );
        }
        ApiAction::Show { user } => {
            require_user(store, &user)?;
            let config = store.load_api_config(&user)?;
            if config.is_empty() {
                println!("No API configured");
            }
            for provider in config.providers() {
                let models = config.models(provider);
                if models.is_empty() {
                    println!("{provider}: (default model)");
                } else {
                    println!("{provider}: {}", models.join(", "));
                }
            }
        }
    }
    Ok(())
}

/// Pick backend settings: explicit provider, then `LLM_API_KEY`, then the first configured provider.
fn resolve_backend_config(
    store: &FileStore,
    user: &str,
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<BackendConfig> {
    let api = store.load_api_config(user)?;

    if let Some(provider) = provider {
        return Ok(api.backend_config(provider, model)?);
    }

    if std::env::var_os("LLM_API_KEY").is_some() {
        let mut config = BackendConfig::from_env()?;
        if let Some(model) = model {
            config.model = model.to_string();
        }
        return Ok(config);
    }

    let first = api
        .providers()
        .first()
        .map(|p| p.to_string())
        .ok_or_else(|| CliError::NoApiConfig(user.to_string()))?;
    Ok(api.backend_config(&first, model)?)
}

fn practice_command(
    store: &FileStore,
    user: &str,
    provider: Option<&str>,
    model: Option<&str>,
    attempts: u32,
) -> Result<()> {
    require_user(store, user)?;
    let config = resolve_backend_config(store, user, provider, model)?;
    let backend = create_backend(&config)?;

    println!(
        "{} for {} using {} ({})",
        style("Practice").bold(),
        style(user).cyan(),
        style(config.provider).green(),
        config.model
    );
    println!();

    let mut session = PracticeSession::new(user, backend.as_ref(), store).with_max_attempts(attempts);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let show_progress = out.is_terminal();

    run_practice(&mut session, &mut input, &mut out, show_progress)?;
    Ok(())
}

fn history_command(store: &FileStore, user: &str, show: Option<usize>) -> Result<()> {
    require_user(store, user)?;
    let logs = store.read_logs(user)?;

    if let Some(index) = show {
        let log = index
            .checked_sub(1)
            .and_then(|i| logs.get(i))
            .ok_or(CliError::LogNotFound {
                index,
                count: logs.len(),
            })?;
        println!("{}", format_log(log));
        return Ok(());
    }

    if logs.is_empty() {
        println!("No tests taken yet");
        return Ok(());
    }
    for (i, log) in logs.iter().enumerate() {
        println!("{:>3}. {}", i + 1, format_summary(log));
    }
    Ok(())
}
