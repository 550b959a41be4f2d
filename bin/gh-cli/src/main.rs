//! GiveHub command-line client
//!
//! Plays the part the browser pages play in the web client: every command
//! hydrates the session controller, passes through the role guard where the
//! page would, and renders what the controller and gateway supply.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GIVEHUB_CONFIG` | - | Path to a TOML configuration file |
//! | `GIVEHUB_API_BASE_URL` | `http://localhost:5000/api` | Platform API base URL |
//! | `GIVEHUB_DATA_DIR` | `./data` | Directory for the credentials document |
//! | `RUST_LOG` | `info` | Log level |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use gh_client::{
    guard, routes, Access, ApiGateway, CharityApplicationRequest, FileCredentialStore,
    NewDonation, NewStory, Registration, SessionController, SessionState, UserUpdate,
};
use gh_common::{logging::init_logging, Role};
use gh_config::{ClientConfig, ConfigLoader};

#[derive(Parser)]
#[command(name = "gh-cli", version, about = "GiveHub platform command-line client")]
struct Cli {
    /// Configuration file path
    #[arg(long, env = "GIVEHUB_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account (implicit login)
    Register {
        #[command(subcommand)]
        kind: RegisterKind,
    },
    /// End the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show which dashboard the signed-in user lands on
    Dashboard,
    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Browse charities
    Charities {
        #[command(subcommand)]
        action: CharitiesAction,
    },
    /// Donate to a charity
    Donate {
        #[arg(long)]
        charity_id: i64,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        recurring: bool,
        #[arg(long)]
        anonymous: bool,
        #[arg(long, default_value = "mpesa")]
        payment_method: String,
        #[arg(long)]
        transaction_id: String,
    },
    /// Show the signed-in user's donation history
    History,
    /// Browse and publish impact stories
    Stories {
        #[command(subcommand)]
        action: StoriesAction,
    },
    /// Review charity applications (admin)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum RegisterKind {
    /// Register a donor account
    Donor {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Register a charity account
    Charity {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CharitiesAction {
    /// List approved charities
    List,
    /// Show one charity
    Show { id: i64 },
    /// Apply to open a charity (donors)
    Apply {
        #[arg(long)]
        organization_name: String,
        #[arg(long)]
        mission: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        goal: Option<i64>,
    },
}

#[derive(Subcommand)]
enum StoriesAction {
    /// List published stories
    List,
    /// Show one story
    Show { id: i64 },
    /// Publish a story (charity accounts)
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List pending charity applications
    Pending,
    /// Approve an application
    Approve { id: i64 },
    /// Reject an application
    Reject { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("gh-cli");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::with_path(path).load()?,
        None => ClientConfig::load()?,
    };

    let store = Arc::new(FileCredentialStore::new(config.storage.credentials_path()));
    let gateway = ApiGateway::new(&config.api, store.clone())?;
    let controller = SessionController::new(gateway.clone(), store);

    controller.hydrate().await;
    tracing::debug!(phase = ?controller.current().phase, "Session hydrated");

    run(cli.command, &config, &gateway, &controller).await
}

async fn run(
    command: Command,
    config: &ClientConfig,
    gateway: &ApiGateway,
    controller: &SessionController,
) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = controller.login(&email, &password).await?;
            println!("Signed in as {} ({})", user.name, user.role);
        }

        Command::Register { kind } => {
            let registration = match kind {
                RegisterKind::Donor { first_name, last_name, email, password } => {
                    Registration::donor(first_name, last_name, email, password)
                }
                RegisterKind::Charity { name, email, password } => {
                    Registration::charity(name, email, password)
                }
            };
            let user = controller.register(&registration).await?;
            println!("Account created for {} ({})", user.name, user.role);
        }

        Command::Logout => {
            controller.logout();
            println!("Signed out");
        }

        Command::Whoami => {
            let state = require(config, controller, None).await?;
            match state.user {
                Some(user) => println!("{} <{}> role={}", user.name, user.email, user.role),
                None => bail!("No signed-in user"),
            }
        }

        Command::Dashboard => {
            let state = require(config, controller, None).await?;
            println!("{}", routes::dashboard_path(state.user.as_ref()));
        }

        Command::Profile { name, email } => {
            let state = require(config, controller, None).await?;
            let user = match state.user {
                Some(user) => user,
                None => bail!("No signed-in user"),
            };
            let update = UserUpdate { name, email };
            let updated = gateway.update_user(&user.id, &update).await?;
            controller.update_user(updated.clone());
            println!("Profile updated: {} <{}>", updated.name, updated.email);
        }

        Command::Charities { action } => match action {
            CharitiesAction::List => {
                for charity in gateway.list_charities().await? {
                    println!(
                        "#{} {} [{}] raised {}/{} from {} donors",
                        charity.id,
                        charity.name,
                        charity.category.as_deref().unwrap_or("-"),
                        charity.raised,
                        charity.goal,
                        charity.donors,
                    );
                }
            }
            CharitiesAction::Show { id } => {
                let charity = gateway.charity_details(id).await?;
                println!("{}", charity.name);
                if let Some(description) = &charity.description {
                    println!("{}", description);
                }
                println!("raised {}/{} from {} donors", charity.raised, charity.goal, charity.donors);
            }
            CharitiesAction::Apply { organization_name, mission, location, category, goal } => {
                require(config, controller, Some(Role::Donor)).await?;
                let application = CharityApplicationRequest {
                    organization_name,
                    mission,
                    location,
                    category,
                    goal,
                };
                let submitted = gateway.apply_for_charity(&application).await?;
                println!(
                    "Application #{} for {} submitted ({:?})",
                    submitted.id, submitted.organization_name, submitted.status
                );
            }
        },

        Command::Donate {
            charity_id,
            amount,
            recurring,
            anonymous,
            payment_method,
            transaction_id,
        } => {
            require(config, controller, None).await?;
            let donation = NewDonation {
                charity_id,
                amount,
                recurring,
                is_anonymous: anonymous,
                payment_method,
                transaction_id,
            };
            let made = gateway.make_donation(&donation).await?;
            println!("Donation #{} of {} recorded ({:?})", made.id, made.amount, made.status);
        }

        Command::History => {
            require(config, controller, None).await?;
            for donation in gateway.donation_history().await? {
                println!(
                    "#{} charity {} amount {} {:?}",
                    donation.id, donation.charity_id, donation.amount, donation.status
                );
            }
        }

        Command::Stories { action } => match action {
            StoriesAction::List => {
                for story in gateway.list_stories().await? {
                    println!("#{} {} (charity {})", story.id, story.title, story.charity_id);
                }
            }
            StoriesAction::Show { id } => {
                let story = gateway.story_details(id).await?;
                println!("{}\n\n{}", story.title, story.content);
            }
            StoriesAction::Post { title, content } => {
                require(config, controller, Some(Role::Charity)).await?;
                let story = gateway.post_story(&NewStory { title, content }).await?;
                println!("Story #{} published", story.id);
            }
        },

        Command::Admin { action } => {
            require(config, controller, Some(Role::Admin)).await?;
            match action {
                AdminAction::Pending => {
                    for application in gateway.pending_applications().await? {
                        println!(
                            "#{} {} by user {} ({:?})",
                            application.id,
                            application.organization_name,
                            application.user_id,
                            application.status
                        );
                    }
                }
                AdminAction::Approve { id } => {
                    let application = gateway.approve_application(id).await?;
                    println!("Application #{} approved", application.id);
                }
                AdminAction::Reject { id } => {
                    let application = gateway.reject_application(id).await?;
                    println!("Application #{} rejected", application.id);
                }
            }
        }
    }

    Ok(())
}

/// Page-level access check, re-run from the freshly published state.
///
/// Re-verifies a stale profile first so a revoked account surfaces within
/// the configured interval instead of at the next explicit logout.
async fn require(
    config: &ClientConfig,
    controller: &SessionController,
    required: Option<Role>,
) -> Result<SessionState> {
    controller
        .reverify(Duration::from_secs(config.session.reverify_interval_secs))
        .await;

    let state = controller.current();
    match guard(required, &state) {
        Access::Granted => Ok(state),
        Access::Denied { redirect } => bail!("Access denied, sign in or go to {}", redirect),
    }
}
