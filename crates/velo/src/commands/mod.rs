pub mod auth;
pub mod daily;
pub mod goal;
pub mod task;

use std::path::PathBuf;

use clap::{Args, Subcommand};
use velo_client::{Gated, Velo};
use velo_core::User;

use crate::config::{config_path, load_config, VeloConfig, BASE_URL_ENV, DEFAULT_PROFILE};

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config profile to use
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    pub profile: String,
    /// Server base URL (overrides $VELO_BASE_URL and the profile)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login(auth::LoginArgs),
    /// Create an account
    Signup(auth::SignupArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Today's focus: every task, most important first
    Daily,
    /// Manage goals
    Goal(goal::GoalArgs),
    /// Manage tasks
    Task(task::TaskArgs),
}

impl Commands {
    pub async fn run(self, global: &GlobalArgs) -> anyhow::Result<()> {
        let ctx = Context::open(global)?;
        let result = match self {
            Commands::Login(args) => auth::login(&ctx, args).await,
            Commands::Signup(args) => auth::signup(&ctx, args).await,
            Commands::Logout => auth::logout(&ctx),
            Commands::Whoami => auth::whoami(&ctx).await,
            Commands::Daily => daily::run(&ctx).await,
            Commands::Goal(args) => goal::run(&ctx, args).await,
            Commands::Task(args) => task::run(&ctx, args).await,
        };
        ctx.velo.shutdown();
        result
    }
}

/// Everything a command needs: the resolved profile and a connected client.
pub struct Context {
    pub profile: String,
    pub base_url: String,
    pub config_path: PathBuf,
    pub config: VeloConfig,
    pub velo: Velo,
}

impl Context {
    pub fn open(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config_path = config_path()?;
        let config = load_config(&config_path);
        let env_base_url = std::env::var(BASE_URL_ENV).ok();
        let base_url = config.resolve_base_url(
            &global.profile,
            global.base_url.as_deref(),
            env_base_url.as_deref(),
        );
        let session_cookie = config.session_cookie(&global.profile, &base_url);
        tracing::debug!(
            profile = %global.profile,
            %base_url,
            has_session = session_cookie.is_some(),
            "opening velo context"
        );

        let velo = Velo::connect(&base_url, session_cookie)?;
        Ok(Self {
            profile: global.profile.clone(),
            base_url,
            config_path,
            config,
            velo,
        })
    }

    /// Probe the session and refuse to continue unless signed in.
    pub async fn require_user(&self) -> anyhow::Result<User> {
        self.velo.session().probe().await;
        match self.velo.session().gate(User::clone) {
            Gated::Granted(user) => Ok(user),
            Gated::Loading => anyhow::bail!("session is still being checked"),
            Gated::Unauthenticated => {
                anyhow::bail!("not logged in to {}; run `velo login` first", self.base_url)
            }
        }
    }
}
