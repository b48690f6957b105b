use std::io::{self, Write};

use clap::Args;
use velo_core::credentials::{LoginForm, SignupForm};

use crate::commands::Context;
use crate::config::save_config;
use crate::output::kv;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    email: String,
    /// Password (prompted for when omitted)
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    /// First name
    #[arg(long)]
    name: String,
    /// Last name
    #[arg(long)]
    last_name: String,
    /// Account email
    #[arg(short, long)]
    email: String,
    /// Password (prompted for when omitted)
    #[arg(long)]
    password: Option<String>,
}

fn prompt_input(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt_input("Password: "),
    }
}

pub async fn login(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    let password = password_or_prompt(args.password)?;
    let outcome = ctx
        .velo
        .auth()
        .login(LoginForm::new(args.email, password))
        .await?;

    if outcome.session_cookie.is_none() {
        tracing::warn!("server did not return a session cookie; the login will not persist");
    }

    let mut config = ctx.config.clone();
    config.store_session(
        &ctx.profile,
        &ctx.base_url,
        &outcome.user.email,
        outcome.session_cookie,
    );
    save_config(&ctx.config_path, &config)?;

    println!("Welcome back, {}!", outcome.user.display_name());
    Ok(())
}

pub async fn signup(ctx: &Context, args: SignupArgs) -> anyhow::Result<()> {
    let password = password_or_prompt(args.password)?;
    let created = ctx
        .velo
        .auth()
        .signup(SignupForm {
            name: args.name,
            last_name: args.last_name,
            email: args.email,
            password,
        })
        .await?;

    println!("Created account {}", created.email);
    println!("Log in with `velo login --email {}`", created.email);
    Ok(())
}

pub fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.velo.auth().logout();
    let mut config = ctx.config.clone();
    if !config.forget_session(&ctx.profile) {
        anyhow::bail!("profile '{}' has no stored session", ctx.profile);
    }
    save_config(&ctx.config_path, &config)?;
    println!("Logged out profile '{}'", ctx.profile);
    Ok(())
}

pub async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let user = ctx.require_user().await?;
    println!("{}", kv("name", &user.display_name()));
    println!("{}", kv("email", &user.email));
    println!("{}", kv("server", &ctx.base_url));
    println!("{}", kv("profile", &ctx.profile));
    Ok(())
}
