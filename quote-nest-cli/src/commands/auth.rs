//! Authentication commands for the QuoteNest CLI.

use clap::{Args, Subcommand};
use quote_nest_core::SessionGate;
use std::io::{self, Write};

use super::Context;

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create an account and sign in
    Signup(CredentialArgs),
    /// Sign in to an existing account
    Signin(CredentialArgs),
    /// Sign out and forget the saved session
    Signout,
    /// Show authentication status
    Status,
}

#[derive(Args)]
struct CredentialArgs {
    /// Account email (prompted if omitted)
    #[arg(long, short)]
    email: Option<String>,

    /// Account password (prompted if omitted)
    #[arg(long, short)]
    password: Option<String>,
}

impl AuthCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AuthSubcommand::Signup(args) => {
                let (email, password) = args.resolve()?;
                let principal = ctx
                    .session
                    .sign_up(&ctx.auth(), &email, &password)
                    .await?;
                ctx.session_file.save(&principal)?;
                println!("Account created. Signed in as {}", principal.email);
                Ok(())
            }

            AuthSubcommand::Signin(args) => {
                let (email, password) = args.resolve()?;
                let principal = ctx
                    .session
                    .sign_in(&ctx.auth(), &email, &password)
                    .await?;
                ctx.session_file.save(&principal)?;
                println!("Signed in as {}", principal.email);
                Ok(())
            }

            AuthSubcommand::Signout => {
                if !ctx.session.is_authenticated() {
                    // Drops a stale or unreadable session file
                    ctx.session_file.clear()?;
                    println!("Not signed in.");
                    return Ok(());
                }
                if !ctx.session.sign_out(&ctx.auth()).await {
                    return Err("Server refused to sign out. Try again.".into());
                }
                ctx.session_file.clear()?;
                println!("Signed out.");
                Ok(())
            }

            AuthSubcommand::Status => {
                let Some(principal) = ctx.session.current_principal() else {
                    println!("Not signed in.");
                    println!("Use 'qn auth signin' or 'qn auth signup'.");
                    return Ok(());
                };

                println!("Signed in as {}", principal.email);
                println!("User ID: {}", principal.uid);
                println!("Server: {}", ctx.config.server_url.value);

                if let Some(token) = principal.token.as_deref() {
                    match ctx.auth().whoami(token).await {
                        Ok(Some(_)) => println!("Session: valid"),
                        Ok(None) => println!("Session: expired (sign in again)"),
                        Err(e) => println!("Session: unknown ({})", e),
                    }
                }
                Ok(())
            }
        }
    }
}

impl CredentialArgs {
    fn resolve(&self) -> io::Result<(String, String)> {
        let email = match &self.email {
            Some(email) => email.trim().to_string(),
            None => prompt("Email: ")?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt("Password: ")?,
        };

        if email.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Email cannot be empty",
            ));
        }
        Ok((email, password))
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
