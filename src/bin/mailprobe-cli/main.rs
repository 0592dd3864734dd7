mod args;
mod output;

use anyhow::{Context, Result};
use mailprobe_lib::{VerificationReport, Verifier, resolve_mx};

use std::io::{self, BufRead};

use args::{Cli, Commands};

#[cfg(feature = "with-tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailprobe_lib=info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    #[cfg(feature = "with-tracing")]
    init_tracing();

    // usage errors are fatal (1); 2 is reserved for undeliverable addresses
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    output::check_destination(&cli.format, cli.out.as_deref())?;

    let emails: Vec<String> = if cli.stdin {
        let mut emails = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let email = line.trim();
            if !email.is_empty() {
                emails.push(email.to_string());
            }
        }
        emails
    } else {
        match &cli.cmd {
            Some(Commands::Verify { emails }) => emails.clone(),
            Some(Commands::Mx { domain }) => {
                return output::emit_mx(domain, resolve_mx(domain), &cli.format, cli.out.as_deref());
            }
            None => {
                Cli::clap_command().print_help()?;
                println!();
                return Ok(());
            }
        }
    };

    let verifier = Verifier::new(cli.verify_options()?);
    let rows: Vec<VerificationReport> = emails
        .iter()
        .map(|email| verifier.verify_with_report(email))
        .collect();

    output::emit(&rows, &cli)?;

    // codes de sortie : 0 OK, 2 non délivrable / non vérifiable, 1 fatal
    if rows.iter().any(|r| !r.result.is_deliverable()) {
        std::process::exit(2);
    }
    Ok(())
}
