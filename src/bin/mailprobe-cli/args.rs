use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mailprobe_lib::smtp_verify::{DEFAULT_TIMEOUT_MS, SMTP_PORT};
use mailprobe_lib::{HostFilter, ProbeOptions, VerifyOptions};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long, global = true)]
    pub stdin: bool,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human", global = true)]
    pub format: String,

    /// enveloppe MAIL FROM (par défaut l'adresse testée)
    #[arg(long = "from", global = true)]
    pub sender: Option<String>,

    /// timeout global de la poignée de main SMTP (ms)
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// port SMTP des serveurs MX
    #[arg(long, default_value_t = SMTP_PORT, global = true)]
    pub port: u16,

    /// nom annoncé dans HELO
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// ne vérifie pas les enregistrements MX du domaine
    #[arg(long, global = true)]
    pub no_domain: bool,

    /// ne sonde pas la boîte via SMTP
    #[arg(long, global = true)]
    pub no_mailbox: bool,

    /// regex d'hôtes MX à ne jamais sonder (répétable, remplace le filtre par défaut)
    #[arg(long = "skip-host", conflicts_with = "no_skip", global = true)]
    pub skip_hosts: Vec<String>,

    /// sonde tous les hôtes, y compris ceux exclus par défaut
    #[arg(long, global = true)]
    pub no_skip: bool,

    /// affiche la transcription SMTP (format human)
    #[arg(long, global = true)]
    pub transcript: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// vérifie une ou plusieurs adresses
    Verify {
        #[arg(required = true)]
        emails: Vec<String>,
    },
    /// affiche les enregistrements MX d'un domaine
    Mx { domain: String },
}

impl Cli {
    pub fn try_parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn verify_options(&self) -> Result<VerifyOptions> {
        let mut probe = ProbeOptions {
            sender: self.sender.clone(),
            timeout_ms: self.timeout_ms,
            port: self.port,
            ..ProbeOptions::default()
        };
        if let Some(helo) = &self.helo {
            probe.helo_domain = helo.clone();
        }
        if self.no_skip {
            probe.host_filter = HostFilter::none();
        } else if !self.skip_hosts.is_empty() {
            probe.host_filter =
                HostFilter::from_patterns(&self.skip_hosts).context("invalid --skip-host")?;
        }
        Ok(VerifyOptions {
            verify_domain: !self.no_domain,
            verify_mailbox: !self.no_mailbox,
            probe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("mailprobe-cli").chain(args.iter().copied()))
    }

    #[test]
    fn command_is_well_formed() {
        Cli::clap_command().debug_assert();
    }

    #[test]
    fn flags_after_subcommand() {
        let cli = parse(&[
            "verify",
            "alice@example.com",
            "--from",
            "probe@my.domain",
            "--timeout",
            "500",
            "--no-skip",
        ])
        .expect("flags after verify");
        assert!(matches!(&cli.cmd, Some(Commands::Verify { emails }) if emails == &["alice@example.com"]));
        assert_eq!(cli.sender.as_deref(), Some("probe@my.domain"));
        assert_eq!(cli.timeout_ms, 500);
        assert!(cli.no_skip);
    }

    #[test]
    fn flags_before_subcommand() {
        let cli = parse(&["--port", "2525", "verify", "alice@example.com"]).expect("parse");
        assert_eq!(cli.port, 2525);
        assert_eq!(cli.format, "human");
    }

    #[test]
    fn verify_needs_an_address() {
        assert!(parse(&["verify"]).is_err());
    }

    #[test]
    fn skip_host_conflicts_with_no_skip() {
        assert!(parse(&["verify", "a@b.c", "--skip-host", "mx", "--no-skip"]).is_err());
    }

    #[test]
    fn options_follow_flags() {
        let cli = parse(&[
            "verify",
            "alice@example.com",
            "--helo",
            "checker.test",
            "--no-domain",
            "--skip-host",
            "^mx\\.corp\\.",
        ])
        .expect("parse");
        let options = cli.verify_options().expect("options");
        assert!(!options.verify_domain);
        assert!(options.verify_mailbox);
        assert_eq!(options.probe.helo_domain(), "checker.test");
        assert!(options.probe.host_filter.should_skip("mx.corp.example"));
        assert!(!options.probe.host_filter.should_skip("mta5.yahoodns.net"));
    }

    #[test]
    fn default_filter_unless_no_skip() {
        let cli = parse(&["verify", "alice@example.com"]).expect("parse");
        let options = cli.verify_options().expect("options");
        assert!(options.probe.host_filter.should_skip("mta5.am0.yahoodns.net"));

        let cli = parse(&["verify", "alice@example.com", "--no-skip"]).expect("parse");
        let options = cli.verify_options().expect("options");
        assert!(!options.probe.host_filter.should_skip("mta5.am0.yahoodns.net"));
    }

    #[test]
    fn invalid_skip_pattern_is_reported() {
        let cli = parse(&["verify", "alice@example.com", "--skip-host", "("]).expect("parse");
        assert!(cli.verify_options().is_err());
    }
}
