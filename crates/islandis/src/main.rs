#![forbid(unsafe_code)]

//! islandis CLI: verify Ísland.is SAML tokens and inspect certificates.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use islandis::der::{tag, Class, DerElement};
use islandis::x509::LeafCertificate;
use islandis::{ChainMode, Clock, FixedClock, SystemClock, TrustProfile, Verifier, VerifierConfig};

#[derive(Parser)]
#[command(
    name = "islandis",
    about = "Verify Ísland.is SAML authentication tokens",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a base64 token and print its attributes
    Verify {
        /// File holding the token, or `-` for stdin
        file: PathBuf,

        /// Expected audience
        #[arg(long, env = "ISLANDIS_AUDIENCE")]
        audience: String,

        /// Directory holding the trust anchor and fallback certificate
        #[arg(long = "cert-dir", env = "ISLANDIS_CERT_DIR", default_value = islandis::config::DEFAULT_CERT_DIR)]
        cert_dir: PathBuf,

        /// User-Agent of the request that delivered the token
        #[arg(long = "user-agent")]
        user_agent: Option<String>,

        /// Verify as of this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,

        /// Chain signature implementation (auto, native, manual)
        #[arg(long = "chain-mode", default_value_t = ChainMode::Auto)]
        chain_mode: ChainMode,

        /// Deployment generation of the trust files
        #[arg(long, value_enum, default_value_t = Profile::Audkenni)]
        profile: Profile,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the DER structure of a certificate (PEM or DER)
    InspectCert {
        /// Certificate file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Audkenni,
    Legacy,
}

impl From<Profile> for TrustProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Audkenni => TrustProfile::audkenni(),
            Profile::Legacy => TrustProfile::legacy(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Verify(#[from] islandis::Error),
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Verify { verbose: true, .. });
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "info" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Verify {
            file,
            audience,
            cert_dir,
            user_agent,
            now,
            chain_mode,
            profile,
            verbose,
        } => {
            let config = VerifierConfig::new(audience)
                .with_cert_dir(cert_dir)
                .with_chain_mode(chain_mode)
                .with_profile(profile.into());
            cmd_verify(&file, config, user_agent.as_deref(), now, verbose)
        }
        Commands::InspectCert { file } => cmd_inspect_cert(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn cmd_verify(
    file: &Path,
    config: VerifierConfig,
    user_agent: Option<&str>,
    now: Option<DateTime<Utc>>,
    verbose: bool,
) -> Result<(), CliError> {
    let token = read_token(file)?;
    let clock: Arc<dyn Clock> = match now {
        Some(instant) => Arc::new(FixedClock::new(instant)),
        None => Arc::new(SystemClock),
    };
    let verifier = Verifier::new(config, clock)?;

    if verbose {
        eprintln!("Verifying: {}", file.display());
    }

    let verified = verifier.verify(token.trim(), user_agent)?;
    for (name, value) in verified.attributes() {
        println!("{name}={value}");
    }
    Ok(())
}

fn cmd_inspect_cert(file: &Path) -> Result<(), CliError> {
    let data = std::fs::read(file).map_err(|source| io_error(file, source))?;
    let certificate = LeafCertificate::from_pem_or_der(&data)?;
    let root = DerElement::parse_exact(certificate.der()).map_err(islandis::Error::from)?;
    print_element(&root, 0)?;
    Ok(())
}

fn print_element(element: &DerElement<'_>, depth: usize) -> Result<(), islandis::Error> {
    let indent = "  ".repeat(depth);
    let name = match element.class() {
        Class::Universal => tag::name(element.tag())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("UNIVERSAL {}", element.tag())),
        Class::ContextSpecific => format!("[{}]", element.tag()),
        Class::Application => format!("APPLICATION {}", element.tag()),
        Class::Private => format!("PRIVATE {}", element.tag()),
    };

    if element.is_constructed() {
        println!("{indent}{name}");
        for child in element.children()? {
            print_element(&child, depth + 1)?;
        }
        return Ok(());
    }

    match element.tag() {
        tag::OBJECT_IDENTIFIER if element.class() == Class::Universal => {
            println!("{indent}{name} {}", element.oid()?);
        }
        tag::UTF8_STRING
        | tag::PRINTABLE_STRING
        | tag::IA5_STRING
        | tag::UTC_TIME
        | tag::GENERALIZED_TIME
            if element.class() == Class::Universal =>
        {
            println!(
                "{indent}{name} \"{}\"",
                String::from_utf8_lossy(element.content())
            );
        }
        _ => println!("{indent}{name} ({} bytes)", element.content().len()),
    }
    Ok(())
}

fn read_token(file: &Path) -> Result<String, CliError> {
    if file == Path::new("-") {
        let mut token = String::new();
        std::io::stdin()
            .read_to_string(&mut token)
            .map_err(|source| io_error(Path::new("stdin"), source))?;
        return Ok(token);
    }
    std::fs::read_to_string(file).map_err(|source| io_error(file, source))
}

fn io_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time: {e}"))
}
