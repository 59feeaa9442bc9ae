#![forbid(unsafe_code)]

//! xmlsign CLI: sign and verify XML documents.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use xmlsign::crypto::registry::SIGNATURE_ALGORITHMS;
use xmlsign::{DigestMethod, Element, Error, KeyInput, KeyMaterial, KeySource, Payload, SigningRequest, VerifyOptions};

#[derive(Parser)]
#[command(
    name = "xmlsign",
    about = "XML Digital Signatures (HMAC, RSA, DSA) with exclusive C14N",
    version
)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a document or a piece of text
    Sign {
        /// Input file
        file: PathBuf,

        /// Treat the input as opaque text instead of XML
        #[arg(long, conflicts_with = "enveloped")]
        text: bool,

        /// Signature method short name (e.g. rsa-sha256, dsa-sha1, hmac-sha256)
        #[arg(short = 's', long = "signature-method", default_value = "dsa-sha1")]
        signature_method: String,

        /// Digest method short name (sha1, sha224, sha256, sha384, sha512)
        #[arg(short = 'd', long = "digest-method", default_value = "sha1")]
        digest_method: String,

        /// Append the signature to the document instead of wrapping the payload
        #[arg(long)]
        enveloped: bool,

        /// Keep comments in the signed content
        #[arg(long = "with-comments")]
        with_comments: bool,

        #[command(flatten)]
        key: KeyArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a signed document
    Verify {
        /// Input XML file
        file: PathBuf,

        #[command(flatten)]
        key: KeyArgs,

        /// Accept the public key embedded in KeyInfo when no key is given
        #[arg(long = "trust-key-info")]
        trust_key_info: bool,
    },

    /// List supported algorithms and key formats
    Info,
}

#[derive(clap::Args)]
struct KeyArgs {
    /// PEM key file (PKCS#8, encrypted PKCS#8, PKCS#1 or SPKI)
    #[arg(short = 'k', long, conflicts_with = "hmac_key")]
    key: Option<PathBuf>,

    /// Passphrase for an encrypted PEM key
    #[arg(long, requires = "key")]
    passphrase: Option<String>,

    /// Raw HMAC key (binary file)
    #[arg(long = "hmac-key")]
    hmac_key: Option<PathBuf>,
}

impl KeyArgs {
    fn load(self) -> Result<Option<KeyInput>, Error> {
        if let Some(path) = self.hmac_key {
            let secret = std::fs::read(&path).map_err(|e| io_error(&path, e))?;
            return Ok(Some(KeyMaterial::Hmac(secret).into()));
        }
        let Some(path) = self.key else {
            return Ok(None);
        };
        let pem = read_file(&path)?;
        Ok(Some(match self.passphrase {
            Some(passphrase) => KeyInput::encrypted_pem(pem, passphrase),
            None => KeyInput::pem(pem),
        }))
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sign {
            file,
            text,
            signature_method,
            digest_method,
            enveloped,
            with_comments,
            key,
            output,
        } => cmd_sign(file, text, &signature_method, &digest_method, enveloped, with_comments, key, output),
        Commands::Verify {
            file,
            key,
            trust_key_info,
        } => cmd_verify(file, key, trust_key_info),
        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
fn cmd_sign(
    file: PathBuf,
    text: bool,
    signature_method: &str,
    digest_method: &str,
    enveloped: bool,
    with_comments: bool,
    key: KeyArgs,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let input = read_file(&file)?;
    let payload = if text {
        Payload::Text(input)
    } else {
        Payload::Element(Element::parse(&input)?)
    };
    let key = key
        .load()?
        .ok_or_else(|| Error::InvalidInput("signing needs --key or --hmac-key".into()))?;

    let request = SigningRequest::new(payload, key)
        .with_signature_name(signature_method)?
        .with_digest_name(digest_method)?
        .enveloped(enveloped)
        .with_comments(with_comments);

    tracing::info!(file = %file.display(), "signing");
    let signed = xmlsign::sign_with_os_rng(request)?;
    write_output(output, signed.to_xml().as_bytes())
}

fn cmd_verify(file: PathBuf, key: KeyArgs, trust_key_info: bool) -> Result<(), Error> {
    let xml = read_file(&file)?;
    let options = VerifyOptions {
        key: key.load()?,
        trust_key_info,
        hash_factory: None,
    };

    tracing::info!(file = %file.display(), "verifying");
    match xmlsign::verify(&xml, &options) {
        Ok(verified) => {
            let source = match verified.key_source {
                KeySource::Supplied => "supplied key",
                KeySource::KeyInfo => "KeyInfo key",
            };
            println!(
                "OK ({}, {}, {source})",
                verified.signature_algorithm.name(),
                verified.digest_method.name()
            );
            Ok(())
        }
        Err(Error::InvalidSignature(reason)) => {
            eprintln!("INVALID: {reason}");
            process::exit(1);
        }
        Err(e) => Err(e),
    }
}

fn cmd_info() -> Result<(), Error> {
    println!("xmlsign: XML Digital Signatures");
    println!();
    println!("Signature methods:");
    for algorithm in SIGNATURE_ALGORITHMS {
        println!("  {:<12} {}", algorithm.name(), algorithm.uri());
    }
    println!();
    println!("Digest methods:");
    for method in DigestMethod::ALL {
        println!("  {:<12} {}", method.name(), method.uri());
    }
    println!();
    println!("Canonicalization:");
    println!("  Exclusive C14N 1.0 (±comments)");
    println!();
    println!("Key formats:");
    println!("  PEM: PKCS#8 (plain and encrypted), PKCS#1, SPKI (RSA, DSA)");
    println!("  raw binary (HMAC)");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn io_error(path: &Path, e: std::io::Error) -> Error {
    Error::InvalidInput(format!("{}: {e}", path.display()))
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| io_error(&p, e)),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(data)
                .map_err(|e| Error::InvalidInput(format!("stdout: {e}")))
        }
    }
}
