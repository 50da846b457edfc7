//! Sealstream command-line pipe.
//!
//! # Usage
//!
//! ```bash
//! # Generate a key
//! sealstream keygen --out stream.key
//!
//! # Encrypt stdin to a file
//! tar c docs | sealstream encrypt --key stream.key --output docs.tar.sealed
//!
//! # Decrypt back to stdout
//! sealstream decrypt --key stream.key --input docs.tar.sealed | tar x
//!
//! # Derive the key from a password instead
//! sealstream encrypt --password-file pw.txt --input notes.md --output notes.md.sealed
//! ```
//!
//! Logs go to stderr so stdout can carry ciphertext or plaintext.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use sealstream_cli::{
    CliError, DEFAULT_CHUNK_SIZE, PasswordParams, decrypt, decrypt_with_password, encrypt,
    encrypt_with_password, load_key, load_password, parse_chunk_size, write_new_key,
};
use sealstream_core::{
    DEFAULT_MAX_CHUNK_LEN, MAX_REKEY_INTERVAL, SessionKey, StreamConfig, SystemEnv,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

/// Chunked authenticated encryption pipe
#[derive(Parser, Debug)]
#[command(name = "sealstream")]
#[command(about = "Encrypt and decrypt byte streams in authenticated chunks")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh hex-encoded session key
    Keygen {
        /// Key file to create, or `-` for stdout
        #[arg(short, long, default_value = "-")]
        out: PathBuf,
    },

    /// Encrypt input into a sealed stream
    Encrypt {
        #[command(flatten)]
        pipe: PipeArgs,

        /// Plaintext bytes per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
        chunk_size: usize,

        /// Argon2id memory cost in KiB (with --password-file)
        #[arg(long, default_value_t = PasswordParams::default().m_cost_kib)]
        kdf_memory_kib: u32,

        /// Argon2id passes (with --password-file)
        #[arg(long, default_value_t = PasswordParams::default().t_cost)]
        kdf_iterations: u32,
    },

    /// Verify and decrypt a sealed stream
    Decrypt {
        #[command(flatten)]
        pipe: PipeArgs,

        /// Largest plaintext chunk accepted
        #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_LEN, value_parser = parse_chunk_size)]
        max_chunk_size: usize,
    },
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct KeySource {
    /// Hex-encoded session key file
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// File whose first line is the password; the key is derived with Argon2id
    #[arg(short, long)]
    password_file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct PipeArgs {
    #[command(flatten)]
    source: KeySource,

    /// Input file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file, or `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Chunks per subkey epoch; both sides must agree
    #[arg(long, default_value_t = MAX_REKEY_INTERVAL)]
    rekey_interval: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match args.command {
        Command::Keygen { out } => {
            let mut output = create_key_output(&out)?;
            write_new_key(&SystemEnv, &mut output)?;
            output.flush()?;
            tracing::info!(path = %out.display(), "key written");
        },
        Command::Encrypt { pipe, chunk_size, kdf_memory_kib, kdf_iterations } => {
            let secret = pipe.source.load()?;
            let config = StreamConfig::default()
                .with_rekey_interval(pipe.rekey_interval)
                .with_max_chunk_len(chunk_size);
            let params = PasswordParams {
                m_cost_kib: kdf_memory_kib,
                t_cost: kdf_iterations,
                ..PasswordParams::default()
            };

            let input = open_input(&pipe.input)?;
            let mut output = open_output(&pipe.output)?;
            let epilogue = match &secret {
                Secret::Key(key) => {
                    encrypt(input, &mut output, key, &SystemEnv, config, chunk_size)?
                },
                Secret::Password(password) => encrypt_with_password(
                    input,
                    &mut output,
                    password,
                    &SystemEnv,
                    params,
                    config,
                    chunk_size,
                )?,
            };
            output.flush()?;

            tracing::info!(size = epilogue.size, sha256 = %epilogue.sha256, "encrypted");
        },
        Command::Decrypt { pipe, max_chunk_size } => {
            let secret = pipe.source.load()?;
            let config = StreamConfig::default()
                .with_rekey_interval(pipe.rekey_interval)
                .with_max_chunk_len(max_chunk_size);

            let input = open_input(&pipe.input)?;
            let mut output = open_output(&pipe.output)?;
            let result = match &secret {
                Secret::Key(key) => decrypt(input, &mut output, key, config),
                Secret::Password(password) => {
                    decrypt_with_password(input, &mut output, password, config)
                },
            }
            .and_then(|epilogue| {
                output.flush()?;
                Ok(epilogue)
            });

            match result {
                Ok(epilogue) => {
                    tracing::info!(size = epilogue.size, sha256 = %epilogue.sha256, "decrypted");
                },
                Err(err) => {
                    drop(output);
                    discard_output(&pipe.output);
                    return Err(err.into());
                },
            }
        },
    }

    Ok(())
}

/// Key material resolved from the command line.
enum Secret {
    Key(SessionKey),
    Password(Zeroizing<Vec<u8>>),
}

impl KeySource {
    fn load(&self) -> Result<Secret, CliError> {
        match (&self.key, &self.password_file) {
            (Some(path), _) => Ok(Secret::Key(load_key(path)?)),
            (None, Some(path)) => Ok(Secret::Password(load_password(path)?)),
            (None, None) => Err(CliError::KeyFile { reason: "no key source given".to_string() }),
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

fn open_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdout().lock()));
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

/// Key files are created fresh and, on Unix, readable by the owner only.
fn create_key_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdout().lock()));
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(Box::new(options.open(path)?))
}

/// Remove a partially written plaintext file after a failed decrypt.
fn discard_output(path: &Path) {
    if is_stdio(path) {
        tracing::warn!("decryption failed; output written so far is not trustworthy");
        return;
    }
    if let Err(err) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %err, "could not remove partial output");
    }
}
