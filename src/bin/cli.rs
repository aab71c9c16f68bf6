//! mcbin CLI Client
//!
//! Command-line interface for talking to a memcached-compatible server
//! over the binary protocol.

use clap::{Parser, Subcommand};
use mcbin::{Client, Config, Credentials, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// mcbin CLI
#[derive(Parser, Debug)]
#[command(name = "mcbin-cli")]
#[command(about = "CLI for memcached binary protocol servers")]
#[command(version)]
struct Args {
    /// Server address (host:port); falls back to MCBIN_ADDR, then 127.0.0.1:11211
    #[arg(short, long)]
    server: Option<String>,

    /// SASL username (enables authentication)
    #[arg(short, long, requires = "password")]
    username: Option<String>,

    /// SASL password
    #[arg(short, long, requires = "username")]
    password: Option<String>,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Store a value unconditionally (or against a CAS)
    Set {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        flags: u32,
        /// Seconds until expiry (0 = never)
        #[arg(long, default_value = "0")]
        expiration: u32,
        #[arg(long, default_value = "0")]
        cas: u64,
    },

    /// Store only if the key is absent
    Add {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        flags: u32,
        #[arg(long, default_value = "0")]
        expiration: u32,
    },

    /// Store only if the key is present
    Replace {
        key: String,
        value: String,
        #[arg(long, default_value = "0")]
        flags: u32,
        #[arg(long, default_value = "0")]
        expiration: u32,
        #[arg(long, default_value = "0")]
        cas: u64,
    },

    /// Append to an existing value
    Append { key: String, value: String },

    /// Prepend to an existing value
    Prepend { key: String, value: String },

    /// Increment a counter
    Incr {
        key: String,
        #[arg(default_value = "1")]
        delta: u64,
        #[arg(long, default_value = "0")]
        initial: u64,
        #[arg(long, default_value = "0")]
        expiration: u32,
    },

    /// Decrement a counter (floors at 0)
    Decr {
        key: String,
        #[arg(default_value = "1")]
        delta: u64,
        #[arg(long, default_value = "0")]
        initial: u64,
        #[arg(long, default_value = "0")]
        expiration: u32,
    },

    /// Delete a key
    Del {
        key: String,
        #[arg(long, default_value = "0")]
        cas: u64,
    },

    /// Invalidate all items
    Flush {
        /// Seconds before invalidation (0 = now)
        #[arg(default_value = "0")]
        delay: u32,
    },

    /// Print the server version
    Version,

    /// Ping the server
    Noop,

    /// List SASL mechanisms
    Mechs,
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,mcbin=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = match args.server {
        Some(addr) => Config::builder().server_addr(addr),
        None => {
            let env = Config::from_env()?;
            Config::builder().server_addr(env.server_addr)
        }
    };
    builder = builder
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms);
    if let (Some(username), Some(password)) = (args.username, args.password) {
        builder = builder.credentials(Credentials::new(username, password));
    }
    let config = builder.try_build()?;

    tracing::debug!("Connecting to {}", config.server_addr);
    let mut client = Client::connect(&config)?;

    match args.command {
        Commands::Get { key } => {
            let item = client.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&item.value));
            tracing::info!(flags = item.flags, cas = item.cas, "get");
        }
        Commands::Set {
            key,
            value,
            flags,
            expiration,
            cas,
        } => {
            let cas = client.set(key.as_bytes(), value.as_bytes(), flags, expiration, cas)?;
            println!("STORED cas={}", cas);
        }
        Commands::Add {
            key,
            value,
            flags,
            expiration,
        } => {
            let cas = client.add(key.as_bytes(), value.as_bytes(), flags, expiration)?;
            println!("STORED cas={}", cas);
        }
        Commands::Replace {
            key,
            value,
            flags,
            expiration,
            cas,
        } => {
            let cas = client.replace(key.as_bytes(), value.as_bytes(), flags, expiration, cas)?;
            println!("STORED cas={}", cas);
        }
        Commands::Append { key, value } => {
            let cas = client.append(key.as_bytes(), value.as_bytes())?;
            println!("STORED cas={}", cas);
        }
        Commands::Prepend { key, value } => {
            let cas = client.prepend(key.as_bytes(), value.as_bytes())?;
            println!("STORED cas={}", cas);
        }
        Commands::Incr {
            key,
            delta,
            initial,
            expiration,
        } => {
            let (value, cas) = client.increment(key.as_bytes(), delta, initial, expiration)?;
            println!("{} cas={}", value, cas);
        }
        Commands::Decr {
            key,
            delta,
            initial,
            expiration,
        } => {
            let (value, cas) = client.decrement(key.as_bytes(), delta, initial, expiration)?;
            println!("{} cas={}", value, cas);
        }
        Commands::Del { key, cas } => {
            client.delete_cas(key.as_bytes(), cas)?;
            println!("DELETED");
        }
        Commands::Flush { delay } => {
            client.flush(delay)?;
            println!("OK");
        }
        Commands::Version => println!("{}", client.version()?),
        Commands::Noop => {
            client.noop()?;
            println!("PONG");
        }
        Commands::Mechs => println!("{}", client.list_mechanisms()?.join(" ")),
    }

    client.close()
}
