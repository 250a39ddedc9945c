//! shardcache CLI
//!
//! Runs single commands against a sharded Redis group described by a
//! topology file, or against an in-process memory cluster.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shardcache::backend::MemoryCluster;
use shardcache::{Config, ShardInfo, ShardedClient, TopologyFile};
use tracing_subscriber::{fmt, EnvFilter};

/// shardcache CLI
#[derive(Parser, Debug)]
#[command(name = "shardcache-cli")]
#[command(about = "CLI for sharded Redis caches")]
#[command(version)]
struct Args {
    /// Topology file (YAML)
    #[arg(short, long, env = "SHARDCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Group of servers to use from the topology file
    #[arg(short, long, default_value = "default")]
    group: String,

    /// Use an in-process cluster with this many shards instead of Redis
    #[arg(short, long, conflicts_with = "config")]
    memory: Option<usize>,

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

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expiry in seconds (0 = none)
        #[arg(short, long, default_value = "0")]
        expire: i64,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Increment a counter
    Incr {
        /// The counter key
        key: String,
    },

    /// Check whether a key exists
    Exists {
        /// The key to check
        key: String,
    },

    /// Ping every shard
    Ping,

    /// Show which shard owns a key
    Route {
        /// The key to route
        key: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardcache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = match build_client(&args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(&client, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

fn build_client(args: &Args) -> shardcache::Result<ShardedClient> {
    if let Some(shards) = args.memory {
        tracing::info!("Using in-process cluster with {} shards", shards);
        let cluster = MemoryCluster::new();
        let mut builder = Config::builder();
        for i in 0..shards {
            let port = 7000u16.saturating_add(i as u16);
            builder = builder.shard(ShardInfo::new(format!("memory-{}", i), "memory", port));
        }
        return ShardedClient::with_connector(builder.build(), Arc::new(cluster.connector()));
    }

    let path = args.config.as_ref().ok_or_else(|| {
        shardcache::CacheError::Configuration(
            "either --config or --memory is required".to_string(),
        )
    })?;

    tracing::info!("Loading topology {} (group {})", path.display(), args.group);
    let topology = TopologyFile::load(path)?;
    ShardedClient::connect(topology.group(&args.group)?)
}

fn execute(client: &ShardedClient, command: Commands) -> shardcache::Result<()> {
    match command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value, expire } => {
            client.set(&key, &value, expire)?;
            println!("OK");
        }
        Commands::Del { key } => println!("(integer) {}", client.del(&key)?),
        Commands::Incr { key } => println!("(integer) {}", client.incr(&key)?),
        Commands::Exists { key } => println!("(integer) {}", client.exists(&key)? as i64),
        Commands::Ping => {
            let mut failed = None;
            for (shard, outcome) in client.ping_all() {
                match outcome {
                    Ok(()) => println!("{}: PONG", shard),
                    Err(e) => {
                        println!("{}: {}", shard, e);
                        failed = Some(e);
                    }
                }
            }
            if let Some(e) = failed {
                return Err(e);
            }
        }
        Commands::Route { key } => {
            let shard = client.shard_for(&key)?;
            println!("{} -> {} ({})", key, shard.name, shard);
        }
    }
    Ok(())
}
