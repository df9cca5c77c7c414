use clap::Parser;
use prewarm_cache::{ServiceConfig, WarmerConfig};
use prewarm_core::{DEFAULT_BIND_ADDR, DEFAULT_THREADS, MIB};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "prewarm")]
#[command(about = "Pre-warm a VFS cache by reading files from a slow mount", long_about = None)]
#[command(version)]
pub struct Args {
    /// Mount point whose files are read to populate the cache
    #[arg(long)]
    pub mount: PathBuf,

    /// Directory backing the VFS cache, used for cached size reporting
    #[arg(long)]
    pub cache: PathBuf,

    /// Read buffer size in MiB
    #[arg(long, default_value_t = 1)]
    pub chunk: usize,

    /// Concurrent readers per file
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Address the HTTP API listens on
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,
}

impl Args {
    /// Build the service configuration; validation is left to the caller
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(&self.mount, &self.cache).with_warmer(WarmerConfig {
            chunk_size: self.chunk.saturating_mul(MIB),
            threads: self.threads,
        })
    }
}
