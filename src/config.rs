use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "MULTIORDER_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Directory holding the single-page application build
    #[arg(long, env = "MULTIORDER_STATIC_DIR", default_value = "build")]
    pub static_dir: PathBuf,

    /// Document served for paths that do not exist in the static directory
    #[arg(long, env = "MULTIORDER_INDEX_FILE", default_value = "index.html")]
    pub index_file: PathBuf,

    /// Upper bound on handling a single inbound request, in seconds
    #[arg(long, env = "MULTIORDER_REQUEST_TIMEOUT_SECS", default_value_t = 15)]
    pub request_timeout_secs: u64,

    /// Transport timeout for each outbound submission, in seconds. Unbounded if unset.
    #[arg(long, env = "MULTIORDER_REMOTE_TIMEOUT_SECS")]
    pub remote_timeout_secs: Option<u64>,

    /// Deadline for the threads of one dispatch, in seconds. Unbounded if unset.
    #[arg(long, env = "MULTIORDER_DISPATCH_DEADLINE_SECS")]
    pub dispatch_deadline_secs: Option<u64>,

    /// Log submissions and approve every account instead of calling the remote service
    #[arg(long)]
    pub dry_run: bool,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn remote_timeout(&self) -> Option<Duration> {
        self.remote_timeout_secs.map(Duration::from_secs)
    }

    pub fn dispatch_deadline(&self) -> Option<Duration> {
        self.dispatch_deadline_secs.map(Duration::from_secs)
    }

    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join(&self.index_file)
    }
}
