use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind the server to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Path to the JSON video catalog (name -> file path)
    #[arg(long, default_value = "videos.json")]
    pub videos: PathBuf,

    /// Public URL advertised in the catalog instructions
    /// (falls back to the SERVER_URL env var, then http://localhost:<port>)
    #[arg(long)]
    pub server_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Socket address string to bind to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Advertised server URL: flag, then SERVER_URL env, then localhost
    pub fn effective_server_url(&self) -> String {
        self.server_url
            .clone()
            .or_else(|| std::env::var("SERVER_URL").ok())
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["ascii-streamer"]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.videos, PathBuf::from("videos.json"));
        assert!(!cli.verbose);
        assert_eq!(cli.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_server_url_flag_wins() {
        let cli = Cli::parse_from(["ascii-streamer", "--server-url", "https://ascii.example"]);
        assert_eq!(cli.effective_server_url(), "https://ascii.example");
    }

    #[test]
    fn test_server_url_defaults_to_localhost_port() {
        let cli = Cli::parse_from(["ascii-streamer", "--port", "9001"]);
        std::env::remove_var("SERVER_URL");
        assert_eq!(cli.effective_server_url(), "http://localhost:9001");
    }
}
