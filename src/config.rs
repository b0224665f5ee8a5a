use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use rmp_client::{DEFAULT_CACHE_CAPACITY, DEFAULT_ENDPOINT, DEFAULT_RATING_LIMIT, DEFAULT_SCHOOL};

use crate::engine::GenerationConfig;

/// Professor feedback chat service backed by Rate My Professors
#[derive(Parser, Debug, Clone)]
#[command(name = "prof-chat")]
#[command(about = "Answers questions about professors from their public ratings")]
#[command(version)]
pub struct Config {
    /// Interface to bind (IPv4 or IPv6 address)
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Chat completion model name
    #[arg(long, env = "OPENAI_MODEL")]
    pub openai_model: String,

    /// API key sent as bearer token
    #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
    pub openai_key: String,

    /// Base URL of any OpenAI-compatible API
    #[arg(long, env = "OPENAI_ENDPOINT", default_value = "https://api.openai.com/v1")]
    pub openai_endpoint: String,

    /// GraphQL endpoint for professor data
    #[arg(long, env = "RMP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub rmp_endpoint: String,

    /// Raw school id (base64-encoded before use) scoping name search
    #[arg(long, env = "RMP_SCHOOL", default_value = DEFAULT_SCHOOL)]
    pub rmp_school: String,

    /// Ratings fetched per professor
    #[arg(long, env = "RMP_RATING_LIMIT", default_value_t = DEFAULT_RATING_LIMIT)]
    pub rmp_rating_limit: u32,

    /// Maximum professor records held in memory
    #[arg(long, env = "RMP_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub rmp_cache_capacity: u64,

    /// Upstream request timeout in seconds
    #[arg(
        long,
        env = "RMP_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rmp_timeout_secs: u64,

    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = 0.5)]
    pub llm_temperature: f64,

    #[arg(long, env = "LLM_MAX_TOKENS", default_value_t = 1000)]
    pub llm_max_tokens: u64,
}

impl Config {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn rmp_timeout(&self) -> Duration {
        Duration::from_secs(self.rmp_timeout_secs)
    }

    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.llm_temperature,
            max_tokens: self.llm_max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["prof-chat", "--openai-model", "gpt-4o-mini", "--openai-key", "sk-test"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.rmp_school, "School-1452");
        assert_eq!(config.rmp_rating_limit, 25);
        assert_eq!(config.rmp_timeout(), Duration::from_secs(10));
        assert_eq!(config.generation().max_tokens, 1000);
    }

    #[test]
    fn test_bind_addr() {
        let config = parse(&["--host", "127.0.0.1", "--port", "9000"]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_ipv6_bind_addr() {
        let config = parse(&["--host", "::", "--port", "8000"]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "[::]:8000");

        let config = parse(&["--host", "::1", "--port", "9000"]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "[::1]:9000");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let argv = [
            "prof-chat",
            "--openai-model",
            "gpt-4o-mini",
            "--openai-key",
            "sk-test",
            "--rmp-timeout-secs",
            "0",
        ];
        assert!(Config::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_bad_host_rejected() {
        let config = parse(&["--host", "not a host"]);
        assert!(config.bind_addr().is_err());
    }
}
