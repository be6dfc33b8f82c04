use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub planner_model: String,
    pub search_model: String,
    pub writer_model: String,
    pub searxng_url: String,
    pub smtp_host: String,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub from_email: String,
    pub max_questions: u32,
    pub admin_session_id: String,
    pub rate_limit_per_minute: u32,
    pub research_config: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .ok(),
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            planner_model: std::env::var("PLANNER_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            search_model: std::env::var("SEARCH_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            writer_model: std::env::var("WRITER_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            searxng_url: std::env::var("SEARXNG_URL")
                .unwrap_or_else(|_| "http://localhost:8888".to_string()),
            smtp_host: std::env::var("SMTP_HOST")
                .unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_user: non_empty_var("SMTP_USER"),
            smtp_pass: non_empty_var("SMTP_PASS"),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "briefs@example.com".to_string()),
            max_questions: std::env::var("MAX_QUESTIONS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            admin_session_id: std::env::var("ADMIN_SESSION_ID")
                .unwrap_or_else(|_| "ADMIN-OVERRIDE".to_string()),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            research_config: non_empty_var("RESEARCH_CONFIG"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainWeight {
    pub domain: String,
    pub weight: f64,
}

/// Tuning knobs of the research pipeline. Read once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSettings {
    pub max_sources: usize,
    pub max_concurrency: usize,
    pub max_total_queries: usize,
    pub recency_days_default: i64,
    pub domain_weights: Vec<DomainWeight>,
    pub regulator_domains: Vec<String>,
    pub independent_domains: Vec<String>,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        let weights = [
            ("sec.gov", 2.5),
            ("reuters.com", 1.8),
            ("bloomberg.com", 1.8),
            ("wsj.com", 1.7),
            ("ft.com", 1.7),
            ("cnbc.com", 1.6),
            ("marketwatch.com", 1.4),
            ("seekingalpha.com", 1.2),
            ("forbes.com", 1.1),
        ];

        Self {
            max_sources: 3,
            max_concurrency: 5,
            max_total_queries: 6,
            recency_days_default: 180,
            domain_weights: weights
                .iter()
                .map(|(domain, weight)| DomainWeight {
                    domain: domain.to_string(),
                    weight: *weight,
                })
                .collect(),
            regulator_domains: vec!["sec.gov".to_string()],
            independent_domains: [
                "reuters.com",
                "bloomberg.com",
                "wsj.com",
                "ft.com",
                "cnbc.com",
                "marketwatch.com",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

impl ResearchSettings {
    /// Defaults, then the settings file when a path is given, then
    /// `RESEARCH__*` environment variables (e.g. `RESEARCH__MAX_SOURCES=5`).
    ///
    /// A given path that does not exist is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&ResearchSettings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let settings: ResearchSettings = builder
            .add_source(
                config::Environment::with_prefix("RESEARCH")
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_sources >= 1, "max_sources must be at least 1");
        ensure!(self.max_concurrency >= 1, "max_concurrency must be at least 1");
        ensure!(self.max_total_queries >= 1, "max_total_queries must be at least 1");
        ensure!(self.recency_days_default >= 1, "recency_days_default must be at least 1");
        for entry in &self.domain_weights {
            ensure!(
                entry.weight > 0.0,
                "domain weight for {} must be positive",
                entry.domain
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_configuration() {
        let settings = ResearchSettings::default();
        assert_eq!(settings.max_sources, 3);
        assert_eq!(settings.max_concurrency, 5);
        assert_eq!(settings.max_total_queries, 6);
        assert_eq!(settings.recency_days_default, 180);
        assert!(settings
            .domain_weights
            .iter()
            .any(|d| d.domain == "sec.gov" && d.weight == 2.5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let settings = ResearchSettings::load(None).unwrap();
        assert_eq!(settings.domain_weights, ResearchSettings::default().domain_weights);
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_sources = 5\nrecency_days_default = 30").unwrap();

        let settings = ResearchSettings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.max_sources, 5);
        assert_eq!(settings.recency_days_default, 30);
        assert_eq!(settings.max_concurrency, 5);
        assert_eq!(settings.domain_weights, ResearchSettings::default().domain_weights);
    }

    #[test]
    fn invalid_values_in_file_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_sources = 0").unwrap();

        assert!(ResearchSettings::load(file.path().to_str()).is_err());
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(ResearchSettings::load(path.to_str()).is_err());
    }

    #[test]
    fn environment_overrides_defaults() {
        // Only this test touches max_total_queries.
        std::env::set_var("RESEARCH__MAX_TOTAL_QUERIES", "9");
        let settings = ResearchSettings::load(None);
        std::env::remove_var("RESEARCH__MAX_TOTAL_QUERIES");

        assert_eq!(settings.unwrap().max_total_queries, 9);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let settings = ResearchSettings {
            max_concurrency: 0,
            ..ResearchSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let mut settings = ResearchSettings::default();
        settings.domain_weights.push(DomainWeight {
            domain: "example.com".into(),
            weight: 0.0,
        });
        assert!(settings.validate().is_err());
    }
}
