use crate::config::types::{
    Config, CrawlerConfig, EntryPoint, FilterConfig, OutputConfig, UserAgentConfig,
};
use crate::url::{evaluate, AdmissionPolicy};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_filter_config(&config.filter)?;
    validate_entry_points(config)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 32, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 5, got {}",
            config.max_retries
        )));
    }

    if config.min_text_length < 1 {
        return Err(ConfigError::Validation(
            "min_text_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.corpus_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "corpus_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the shared admission rules
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for domain in &config.allowed_domains {
        validate_domain_pattern(domain)?;
    }

    for key in config
        .disallowed_query_keys
        .iter()
        .chain(&config.pagination_keys)
    {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "query keys cannot be empty".to_string(),
            ));
        }
    }

    for segment in &config.excluded_path_segments {
        if !segment.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "excluded path segment '{}' must start with '/'",
                segment
            )));
        }
    }

    Ok(())
}

/// Validates entry points against their effective admission policy
fn validate_entry_points(config: &Config) -> Result<(), ConfigError> {
    if config.entry_points.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[entry-point]] is required".to_string(),
        ));
    }

    for entry in &config.entry_points {
        validate_entry_point(config, entry)?;
    }

    Ok(())
}

fn validate_entry_point(config: &Config, entry: &EntryPoint) -> Result<(), ConfigError> {
    let url = Url::parse(&entry.url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid entry point '{}': {}", entry.url, e))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Entry point '{}' must use HTTP or HTTPS",
            entry.url
        )));
    }

    let domains = config.allowed_domains_for(entry);
    if domains.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Entry point '{}' has no allowed domains",
            entry.url
        )));
    }

    for domain in domains {
        validate_domain_pattern(domain)?;
    }

    // The seed itself must pass the filter it will be crawled under
    let policy = AdmissionPolicy::for_entry_point(config, entry);
    let verdict = evaluate(&entry.url, &policy, 0);
    if !verdict.is_admitted() {
        return Err(ConfigError::Validation(format!(
            "Entry point '{}' is rejected by its own admission rules: {}",
            entry.url, verdict
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., kennesaw.edu, not just "kennesaw")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.edu')",
            domain
        )));
    }

    Ok(())
}
