//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DashportConfig;
use crate::domain::errors::DashportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DashportConfig
/// 4. Applies environment variable overrides (DASHPORT_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use dashport::config::loader::load_config;
///
/// let config = load_config("dashport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DashportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DashportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DashportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
///
/// # Errors
///
/// Returns an error on missing variables, invalid TOML or failed validation
pub fn parse_config(contents: &str) -> Result<DashportConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: DashportConfig = toml::from_str(&contents)
        .map_err(|e| DashportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DashportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DashportError::Other(format!("placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DashportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            DashportError::Configuration(format!("Invalid value '{val}' for {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using DASHPORT_* prefix
///
/// Environment variables follow the pattern: DASHPORT_<SECTION>_<KEY>
/// For example: DASHPORT_SCHEDULE_TRIGGER_TIME, DASHPORT_LEDGER_PATH
///
/// # Errors
///
/// Returns an error if a numeric or boolean override does not parse
fn apply_env_overrides(config: &mut DashportConfig) -> Result<()> {
    if let Ok(val) = std::env::var("DASHPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Dashboard overrides
    if let Ok(val) = std::env::var("DASHPORT_DASHBOARD_BASE_URL") {
        config.dashboard.base_url = val;
    }
    if let Ok(val) = std::env::var("DASHPORT_DASHBOARD_WEBDRIVER_URL") {
        config.dashboard.webdriver_url = val;
    }
    if let Some(headless) = parse_env("DASHPORT_DASHBOARD_HEADLESS")? {
        config.dashboard.headless = headless;
    }
    if let Ok(val) = std::env::var("DASHPORT_BROWSER_BINARY") {
        if !val.trim().is_empty() {
            config.dashboard.browser_binary = Some(val);
        }
    }

    // Schedule overrides
    if let Ok(val) = std::env::var("DASHPORT_SCHEDULE_TRIGGER_TIME") {
        config.schedule.trigger_time = val;
    }

    // Export overrides
    if let Some(retries) = parse_env("DASHPORT_EXPORT_MAX_RETRIES")? {
        config.export.max_retries = retries;
    }
    if let Some(minutes) = parse_env("DASHPORT_EXPORT_TIMEOUT_MINUTES")? {
        config.export.export_timeout_minutes = minutes;
    }

    // Downloads overrides
    if let Ok(val) = std::env::var("DASHPORT_DOWNLOADS_FOLDER") {
        config.downloads.folder = val;
    }
    if let Some(open_folder) = parse_env("DASHPORT_DOWNLOADS_OPEN_FOLDER")? {
        config.downloads.open_folder = open_folder;
    }

    // Ledger overrides
    if let Ok(val) = std::env::var("DASHPORT_LEDGER_PATH") {
        config.ledger.path = val;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("DASHPORT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("DASHPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[[topics]]
id = 1
name = "Health-1"
folder = "Products"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("DASHPORT_LOADER_TEST_VAR", "test_value");
        let input = "value = \"${DASHPORT_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "value = \"test_value\"\n");
        std::env::remove_var("DASHPORT_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("DASHPORT_LOADER_MISSING_VAR");
        let input = "value = \"${DASHPORT_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("DASHPORT_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("DASHPORT_LOADER_COMMENTED");
        let input = "# value = \"${DASHPORT_LOADER_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-dashport.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.schedule.trigger_time, "14:00");
        assert_eq!(config.export.max_retries, 3);
        assert_eq!(config.downloads.file_extension, ".zip");
        assert_eq!(config.topic_table().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let err = parse_config("[[topics]\nid = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[dashboard]
base_url = "https://dash.example.com"
headless = true

[schedule]
trigger_time = "09:30"
holidays = ["2025-01-01", "2025-05-01"]

[export]
max_retries = 2

[[topics]]
id = 1
name = "Health-1"
folder = "Products"

[[topics]]
id = 9
name = "Health-main"
folder = "Shared"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.dashboard.base_url, "https://dash.example.com");
        assert!(config.dashboard.headless);
        assert_eq!(config.schedule.trigger_time, "09:30");
        assert_eq!(config.schedule.holidays.len(), 2);
        assert_eq!(config.export.max_retries, 2);
        assert_eq!(config.topics.len(), 2);
    }
}
