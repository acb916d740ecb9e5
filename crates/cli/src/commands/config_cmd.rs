//! `greenbible config`: configuration management commands.

use greenbible_config::AppConfig;

use super::load_config;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() {
                warnings.push("No API key set (set GREENBIBLE_API_KEY or GEMINI_API_KEY env var)");
            }

            if config.location.enabled
                && config.location.latitude.is_some() != config.location.longitude.is_some()
            {
                warnings.push("Only one of location.latitude / location.longitude is set");
            }

            if !config.gemini.endpoint.starts_with("https://") {
                warnings.push("Gemini endpoint is not HTTPS");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:     {}", config.gemini.model);
            println!("   Endpoint:  {}", config.gemini.endpoint);
            println!("   Timeout:   {}s", config.gemini.timeout_secs);
            println!("   Context:   {} messages", config.chat.context_messages);
            println!("   Locale:    {}", config.location.locale);
            println!("   Data dir:  {}", config.data_dir().display());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
