use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(default_value) = default {
        input = input.default(default_value.to_string());
    }
    input.interact_text().wrap_err("Failed to read input")
}

/// Prompt for a URL, insisting on an http(s) scheme
pub fn prompt_url(prompt: &str, default: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(|input: &String| -> Result<(), &'static str> {
            if input.starts_with("http://") || input.starts_with("https://") {
                Ok(())
            } else {
                Err("URL must start with http:// or https://")
            }
        })
        .interact_text()
        .map(|url| url.trim_end_matches('/').to_string())
        .wrap_err("Failed to read input")
}

/// Masked input for API keys
pub fn prompt_secret(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .wrap_err("Failed to read API key")
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .wrap_err("Failed to read confirmation")
}

pub fn prompt_number(prompt: &str, default: u64) -> Result<u64> {
    Input::<u64>::new()
        .with_prompt(prompt)
        .default(default)
        .interact_text()
        .wrap_err("Failed to read input")
}
