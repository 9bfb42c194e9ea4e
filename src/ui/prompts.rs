use dialoguer::{Input, Password, Select};

use crate::config::{DEFAULT_INSTANCE_URL, InstanceRecord};
use crate::error::{Error, Result};

/// Username/password pair for the password grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

/// Operator interaction needed while acquiring a token.
pub trait Prompter: Send + Sync {
    /// Asks for the details of an unknown instance. `Ok(None)` means the
    /// instance cannot be created here.
    fn create_instance(&self, instance_name: &str) -> Result<Option<InstanceRecord>>;

    fn user_credentials(&self) -> Result<UserCredentials>;

    fn confirm(&self, message: &str, default_yes: bool) -> Result<bool>;
}

/// Terminal prompts backed by dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

/// Never asks anything; used for CI and piped input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompter;

fn prompt_error(err: dialoguer::Error) -> Error {
    Error::validation(format!("Interactive prompt failed: {}", err))
}

fn validate_no_empty(value: &String) -> std::result::Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("A value is required.")
    } else {
        Ok(())
    }
}

/// Interactive confirmation prompt using arrow-key navigable selection
///
/// # Returns
/// * `Ok(true)` if user selects "Yes"
/// * `Ok(false)` if user selects "No"
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()
        .map_err(prompt_error)?;

    Ok(selection == 0)
}

/// Simple text input prompt with optional default value
pub fn text_input(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_prompt = Input::<String>::new().with_prompt(prompt);

    if let Some(default_val) = default {
        input_prompt = input_prompt.default(default_val.to_string());
    }

    input_prompt.interact_text().map_err(prompt_error)
}

fn required_input(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(validate_no_empty)
        .interact_text()
        .map_err(prompt_error)
}

impl Prompter for DialoguerPrompter {
    fn create_instance(&self, instance_name: &str) -> Result<Option<InstanceRecord>> {
        println!();
        println!("{} instance is not configured. Creating it:", instance_name);

        let url = text_input("WireCloud instance url", Some(DEFAULT_INSTANCE_URL))?;
        let client_id = required_input("OAuth2 Client Id")?;
        let client_secret = required_input("OAuth2 Client Secret")?;

        Ok(Some(InstanceRecord::new(url, client_id, client_secret)))
    }

    fn user_credentials(&self) -> Result<UserCredentials> {
        println!();
        let username = required_input("Username")?;
        let password = Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(prompt_error)?;

        Ok(UserCredentials { username, password })
    }

    fn confirm(&self, message: &str, default_yes: bool) -> Result<bool> {
        prompt_confirmation(message, default_yes)
    }
}

impl Prompter for NonInteractivePrompter {
    fn create_instance(&self, _instance_name: &str) -> Result<Option<InstanceRecord>> {
        Ok(None)
    }

    fn user_credentials(&self) -> Result<UserCredentials> {
        Err(Error::validation(
            "username and password required, but prompting is disabled",
        ))
    }

    fn confirm(&self, _message: &str, default_yes: bool) -> Result<bool> {
        Ok(default_yes)
    }
}
