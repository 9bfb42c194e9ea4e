pub mod prompts;

pub use prompts::{DialoguerPrompter, NonInteractivePrompter, Prompter, UserCredentials};
