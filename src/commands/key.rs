use anyhow::{Result, bail};

use crate::llm::secrets::{CredentialPrompter, CredentialStore};
use crate::palette::Palette;
use crate::utils::ask_yn;

#[derive(Debug, Default)]
pub struct KeyAction {
    pub set: Option<String>,
    pub clear: bool,
    pub view: bool,
    pub assume_yes: bool,
}

pub fn run<P: CredentialPrompter>(
    credentials: &CredentialStore<P>,
    action: KeyAction,
) -> Result<()> {
    let mut action_taken = false;

    if let Some(key) = action.set {
        credentials.set(&key)?;
        println!("API key updated successfully.");
        action_taken = true;
    }

    if action.clear {
        let confirmed = action.assume_yes
            || ask_yn("Are you sure you want to clear the stored API key?".to_string())?;
        if confirmed {
            if credentials.clear()? {
                println!("API key cleared.");
            } else {
                println!("No API key found in the local store.");
            }
        } else {
            println!("Aborting; API key kept.");
        }
        action_taken = true;
    }

    if action.view {
        match credentials.view()? {
            Some((masked, source)) => println!(
                "Current API key ({}): {}",
                source.description(),
                Palette::paint(Palette::ACCENT, masked)
            ),
            None => println!("No API key stored."),
        }
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --view.");
    }
    Ok(())
}
