//! Interactive selection.

use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;

use crate::error::{ClientError, ClientResult};

/// Chooses one entry from a list.
pub trait Picker: Send + Sync {
    /// Returns the index of the chosen item.
    fn pick(&self, prompt: &str, items: &[String]) -> ClientResult<usize>;
}

/// Terminal selection menu.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPicker;

impl Picker for TerminalPicker {
    fn pick(&self, prompt: &str, items: &[String]) -> ClientResult<usize> {
        if items.is_empty() {
            return Err(ClientError::Input("nothing to select".to_string()));
        }
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?;
        choice.ok_or_else(|| ClientError::Action("selection cancelled".to_string()))
    }
}
