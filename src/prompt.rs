//! Interactive fix confirmation

use colored::Colorize;
use dialoguer::Confirm;
use itemkit::{ConfirmCallback, Error};

/// Asks the operator on the terminal before each fix
pub struct TerminalConfirm;

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> itemkit::Result<bool> {
        let (details, question) = split_question(prompt);

        println!();
        for line in details.lines() {
            println!("{}", line.cyan());
        }

        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

/// Split the rendered change from the trailing question line
fn split_question(prompt: &str) -> (&str, &str) {
    match prompt.rsplit_once('\n') {
        Some((details, question)) => (details, question),
        None => ("", prompt),
    }
}
