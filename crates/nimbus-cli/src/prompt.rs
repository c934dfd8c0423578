//! Terminal-backed second-factor prompt

use std::io::{self, Write};

use nimbus_core::CredentialPrompt;

pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn one_time_code(&self) -> io::Result<String> {
        print!("Enter the one-time auth code: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;

        Ok(line.trim().to_string())
    }
}
