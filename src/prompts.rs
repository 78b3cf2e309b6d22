//! Interactive prompt helpers shared by the guided terminal flows.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;

pub(crate) fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool> {
    loop {
        print!("{prompt}");
        let _ = io::stdout().flush();

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let trimmed = input.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Ok(default_yes);
        }
        match trimmed.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {
                println!("{}", "Please answer y or n.".bright_yellow());
            }
        }
    }
}

/// Read one trimmed line. Empty input returns an empty string.
pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
