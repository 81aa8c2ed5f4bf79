//! Interactive prompting for mandatory options left off the command line.

use std::io::{self, BufRead, Write};

use crate::error::CliError;

/// Return `value` if given, otherwise ask on stderr and read a line from stdin.
pub fn value_or_prompt(value: Option<&str>, label: &str) -> Result<String, CliError> {
    match value {
        Some(value) => Ok(value.to_owned()),
        None => prompt(&mut io::stdin().lock(), &mut io::stderr(), label),
    }
}

/// Ask for `label` until a non-empty line is entered.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> Result<String, CliError> {
    loop {
        write!(output, "{label}: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(CliError::Prompt(format!(
                "missing value for {label}: input closed"
            )));
        }

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_owned());
        }
    }
}
