//! Console line parsing and record-body collection.

use std::io::{BufRead, Write};

use crate::errors::AppError;

/// Prompts shown while collecting a record body, in wire order.
pub const BODY_PROMPTS: [&str; 6] = [
    "name",
    "coordinate x",
    "coordinate y",
    "engine power",
    "distance travelled",
    "fuel type (kerosene, electricity, diesel, antimatter, nuclear or 1-5)",
];

/// Splits a console line into a command name and its arguments.
///
/// Returns `None` for blank lines.
#[must_use]
pub fn tokenize(line: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = line.split_whitespace().map(str::to_owned);
    let command = tokens.next()?;
    Some((command, tokens.collect()))
}

/// Prompts for each body field in turn and gathers the raw answers.
///
/// The answers are sent to the daemon unvalidated; field validation lives
/// server-side so every client sees the same rules.
///
/// # Errors
///
/// Returns [`AppError::InputClosed`] when the console ends mid-body and
/// propagates read and write failures.
pub fn collect_body(
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Vec<String>, AppError> {
    let mut fields = Vec::with_capacity(BODY_PROMPTS.len());
    for prompt in BODY_PROMPTS {
        write!(output, "Enter {prompt}: ").map_err(AppError::WriteOutput)?;
        output.flush().map_err(AppError::WriteOutput)?;
        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(AppError::ReadInput)?;
        if read == 0 {
            return Err(AppError::InputClosed);
        }
        fields.push(line.trim().to_owned());
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("show", "show", &[])]
    #[case("  remove_key   42 ", "remove_key", &["42"])]
    #[case("insert 5 extra", "insert", &["5", "extra"])]
    fn tokenize_splits_command_and_arguments(
        #[case] line: &str,
        #[case] command: &str,
        #[case] arguments: &[&str],
    ) {
        let (parsed_command, parsed_arguments) = tokenize(line).expect("tokens");
        assert_eq!(parsed_command, command);
        assert_eq!(parsed_arguments, arguments);
    }

    #[rstest]
    #[case("")]
    #[case("   \t ")]
    fn blank_lines_produce_no_command(#[case] line: &str) {
        assert!(tokenize(line).is_none());
    }

    #[test]
    fn collect_body_gathers_one_answer_per_prompt() {
        let mut input = "hauler\n3\n-7\n120\n400\ndiesel\n".as_bytes();
        let mut output = Vec::new();
        let fields = collect_body(&mut input, &mut output).expect("body");
        assert_eq!(fields.len(), BODY_PROMPTS.len());
        assert_eq!(fields[0], "hauler");
        assert_eq!(fields[5], "diesel");
        let prompts = String::from_utf8(output).expect("utf8");
        assert!(prompts.contains("Enter name:"));
        assert!(prompts.contains("Enter fuel type"));
    }

    #[test]
    fn early_end_of_input_is_reported() {
        let mut input = "hauler\n3\n".as_bytes();
        let mut output = Vec::new();
        let error = collect_body(&mut input, &mut output).expect_err("truncated");
        assert!(matches!(error, AppError::InputClosed));
    }
}
