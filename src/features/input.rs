//! Interactive feature entry
//!
//! Prompts for each field in classifier order, offering its default.

use std::io::{BufRead, Write};

use super::record::{parse_value, FeatureRecord, FEATURE_SPEC};
use crate::{Result, RetentionError};

/// Prompt for every field on `output`, reading answers from `input`
///
/// An empty answer keeps the field's default. Invalid or negative answers
/// are reported and the same field is asked again.
pub fn prompt_record<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<FeatureRecord> {
    let mut values = [0u32; FeatureRecord::DIM];

    for (idx, field) in FEATURE_SPEC.iter().enumerate() {
        values[idx] = loop {
            write!(output, "{} [{}]: ", field.label, field.default)?;
            output.flush()?;

            let line = read_answer(input)?;
            if line.is_empty() {
                break field.default;
            }

            match parse_value(field.name, &line) {
                Ok(v) => break v,
                Err(e) => {
                    log::debug!("Rejected input for {}: {}", field.name, line);
                    writeln!(output, "  {}", e)?;
                }
            }
        };
    }

    Ok(FeatureRecord::from_values(values))
}

/// Ask a yes/no question; anything but an explicit yes means no
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{} [y/N]: ", question)?;
    output.flush()?;

    match read_answer(input) {
        Ok(answer) => Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes")),
        Err(RetentionError::InvalidRecord(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(RetentionError::InvalidRecord(
            "input ended before all fields were entered".to_string(),
        ));
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_answers_keep_defaults() {
        let mut input = Cursor::new("\n".repeat(FeatureRecord::DIM));
        let mut output = Vec::new();

        let record = prompt_record(&mut input, &mut output).unwrap();
        assert_eq!(record, FeatureRecord::default());

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("Time Since Last Pickup [10]: "));
        assert!(shown.contains("Contact Frequency [5]: "));
    }

    #[test]
    fn test_invalid_answer_is_asked_again() {
        let answers = "-3\nabc\n7\n".to_string() + &"\n".repeat(FeatureRecord::DIM - 1);
        let mut input = Cursor::new(answers);
        let mut output = Vec::new();

        let record = prompt_record(&mut input, &mut output).unwrap();
        assert_eq!(record.time_since_last_pickup, 7);
        assert_eq!(record.contact_frequency, 5);

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Time Since Last Pickup").count(), 3);
        assert!(shown.contains("must be non-negative"));
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let mut input = Cursor::new("12\n4\n");
        let mut output = Vec::new();

        let err = prompt_record(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, RetentionError::InvalidRecord(_)));
    }

    #[test]
    fn test_confirm() {
        let mut output = Vec::new();
        assert!(confirm(&mut Cursor::new("y\n"), &mut output, "Again?").unwrap());
        assert!(!confirm(&mut Cursor::new("\n"), &mut output, "Again?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut output, "Again?").unwrap());
    }
}
