//! Yes/no decisions requested from the operator.

use crate::errors::DeployResult;
use inquire::InquireError;
use nu_ansi_term::Color;
use std::io::{self, BufRead, Write};

/// A source of yes/no answers for questions raised while preparing a deploy.
pub trait Confirm {
    /// Asks whether to continue despite the condition described by `question`.
    ///
    /// ## Returns
    /// - `Ok(true)` - Continue.
    /// - `Ok(false)` - Decline.
    fn confirm(&mut self, question: &str) -> DeployResult<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, question: &str) -> DeployResult<bool> {
        Ok(self(question))
    }
}

/// Console-backed [Confirm], answered on standard input.
///
/// Only `y` (in either case) continues. Any other answer, including an empty one or cancelling the
/// prompt, declines. When standard input is not a terminal the question is asked as a plain line.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquireConfirm;

impl Confirm for InquireConfirm {
    fn confirm(&mut self, question: &str) -> DeployResult<bool> {
        let prompt = format!(
            "<{}> Do you want to continue? (y/n)",
            Color::Yellow.paint(question)
        );
        let answer = inquire::Confirm::new(prompt.as_str())
            .with_parser(&|answer| Ok(is_affirmative(answer)))
            .prompt();

        settle(answer, || {
            ask_line(question, &mut io::stdin().lock(), &mut io::stdout().lock())
        })
    }
}

/// Turns the outcome of an interactive prompt into a decision. A cancelled prompt declines, and
/// `fallback` answers instead when there is no terminal to prompt on.
fn settle<F>(answer: Result<bool, InquireError>, fallback: F) -> DeployResult<bool>
where
    F: FnOnce() -> DeployResult<bool>,
{
    match answer {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(InquireError::NotTTY) => fallback(),
        Err(e) => Err(e.into()),
    }
}

/// Writes `question` to `output` and reads a single line answer from `input`.
fn ask_line<R, W>(question: &str, input: &mut R, output: &mut W) -> DeployResult<bool>
where
    R: BufRead,
    W: Write,
{
    write!(output, "<{}> Do you want to continue? (y/n): ", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(is_affirmative(line.trim_end_matches(['\r', '\n'])))
}

/// Returns `true` iff the answer is exactly `y` or `Y`.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod test {
    use super::{ask_line, is_affirmative, settle, Confirm};
    use crate::errors::DeployError;
    use inquire::InquireError;
    use std::io::Cursor;

    #[test]
    fn only_y_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        for answer in ["", "n", "N", "yes", " y", "yy", "no"] {
            assert!(!is_affirmative(answer), "{answer:?} should decline");
        }
    }

    #[test]
    fn closures_are_confirmers() {
        let mut asked = Vec::new();
        let mut confirm = |question: &str| {
            asked.push(question.to_string());
            true
        };
        assert!(confirm.confirm("continue?").unwrap());
        assert_eq!(asked, vec!["continue?".to_string()]);
    }

    #[test]
    fn cancelled_prompt_declines() {
        for err in [InquireError::OperationCanceled, InquireError::OperationInterrupted] {
            let answer = settle(Err(err), || panic!("no fallback expected")).unwrap();
            assert!(!answer);
        }
    }

    #[test]
    fn missing_terminal_falls_back_to_line_input() {
        assert!(settle(Err(InquireError::NotTTY), || Ok(true)).unwrap());
        assert!(!settle(Err(InquireError::NotTTY), || Ok(false)).unwrap());
    }

    #[test]
    fn other_prompt_errors_propagate() {
        let err = settle(
            Err(InquireError::InvalidConfiguration("bad".to_string())),
            || Ok(true),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::InquireError(_)));
    }

    #[test]
    fn line_input_accepts_only_y() {
        for (input, expected) in [
            ("y\n", true),
            ("Y\r\n", true),
            ("y", true),
            ("yes\n", false),
            ("n\n", false),
            ("\n", false),
            ("", false),
        ] {
            let mut output = Vec::new();
            let answer = ask_line(
                "File README.md is not in dags/install directory",
                &mut Cursor::new(input),
                &mut output,
            )
            .unwrap();
            assert_eq!(answer, expected, "{input:?}");
            assert_eq!(
                String::from_utf8(output).unwrap(),
                "<File README.md is not in dags/install directory> Do you want to continue? (y/n): "
            );
        }
    }
}
