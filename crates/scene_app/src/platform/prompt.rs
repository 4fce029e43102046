use std::io::{self, BufRead, Write};

/// Blocking user interaction: yes/no questions and alerts.
pub trait UserInteraction {
    fn confirm(&mut self, prompt: &str) -> bool;
    fn alert(&mut self, message: &str);
}

/// Asks on stderr and reads the answer from stdin.
pub struct Terminal {
    assume_yes: bool,
}

impl Terminal {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserInteraction for Terminal {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }
}
