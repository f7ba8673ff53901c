use reedline::{Completer, Span, Suggestion};

/// Completes REPL commands and catalog column / result header names
pub struct WorkbenchCompleter {
    commands: Vec<String>,
    columns: Vec<String>,
}

impl WorkbenchCompleter {
    pub fn new(commands: &[&str], columns: Vec<String>) -> Self {
        Self {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            columns,
        }
    }
}

impl Completer for WorkbenchCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let start = input
            .rfind(|c: char| c.is_whitespace() || c == ',')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let partial = &input[start..];

        let completing_command = start == 0 && partial.starts_with('\\');
        let (candidates, description) = if completing_command {
            (&self.commands, "command")
        } else {
            (&self.columns, "column")
        };

        let lower = partial.to_lowercase();
        candidates
            .iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&lower))
            .map(|value| Suggestion {
                value: value.clone(),
                description: Some(description.to_string()),
                extra: None,
                span: Span { start, end: pos },
                style: None,
                append_whitespace: completing_command,
            })
            .collect()
    }
}
