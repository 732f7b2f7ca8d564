/// A command line split into its verb and positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Parses raw command text such as `/essentials:TPAccept Alex`.
    ///
    /// The leading slash and any `namespace:` prefix are dropped and the verb
    /// is lowercased. Arguments keep their casing.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split_whitespace();
        let head = tokens.next()?;
        let head = head.trim_start_matches('/');
        let verb = head.rsplit(':').next().unwrap_or(head).to_ascii_lowercase();
        if verb.is_empty() {
            return None;
        }
        Some(Self {
            verb,
            args: tokens.map(str::to_owned).collect(),
        })
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}
