//! Splitting raw input lines into a command name and its arguments.
//!
//! Tokenization is plain whitespace splitting. Quotes are left untouched here;
//! the only command that cares about them is `echo`, which looks at the raw line.

/// One command ready for dispatch: the name, its arguments, and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
    /// The trimmed text the tokens were produced from.
    pub raw: String,
}

impl Invocation {
    /// Tokenizes `line`. Returns `None` when the line holds no tokens at all.
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim();
        let mut fields = split_into_tokens(raw).into_iter();
        let name = fields.next()?;
        Some(Self {
            name,
            args: fields.collect(),
            raw: raw.to_string(),
        })
    }

    /// Appends one trailing argument, keeping `raw` in step with the tokens.
    pub fn push_arg(&mut self, arg: impl Into<String>) {
        let arg = arg.into();
        self.raw.push(' ');
        self.raw.push_str(&arg);
        self.args.push(arg);
    }
}

/// Whitespace-delimited fields of the trimmed line.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
