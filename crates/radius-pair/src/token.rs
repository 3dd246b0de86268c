/// Pair operators as spelled in the legacy textual form
///
/// Assignment operators describe how a pair merges into a list; comparison
/// operators describe how a filter pair matches a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// `=` - add if not already present
    #[default]
    Eq,
    /// `:=` - replace any existing instance
    Set,
    /// `+=` - always add
    Add,
    /// `-=` - remove matching instances
    Sub,
    /// `==`
    CmpEq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=~` - regular expression match
    RegEq,
    /// `!~` - regular expression non-match
    RegNe,
    /// `=*` - attribute exists
    CmpTrue,
    /// `!*` - attribute does not exist
    CmpFalse,
}

impl Operator {
    /// Longest spellings first so prefix scanning is unambiguous
    const TOKENS: [(&'static str, Operator); 14] = [
        (":=", Operator::Set),
        ("+=", Operator::Add),
        ("-=", Operator::Sub),
        ("==", Operator::CmpEq),
        ("!=", Operator::Ne),
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("=~", Operator::RegEq),
        ("!~", Operator::RegNe),
        ("=*", Operator::CmpTrue),
        ("!*", Operator::CmpFalse),
        ("<", Operator::Lt),
        (">", Operator::Gt),
        ("=", Operator::Eq),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Set => ":=",
            Operator::Add => "+=",
            Operator::Sub => "-=",
            Operator::CmpEq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::RegEq => "=~",
            Operator::RegNe => "!~",
            Operator::CmpTrue => "=*",
            Operator::CmpFalse => "!*",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }

    /// Match the operator at the start of `input`, returning it and its length
    pub fn scan(input: &str) -> Option<(Self, usize)> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| input.starts_with(*t))
            .map(|(t, op)| (*op, t.len()))
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Set | Operator::Add | Operator::Sub
        )
    }

    pub fn is_comparison(self) -> bool {
        !self.is_assignment()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quoting applied to the right operand of a textual pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quote {
    /// Bare word
    #[default]
    None,
    /// `"..."` - escapes processed
    Double,
    /// `'...'`
    Single,
    /// `` `...` `` - expansion source, kept as text on the pair
    Backtick,
}

impl Quote {
    pub fn delimiter(self) -> Option<char> {
        match self {
            Quote::None => None,
            Quote::Double => Some('"'),
            Quote::Single => Some('\''),
            Quote::Backtick => Some('`'),
        }
    }

    pub fn from_delimiter(c: char) -> Option<Self> {
        match c {
            '"' => Some(Quote::Double),
            '\'' => Some(Quote::Single),
            '`' => Some(Quote::Backtick),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prefers_longest() {
        assert_eq!(Operator::scan("== 5"), Some((Operator::CmpEq, 2)));
        assert_eq!(Operator::scan("=5"), Some((Operator::Eq, 1)));
        assert_eq!(Operator::scan("<=x"), Some((Operator::Le, 2)));
        assert_eq!(Operator::scan("!* ANY"), Some((Operator::CmpFalse, 2)));
        assert_eq!(Operator::scan("x"), None);
    }

    #[test]
    fn test_token_round_trip() {
        for (token, op) in Operator::TOKENS {
            assert_eq!(op.as_str(), token);
            assert_eq!(Operator::from_token(token), Some(op));
        }
    }

    #[test]
    fn test_classification() {
        assert!(Operator::Set.is_assignment());
        assert!(Operator::RegEq.is_comparison());
        assert_eq!(Operator::default(), Operator::Eq);
    }
}
