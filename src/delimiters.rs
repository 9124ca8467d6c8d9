//! [`Delimiters`] — the marker pair that introduces an expected prompt on a
//! script line, e.g. `<Enter name: >Matt`.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Open/close markers recognised at the start of a script line.
///
/// Both markers are non-empty and differ from each other. The default pair is
/// `<` and `>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    open: String,
    close: String,
}

impl Delimiters {
    /// Build a delimiter pair, rejecting empty or identical markers.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, Error> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() || close.is_empty() {
            return Err(Error::config("delimiters must not be empty"));
        }
        if open == close {
            return Err(Error::config(format!(
                "open and close delimiters must differ, both are '{open}'"
            )));
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "<".to_string(),
            close: ">".to_string(),
        }
    }
}

/// Accepts either exactly two characters (`"[]"`) or two whitespace-separated
/// markers (`"{{ }}"`).
impl FromStr for Delimiters {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [open, close] => Self::new(*open, *close),
            [pair] => {
                let mut chars = pair.chars();
                match (chars.next(), chars.next(), chars.next()) {
                    (Some(open), Some(close), None) => {
                        Self::new(open.to_string(), close.to_string())
                    }
                    _ => Err(Error::config(format!(
                        "expected two characters or two space-separated markers, got '{s}'"
                    ))),
                }
            }
            _ => Err(Error::config(format!(
                "expected two characters or two space-separated markers, got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pair() {
        let d = Delimiters::default();
        assert_eq!(d.open(), "<");
        assert_eq!(d.close(), ">");
    }

    #[test]
    fn test_rejects_empty_and_equal() {
        assert!(Delimiters::new("", ">").is_err());
        assert!(Delimiters::new("<", "").is_err());
        assert!(matches!(Delimiters::new("|", "|"), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_two_chars() {
        let d: Delimiters = "[]".parse().unwrap();
        assert_eq!(d.open(), "[");
        assert_eq!(d.close(), "]");
    }

    #[test]
    fn test_parse_space_separated() {
        let d: Delimiters = "{{ }}".parse().unwrap();
        assert_eq!(d.open(), "{{");
        assert_eq!(d.close(), "}}");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("<".parse::<Delimiters>().is_err());
        assert!("abc".parse::<Delimiters>().is_err());
        assert!("a b c".parse::<Delimiters>().is_err());
        assert!("||".parse::<Delimiters>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let d = Delimiters::new("{{", "}}").unwrap();
        assert_eq!(d.to_string().parse::<Delimiters>().unwrap(), d);
    }
}
