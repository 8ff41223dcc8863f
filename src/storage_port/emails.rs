use std::fmt;
use std::str::FromStr;

use super::*;

/// Separator of a bulk email recipient list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Newline,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => ", ",
            Delimiter::Semicolon => "; ",
            Delimiter::Newline => "\n",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Newline => "newline",
        }
    }
}

impl FromStr for Delimiter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "newline" | "line" | "\\n" => Ok(Delimiter::Newline),
            _ => Err(AppError::Validation(format!(
                "Unknown delimiter '{}', expected comma, semicolon or newline",
                s
            ))),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Addresses in `text`, split on any of `,` `;` or a line break.
pub fn extract_emails(text: &str) -> Vec<&str> {
    text.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .collect()
}

pub fn format_emails<S: AsRef<str>>(emails: &[S], delimiter: Delimiter) -> String {
    emails
        .iter()
        .map(|email| email.as_ref().trim())
        .filter(|email| !email.is_empty())
        .collect::<Vec<_>>()
        .join(delimiter.as_str())
}

/// Re-joins an existing list with another delimiter.
pub fn reformat_emails(text: &str, delimiter: Delimiter) -> String {
    format_emails(&extract_emails(text), delimiter)
}

pub fn count_emails(text: &str) -> usize {
    extract_emails(text).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_delimiters_is_lossless() {
        let text = "a@x.com, b@y.com";

        let semicolons = reformat_emails(text, Delimiter::Semicolon);
        assert_eq!(semicolons, "a@x.com; b@y.com");
        assert_eq!(reformat_emails(&semicolons, Delimiter::Comma), text);
        assert_eq!(reformat_emails(text, Delimiter::Comma), text);
    }

    #[test]
    fn newline_lists_and_stray_separators() {
        let text = " a@x.com;;\n\nb@y.com ,\r\n c@z.org ";

        assert_eq!(
            reformat_emails(text, Delimiter::Newline),
            "a@x.com\nb@y.com\nc@z.org"
        );
        assert_eq!(count_emails(text), 3);
        assert_eq!(count_emails(""), 0);
    }

    #[test]
    fn parses_delimiter_names() -> Result<(), AppError> {
        assert_eq!("Semicolon".parse::<Delimiter>()?, Delimiter::Semicolon);
        assert_eq!(";".parse::<Delimiter>()?, Delimiter::Semicolon);
        assert_eq!("newline".parse::<Delimiter>()?.as_str(), "\n");
        assert!("pipe".parse::<Delimiter>().is_err());
        Ok(())
    }
}
