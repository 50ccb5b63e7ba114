use crate::error::Result;
use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};

/// Values accepted as "true" for boolean dialect arguments.
const TRUTH_VALUES: [&str; 6] = ["y", "yes", "true", "1", "1.0", "wahr"];

/// Whether `value` reads as a truth value (case-insensitive, trimmed).
pub fn is_true(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTH_VALUES.contains(&value.as_str())
}

/// Field quoting policy when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    #[default]
    Minimal,
    All,
    None,
    NonNumeric,
}

impl Quoting {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "all" => Some(Self::All),
            "none" => Some(Self::None),
            "nonnumeric" => Some(Self::NonNumeric),
            _ => None,
        }
    }
}

/// CSV reader/writer dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDialect {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    pub quoting: Quoting,
    /// Whether a quote inside a field is escaped by doubling it
    pub double_quote: bool,
    /// Record terminator for writing; `None` keeps the csv default
    pub line_terminator: Option<String>,
    pub skip_initial_space: bool,
    /// Reject rows whose length differs from the header
    pub strict: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        CsvDialect {
            delimiter: b',',
            quote: b'"',
            quoting: Quoting::Minimal,
            double_quote: true,
            line_terminator: None,
            skip_initial_space: false,
            strict: false,
        }
    }
}

impl CsvDialect {
    /// Dialect for tab-separated values
    #[must_use]
    pub fn tsv() -> Self {
        CsvDialect {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the write quoting policy
    #[must_use]
    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Build a dialect from `arg=value,arg2=value2` text.
    ///
    /// A `dialect` argument is applied first so the other arguments can
    /// override it. Unknown arguments and unusable values are ignored.
    pub fn from_args(args: &str) -> Result<Self> {
        let pairs = parse_csv_args(args)?;
        let mut dialect = CsvDialect::default();

        for (_, value) in pairs
            .iter()
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case("dialect"))
        {
            dialect.apply("dialect", value);
        }
        for (key, value) in &pairs {
            let key = key.trim().to_lowercase();
            if key != "dialect" {
                dialect.apply(&key, value);
            }
        }
        Ok(dialect)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "dialect" => match value.trim().to_lowercase().as_str() {
                "excel" => *self = CsvDialect::default(),
                "excel-tab" => *self = CsvDialect::tsv(),
                "unix" => {
                    *self = CsvDialect::default().with_quoting(Quoting::All);
                    self.line_terminator = Some("\n".to_string());
                }
                other => tracing::warn!("Ignoring unknown CSV dialect '{}'", other),
            },
            "delimiter" => match single_byte(value) {
                Some(b) => self.delimiter = b,
                None => tracing::warn!("Ignoring CSV delimiter '{}': expected one character", value),
            },
            "quotechar" => match single_byte(value) {
                Some(b) => self.quote = b,
                None => tracing::warn!("Ignoring CSV quotechar '{}': expected one character", value),
            },
            "quoting" => {
                if let Some(quoting) = Quoting::parse(value) {
                    self.quoting = quoting;
                }
            }
            "doublequote" => self.double_quote = is_true(value),
            "lineterminator" => {
                self.line_terminator =
                    Some(value.to_lowercase().replace("cr", "\r").replace("lf", "\n"));
            }
            "skipinitialspace" => self.skip_initial_space = is_true(value),
            "strict" => self.strict = is_true(value),
            other => tracing::debug!("Ignoring CSV argument '{}'", other),
        }
    }

    pub(crate) fn reader(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .quoting(self.quoting != Quoting::None)
            .flexible(!self.strict)
            .trim(if self.skip_initial_space {
                Trim::Fields
            } else {
                Trim::None
            });
        builder
    }

    pub(crate) fn writer(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .quote_style(match self.quoting {
                Quoting::Minimal => QuoteStyle::Necessary,
                Quoting::All => QuoteStyle::Always,
                Quoting::None => QuoteStyle::Never,
                Quoting::NonNumeric => QuoteStyle::NonNumeric,
            });
        match self.line_terminator.as_deref().map(str::as_bytes) {
            Some(b"\r\n") => {
                builder.terminator(Terminator::CRLF);
            }
            Some(&[b]) => {
                builder.terminator(Terminator::Any(b));
            }
            Some(other) => tracing::warn!(
                "Ignoring line terminator {:?}: expected CR, LF or CRLF",
                String::from_utf8_lossy(other)
            ),
            None => {}
        }
        builder
    }
}

fn single_byte(value: &str) -> Option<u8> {
    match value.as_bytes() {
        [b] => Some(*b),
        _ => None,
    }
}

/// Split `arg=value,arg2=value2` into pairs.
///
/// Fields may be double-quoted to carry commas. Fields without `=` are
/// skipped; only the first `=` separates key from value.
pub fn parse_csv_args(args: &str) -> Result<Vec<(String, String)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(args.as_bytes());

    let Some(record) = reader.records().next().transpose()? else {
        return Ok(Vec::new());
    };

    Ok(record
        .iter()
        .filter_map(|field| field.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_true() {
        for value in ["y", "YES", " true ", "1", "1.0", "Wahr"] {
            assert!(is_true(value), "{value}");
        }
        for value in ["n", "no", "0", "", "on"] {
            assert!(!is_true(value), "{value}");
        }
    }

    #[test]
    fn test_parse_csv_args() {
        let pairs = parse_csv_args("delimiter=;,quotechar=',novalue,\"delimiter=,\"").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("delimiter".to_string(), ";".to_string()),
                ("quotechar".to_string(), "'".to_string()),
                ("delimiter".to_string(), ",".to_string()),
            ]
        );
        assert!(parse_csv_args("").unwrap().is_empty());
    }

    #[test]
    fn test_from_args() {
        let dialect = CsvDialect::from_args(
            "Delimiter=;,quoting=ALL,doublequote=no,lineterminator=crlf,skipinitialspace=yes",
        )
        .unwrap();
        assert_eq!(dialect.delimiter, b';');
        assert_eq!(dialect.quoting, Quoting::All);
        assert!(!dialect.double_quote);
        assert_eq!(dialect.line_terminator.as_deref(), Some("\r\n"));
        assert!(dialect.skip_initial_space);
    }

    #[test]
    fn test_dialect_applied_before_overrides() {
        let dialect = CsvDialect::from_args("delimiter=|,dialect=excel-tab").unwrap();
        assert_eq!(dialect.delimiter, b'|');
    }

    #[test]
    fn test_unusable_values_ignored() {
        let dialect =
            CsvDialect::from_args("delimiter=;;,quoting=sometimes,encoding=latin-1").unwrap();
        assert_eq!(dialect, CsvDialect::default());
    }
}
