//! The command line and the configuration built from it
use clap::{App, Arg, ArgMatches};

use crate::columns::ColumnSelection;
use crate::dialect::{
    parse_comment, parse_delimiter, parse_encoding, FieldsPerRecord, InputDialect,
    LineTerminator, OutputDialect,
};
use crate::error::ConfigError;

const BOOLS: &[&str] = &["true", "false"];

/// A switch that is false when absent, true when given alone and can be set
/// explicitly with `--flag=true` or `--flag=false`.
fn switch<'a, 'b>(name: &'a str) -> Arg<'a, 'b> {
    Arg::with_name(name)
        .long(name)
        .value_name("BOOL")
        .takes_value(true)
        .min_values(0)
        .max_values(1)
        .require_equals(true)
        .possible_values(BOOLS)
}

fn switch_value(matches: &ArgMatches, name: &str, default: bool) -> bool {
    if !matches.is_present(name) {
        return default;
    }

    matches.value_of(name).map_or(true, |v| v == "true")
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("csv-knife")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Keeps or drops columns of a CSV stream read from stdin and written to stdout")
        .arg(
            Arg::with_name("inclusion-columns")
                .short("k")
                .long("inclusion-columns")
                .value_name("COLUMNS")
                .help("remove all but the given comma separated columns")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("exclusion-columns")
                .short("d")
                .long("exclusion-columns")
                .value_name("COLUMNS")
                .help("keep all but the given comma separated columns")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input-delimiter")
                .long("input-delimiter")
                .value_name("CHAR")
                .help("field delimiter for the input stream")
                .default_value(","),
        )
        .arg(
            Arg::with_name("input-comment")
                .long("input-comment")
                .value_name("CHAR")
                .help("comment character for the input stream, empty to disable")
                .empty_values(true)
                .default_value("\""),
        )
        .arg(
            Arg::with_name("input-fields-per-record")
                .long("input-fields-per-record")
                .value_name("N")
                .help("number of fields per record (0 = all equal to the first row, -1 = no check)")
                .allow_hyphen_values(true)
                .default_value("0"),
        )
        .arg(switch("input-lazy-quotes").help("allow quotes not to be closed"))
        .arg(
            switch("input-trim-leading-space")
                .help("trim leading spaces in fields [default: true]"),
        )
        .arg(
            Arg::with_name("input-encoding")
                .long("input-encoding")
                .value_name("LABEL")
                .help("text encoding of the input stream")
                .default_value("utf-8"),
        )
        .arg(
            Arg::with_name("output-delimiter")
                .long("output-delimiter")
                .value_name("CHAR")
                .help("field delimiter for the output stream")
                .default_value(","),
        )
        .arg(switch("output-crlf").help("use CRLF as a new line character in the output stream"))
}

/// Everything the pipeline needs, resolved once before it starts.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub selection: ColumnSelection,
    pub input: InputDialect,
    pub output: OutputDialect,
}

impl Config {
    pub fn new(
        selection: ColumnSelection,
        input: InputDialect,
        output: OutputDialect,
    ) -> Result<Config, ConfigError> {
        input.validate()?;
        output.validate()?;

        Ok(Config {
            selection,
            input,
            output,
        })
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Config, ConfigError> {
        let selection = ColumnSelection::from_lists(
            matches.value_of("inclusion-columns"),
            matches.value_of("exclusion-columns"),
        )?;

        let fields = matches.value_of("input-fields-per-record").unwrap_or("0");
        let fields_per_record = fields
            .trim()
            .parse::<i64>()
            .map(FieldsPerRecord::from)
            .map_err(|_| ConfigError::InvalidFieldsPerRecord(fields.to_string()))?;

        let input = InputDialect {
            delimiter: parse_delimiter(matches.value_of("input-delimiter").unwrap_or(","))?,
            comment: parse_comment(matches.value_of("input-comment").unwrap_or("\""))?,
            fields_per_record,
            lazy_quotes: switch_value(matches, "input-lazy-quotes", false),
            trim_leading_space: switch_value(matches, "input-trim-leading-space", true),
            encoding: parse_encoding(matches.value_of("input-encoding").unwrap_or("utf-8"))?,
        };

        let output = OutputDialect {
            delimiter: parse_delimiter(matches.value_of("output-delimiter").unwrap_or(","))?,
            line_terminator: if switch_value(matches, "output-crlf", false) {
                LineTerminator::CrLf
            } else {
                LineTerminator::Newline
            },
        };

        Config::new(selection, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::{app, Config};
    use crate::columns::ColumnSelection;
    use crate::dialect::{FieldsPerRecord, LineTerminator};
    use crate::error::ConfigError;

    fn config(args: &[&str]) -> Result<Config, ConfigError> {
        let mut argv = vec!["csv-knife"];
        argv.extend_from_slice(args);

        Config::from_matches(&app().get_matches_from_safe(argv).unwrap())
    }

    #[test]
    fn test_defaults() {
        let c = config(&["-k", "0"]).unwrap();

        assert_eq!(c.selection, ColumnSelection::include(vec![0]));
        assert_eq!(c.input.delimiter, b',');
        assert_eq!(c.input.comment, Some(b'"'));
        assert_eq!(c.input.fields_per_record, FieldsPerRecord::FirstRecord);
        assert!(!c.input.lazy_quotes);
        assert!(c.input.trim_leading_space);
        assert_eq!(c.input.encoding.name(), "utf-8");
        assert_eq!(c.output.delimiter, b',');
        assert_eq!(c.output.line_terminator, LineTerminator::Newline);
    }

    #[test]
    fn test_everything() {
        let c = config(&[
            "--exclusion-columns",
            "1, 3",
            "--input-delimiter",
            ";",
            "--input-comment",
            "#",
            "--input-fields-per-record",
            "-1",
            "--input-lazy-quotes",
            "--input-trim-leading-space=false",
            "--input-encoding",
            "latin1",
            "--output-delimiter",
            "\t",
            "--output-crlf=true",
        ])
        .unwrap();

        assert_eq!(c.selection, ColumnSelection::exclude(vec![1, 3]));
        assert_eq!(c.input.delimiter, b';');
        assert_eq!(c.input.comment, Some(b'#'));
        assert_eq!(c.input.fields_per_record, FieldsPerRecord::Unchecked);
        assert!(c.input.lazy_quotes);
        assert!(!c.input.trim_leading_space);
        assert_eq!(c.input.encoding.name(), "windows-1252");
        assert_eq!(c.output.delimiter, b'\t');
        assert_eq!(c.output.line_terminator, LineTerminator::CrLf);
    }

    #[test]
    fn test_exact_fields_and_no_comment() {
        let c = config(&["-k", "0", "--input-fields-per-record", "4", "--input-comment", ""]).unwrap();

        assert_eq!(c.input.fields_per_record, FieldsPerRecord::Exactly(4));
        assert_eq!(c.input.comment, None);
    }

    #[test]
    fn test_both_lists() {
        assert_eq!(
            config(&["-k", "0,2", "-d", "1"]).err(),
            Some(ConfigError::BothColumnLists)
        );
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            config(&["-k", "0,two"]).err(),
            Some(ConfigError::InvalidColumn("two".to_string()))
        );
        assert_eq!(
            config(&["-k", "0", "--input-fields-per-record", "many"]).err(),
            Some(ConfigError::InvalidFieldsPerRecord("many".to_string()))
        );
        assert_eq!(
            config(&["-k", "0", "--output-delimiter", "ab"]).err(),
            Some(ConfigError::InvalidDelimiter("ab".to_string()))
        );
        assert_eq!(
            config(&["-k", "0", "--input-delimiter", "#", "--input-comment", "#"]).err(),
            Some(ConfigError::CommentIsDelimiter('#'))
        );
    }

    #[test]
    fn test_switch_values_are_checked() {
        let argv = vec!["csv-knife", "--output-crlf=maybe"];

        assert!(app().get_matches_from_safe(argv).is_err());
    }
}
