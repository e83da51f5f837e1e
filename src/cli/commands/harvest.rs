use crate::cli::render::OutputFormat;
use crate::otp::record::DEFAULT_SECRET_FIELD;
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};

pub const ARG_PREFIX: &str = "prefix";
pub const ARG_SECRET_FIELD: &str = "secret-field";
pub const ARG_NEXT: &str = "next";
pub const ARG_FORMAT: &str = "format";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug, Clone)]
pub struct Options {
    pub prefix: String,
    pub secret_field: String,
    pub next: bool,
    pub format: OutputFormat,
    pub timeout: Option<u64>,
}

impl Options {
    /// Parse harvest arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the prefix is missing or the output format is unknown.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let prefix = matches
            .get_one::<String>(ARG_PREFIX)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_PREFIX}"))?;

        let format: OutputFormat = matches
            .get_one::<String>(ARG_FORMAT)
            .map_or(Ok(OutputFormat::Text), |v| v.parse())?;

        Ok(Self {
            prefix,
            secret_field: matches
                .get_one::<String>(ARG_SECRET_FIELD)
                .cloned()
                .unwrap_or_else(|| DEFAULT_SECRET_FIELD.to_string()),
            next: matches.get_flag(ARG_NEXT),
            format,
            timeout: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PREFIX)
                .short('p')
                .long(ARG_PREFIX)
                .help("Key prefix to search for OTP secrets, example: secret/otp")
                .env("VAULT_OTP_PREFIX")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SECRET_FIELD)
                .long(ARG_SECRET_FIELD)
                .help("Name of the field holding the base32 secret")
                .env("VAULT_OTP_SECRET_FIELD")
                .default_value(DEFAULT_SECRET_FIELD),
        )
        .arg(
            Arg::new(ARG_NEXT)
                .short('n')
                .long(ARG_NEXT)
                .help("Show the code of the next period instead of the current one")
                .env("VAULT_OTP_NEXT")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_FORMAT)
                .short('f')
                .long(ARG_FORMAT)
                .help("Output format")
                .env("VAULT_OTP_FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .short('t')
                .long(ARG_TIMEOUT)
                .help("Give up when the whole run takes longer than this many seconds")
                .env("VAULT_OTP_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
