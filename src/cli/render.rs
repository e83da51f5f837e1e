use crate::harvest::ResultSet;
use anyhow::{Result, anyhow};
use std::fmt::Write as _;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown output format: {other}")),
        }
    }
}

/// Seconds left before codes with the given period change.
#[must_use]
pub const fn seconds_remaining(period: u64, now: u64) -> u64 {
    if period == 0 {
        return 0;
    }
    period - now % period
}

/// Render a result set. `now` only feeds the text footer; `next` tells it
/// the codes belong to the following period.
///
/// # Errors
/// Returns an error if serialization or formatting fails.
pub fn render(results: &ResultSet, format: OutputFormat, now: u64, next: bool) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        OutputFormat::Text => text(results, now, next),
    }
}

fn text(results: &ResultSet, now: u64, next: bool) -> Result<String> {
    let width = results.longest_name();
    let mut out = String::new();

    for record in results {
        writeln!(out, "{:<width$}  {}", record.name, record.code)?;
    }

    if !results.is_empty() {
        let remaining = seconds_remaining(results.min_period(), now);
        if next {
            writeln!(out, "\nvalid in {remaining}s")?;
        } else {
            writeln!(out, "\n{remaining}s remaining")?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::aggregate::finalize;
    use crate::otp::Record;
    use serde_json::Value;

    fn record(key: &str, name: &str, period: u64, code: &str) -> Record {
        Record {
            key: key.to_string(),
            name: name.to_string(),
            icon: "key".to_string(),
            secret: None,
            digits: 6,
            period,
            code: code.to_string(),
        }
    }

    #[test]
    fn test_output_format_from_str() -> Result<()> {
        assert_eq!("text".parse::<OutputFormat>()?, OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>()?, OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
        Ok(())
    }

    #[test]
    fn test_seconds_remaining() {
        assert_eq!(seconds_remaining(30, 0), 30);
        assert_eq!(seconds_remaining(30, 29), 1);
        assert_eq!(seconds_remaining(30, 1_700_000_000), 10);
        assert_eq!(seconds_remaining(0, 5), 0);
    }

    #[test]
    fn test_text_aligns_names() -> Result<()> {
        let results = finalize(vec![
            record("otp/github", "GitHub", 30, "123456"),
            record("otp/aws", "aws", 60, "654321"),
        ]);

        let out = render(&results, OutputFormat::Text, 1_700_000_000, false)?;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "aws     654321");
        assert_eq!(lines[1], "GitHub  123456");
        assert_eq!(lines[3], "10s remaining");
        Ok(())
    }

    #[test]
    fn test_text_footer_for_next_codes() -> Result<()> {
        let results = finalize(vec![record("otp/github", "GitHub", 30, "123456")]);

        let out = render(&results, OutputFormat::Text, 1_700_000_000, true)?;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "GitHub  123456");
        assert_eq!(lines[2], "valid in 10s");
        assert!(!out.contains("remaining"));
        Ok(())
    }

    #[test]
    fn test_text_empty() -> Result<()> {
        let out = render(&ResultSet::default(), OutputFormat::Text, 0, true)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_json_omits_secret() -> Result<()> {
        let mut with_secret = record("otp/github", "GitHub", 30, "123456");
        with_secret.secret = Some("JBSWY3DPEHPK3PXP".to_string().into());
        let results = finalize(vec![with_secret]);

        let out = render(&results, OutputFormat::Json, 0, false)?;
        assert!(!out.contains("JBSWY3DPEHPK3PXP"));

        let value: Value = serde_json::from_str(&out)?;
        let first = &value[0];
        assert_eq!(first["key"], "otp/github");
        assert_eq!(first["name"], "GitHub");
        assert_eq!(first["code"], "123456");
        assert_eq!(first["period"], 30);
        assert!(first.get("secret").is_none());
        Ok(())
    }
}
