use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notifier")]
#[command(about = "Render templated e-mail and PDF reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render an e-mail template and deliver it over SMTP
    Mail {
        /// Template under `emails/`, without extension
        #[arg(short, long)]
        template: String,

        /// Layout under `layouts/emails/`
        #[arg(short, long, default_value = "default")]
        layout: String,

        #[arg(short, long)]
        subject: String,

        /// Recipient address, repeatable
        #[arg(long, required = true)]
        to: Vec<String>,

        /// Template variable as key=value; JSON values are parsed
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, Value)>,

        /// File to attach, repeatable
        #[arg(long)]
        attach: Vec<PathBuf>,
    },

    /// Render a report template into a PDF file
    Pdf {
        /// Template under `pdf/`, without extension
        #[arg(short, long)]
        template: String,

        /// Layout under `layouts/pdf/`
        #[arg(short, long, default_value = "report")]
        layout: String,

        #[arg(long)]
        title: String,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, Value)>,
    },
}

/// Parse `key=value`. The value is read as JSON when it parses, as a plain string otherwise.
pub fn parse_var(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_var_string() {
        assert_eq!(
            parse_var("name=Ada Lovelace").unwrap(),
            ("name".to_string(), json!("Ada Lovelace"))
        );
    }

    #[test]
    fn test_parse_var_json() {
        assert_eq!(parse_var("total=42").unwrap().1, json!(42));
        assert_eq!(parse_var("items=[\"a\",\"b\"]").unwrap().1, json!(["a", "b"]));
    }

    #[test]
    fn test_parse_var_keeps_later_equals() {
        assert_eq!(parse_var("query=a=b").unwrap().1, json!("a=b"));
    }

    #[test]
    fn test_parse_var_rejects_malformed() {
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=value").is_err());
    }

    #[test]
    fn test_cli_parses_mail() {
        let cli = Cli::try_parse_from([
            "notifier",
            "mail",
            "--template",
            "welcome",
            "--subject",
            "Hi",
            "--to",
            "a@example.com",
            "--to",
            "b@example.com",
            "--var",
            "name=Ada",
        ])
        .unwrap();

        match cli.command {
            Commands::Mail {
                layout, to, vars, ..
            } => {
                assert_eq!(layout, "default");
                assert_eq!(to, vec!["a@example.com", "b@example.com"]);
                assert_eq!(vars, vec![("name".to_string(), json!("Ada"))]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_recipient() {
        let result =
            Cli::try_parse_from(["notifier", "mail", "--template", "welcome", "--subject", "Hi"]);
        assert!(result.is_err());
    }
}
