use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{ApiConfig, EventView, FormKind, HttpEventsApi, ViewController};
use shared::domain::FormPayload;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "events", about = "List, create and subscribe to community events")]
struct Args {
    #[arg(long, env = "EVENTS_API_BASE", default_value = "http://127.0.0.1:8080")]
    api_base: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current event list.
    List,
    /// Submit an event, then print the refreshed list.
    Create {
        /// Form field as `name=value`; repeat for each field.
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    Subscribe {
        #[arg(long)]
        email: String,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// List lines go to stdout, notifications to stderr.
struct TerminalView;

impl EventView for TerminalView {
    fn render_events(&self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn reset_form(&self, form: FormKind) {
        debug!(form = form.element_id(), "form reset");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let api = HttpEventsApi::new(ApiConfig::new(args.api_base));
    let controller = ViewController::new(api, TerminalView);

    match args.command {
        Command::List => {
            controller.load_events().await?;
        }
        Command::Create { fields } => {
            let payload: FormPayload = fields.into_iter().collect();
            let outcome = controller.create_event(&payload).await?;
            debug!(?outcome, "create finished");
        }
        Command::Subscribe { email, fields } => {
            let mut payload = FormPayload::new();
            payload.insert("email", email);
            for (name, value) in fields {
                payload.insert(name, value);
            }
            let outcome = controller.subscribe(&payload).await?;
            debug!(?outcome, "subscribe finished");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_value_fields() {
        assert_eq!(
            parse_field("location=Main Hall = B"),
            Ok(("location".to_string(), "Main Hall = B".to_string()))
        );
        assert_eq!(
            parse_field("description="),
            Ok(("description".to_string(), String::new()))
        );
        assert!(parse_field("title").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn create_collects_repeated_fields_in_order() {
        let args = Args::try_parse_from([
            "events",
            "--api-base",
            "http://localhost:9000",
            "create",
            "--field",
            "title=Launch",
            "--field",
            "date=2024-01-01",
        ])
        .expect("args");

        assert_eq!(args.api_base, "http://localhost:9000");
        match args.command {
            Command::Create { fields } => {
                let payload: FormPayload = fields.into_iter().collect();
                assert_eq!(payload.get("title"), Some("Launch"));
                assert_eq!(
                    payload.iter().map(|(name, _)| name).collect::<Vec<_>>(),
                    vec!["title", "date"]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn subscribe_requires_email() {
        assert!(Args::try_parse_from(["events", "subscribe"]).is_err());
    }
}
