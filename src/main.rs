use anyhow::{Context, Result};
use audience_classifier::{
    allowed_focuses, default_focus, AppConfig, ClassificationResult, Classifier, GenerativeModel,
    MockModel, OrgFocus, OrgType, Status, Whitelist,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "audience-classifier", version, about = "Classify visiting organizations by type and focus")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, default_value = audience_classifier::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Never call the generative model; unknown names get the fallback result
    #[arg(long, global = true)]
    offline: bool,

    /// Machine-readable JSON output instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one or more organization names
    Classify {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Classify every `name` in a CSV file and write the results as CSV
    Batch { input: PathBuf, output: PathBuf },
    /// List the curated whitelist
    Whitelist,
    /// Print the legal type × focus combinations
    Matrix,
}

#[derive(Debug, Deserialize)]
struct BatchInput {
    name: String,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    input: String,
    name: String,
    #[serde(rename = "type")]
    org_type: String,
    focus: String,
    confidence: f64,
    status: String,
    source: String,
    corrected: bool,
    ceo: String,
    thesis: String,
}

impl BatchOutput {
    fn new(input: String, result: ClassificationResult) -> Self {
        BatchOutput {
            input,
            name: result.name,
            org_type: result.org_type.map(|t| t.to_string()).unwrap_or_default(),
            focus: result.focus.map(|f| f.to_string()).unwrap_or_default(),
            confidence: result.confidence,
            status: result.status.as_str().to_string(),
            source: result.source.map(|s| s.as_str().to_string()).unwrap_or_default(),
            corrected: result.corrected,
            ceo: result.ceo.unwrap_or_default(),
            thesis: result.thesis,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    audience_classifier::init_tracing(if cli.verbose { "debug" } else { "warn" })?;

    let _ = dotenvy::dotenv();
    let config = AppConfig::load_from(&cli.config).context("Failed to load configuration")?;

    match cli.command {
        Command::Classify { names } => {
            let classifier = build_classifier(&config, cli.offline)?;
            for name in names {
                let result = classifier.classify(&name).await;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    println!("{}", summary_line(&name, &result));
                }
            }
        }
        Command::Batch { input, output } => {
            let classifier = build_classifier(&config, cli.offline)?;
            let count = run_batch(&classifier, &input, &output).await?;
            println!("✓ Classified {} organizations → {:?}", count, output);
        }
        Command::Whitelist => {
            let whitelist = config.build_whitelist()?;
            print!("{}", render_whitelist(&whitelist, cli.json)?);
        }
        Command::Matrix => print!("{}", render_matrix(cli.json)?),
    }

    Ok(())
}

fn build_classifier(config: &AppConfig, offline: bool) -> Result<Classifier> {
    let model: Arc<dyn GenerativeModel> = if offline {
        Arc::new(MockModel::failing())
    } else {
        Arc::new(config.build_model()?)
    };

    Ok(Classifier::new(config.build_whitelist()?, config.build_cache()?, model))
}

async fn run_batch(classifier: &Classifier, input: &Path, output: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open input CSV: {:?}", input))?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create output CSV: {:?}", output))?;

    let mut count = 0;
    for row in reader.deserialize::<BatchInput>() {
        let row = row.context("Failed to read input row")?;
        let result = classifier.classify(&row.name).await;
        writer.serialize(BatchOutput::new(row.name, result))?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// One line per classified name, e.g.
/// `✓ a16z → Andreessen Horowitz: VC × DEEP_TECH (OK, 1.00, whitelist)`
fn summary_line(input: &str, result: &ClassificationResult) -> String {
    let marker = match result.status {
        Status::Ok => "✓",
        Status::Uncertain => "?",
        Status::Rejected => "✗",
    };

    match (result.org_type, result.focus) {
        (Some(org_type), Some(focus)) => {
            let mut line = format!(
                "{} {} → {}: {} × {} ({}, {:.2}, {})",
                marker,
                input,
                result.name,
                org_type.as_str(),
                focus.as_str(),
                result.status.as_str(),
                result.confidence,
                result.source.map(|s| s.as_str()).unwrap_or("none"),
            );
            if let Some(message) = &result.message {
                line.push_str(&format!(" - {}", message));
            }
            line
        }
        _ => format!(
            "{} {} → {}: {}",
            marker,
            input,
            result.status.as_str(),
            result.message.as_deref().unwrap_or("")
        ),
    }
}

#[derive(Serialize)]
struct WhitelistRow<'a> {
    alias: &'a str,
    #[serde(flatten)]
    entry: &'a audience_classifier::WhitelistEntry,
}

fn render_whitelist(whitelist: &Whitelist, json: bool) -> Result<String> {
    let entries = whitelist.entries();

    if json {
        let rows: Vec<WhitelistRow> = entries
            .into_iter()
            .map(|(alias, entry)| WhitelistRow { alias, entry })
            .collect();
        return Ok(serde_json::to_string_pretty(&rows)? + "\n");
    }

    let mut out = format!(
        "{:<32} {:<30} {:<14} {:<15} {}\n",
        "ALIAS", "NAME", "TYPE", "FOCUS", "CEO"
    );
    for (alias, entry) in entries {
        out.push_str(&format!(
            "{:<32} {:<30} {:<14} {:<15} {}\n",
            alias,
            entry.name,
            entry.org_type.as_str(),
            entry.focus.as_str(),
            entry.ceo
        ));
    }
    out.push_str(&format!("\n{} aliases\n", whitelist.len()));

    Ok(out)
}

#[derive(Serialize)]
struct MatrixRow {
    default: OrgFocus,
    legal: Vec<OrgFocus>,
}

fn render_matrix(json: bool) -> Result<String> {
    if json {
        let matrix: BTreeMap<&str, MatrixRow> = OrgType::ALL
            .into_iter()
            .map(|t| {
                let row = MatrixRow {
                    default: default_focus(t),
                    legal: allowed_focuses(t).to_vec(),
                };
                (t.as_str(), row)
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&matrix)? + "\n");
    }

    let mut out = format!("{:<14} {:<15} {}\n", "TYPE", "DEFAULT", "LEGAL FOCUS");
    for t in OrgType::ALL {
        let legal: Vec<&str> = allowed_focuses(t).iter().map(|f| f.as_str()).collect();
        out.push_str(&format!(
            "{:<14} {:<15} {}\n",
            t.as_str(),
            default_focus(t).as_str(),
            legal.join(", ")
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_classifier::MemoryCache;
    use std::io::Write;

    #[test]
    fn test_json_flag_is_global() {
        let cli = Cli::try_parse_from(["audience-classifier", "--json", "matrix"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Matrix));

        let cli = Cli::try_parse_from(["audience-classifier", "classify", "a16z", "--json"]).unwrap();
        assert!(cli.json);

        let cli = Cli::try_parse_from(["audience-classifier", "whitelist"]).unwrap();
        assert!(!cli.json);
    }

    #[test]
    fn test_matrix_json() {
        let value: serde_json::Value = serde_json::from_str(&render_matrix(true).unwrap()).unwrap();

        assert_eq!(value.as_object().unwrap().len(), OrgType::ALL.len());
        assert_eq!(value["BANK"]["default"], "INDUSTRIAL");
        assert_eq!(value["BANK"]["legal"], serde_json::json!(["INDUSTRIAL"]));
        assert!(value["VC"]["legal"].as_array().unwrap().len() == OrgFocus::ALL.len());
    }

    #[test]
    fn test_whitelist_json() {
        let whitelist = Whitelist::with_defaults();
        let value: serde_json::Value =
            serde_json::from_str(&render_whitelist(&whitelist, true).unwrap()).unwrap();

        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), whitelist.len());
        let a16z = rows.iter().find(|row| row["alias"] == "a16z").unwrap();
        assert_eq!(a16z["name"], "Andreessen Horowitz");
        assert_eq!(a16z["type"], "VC");
        assert_eq!(a16z["focus"], "DEEP_TECH");

        let table = render_whitelist(&whitelist, false).unwrap();
        assert!(table.starts_with("ALIAS"));
        assert!(table.ends_with(&format!("{} aliases\n", whitelist.len())));
    }

    #[tokio::test]
    async fn test_summary_line() {
        let classifier = Classifier::new(
            Whitelist::with_defaults(),
            Arc::new(MemoryCache::new()),
            Arc::new(MockModel::failing()),
        );

        let hit = classifier.classify("a16z").await;
        assert_eq!(
            summary_line("a16z", &hit),
            "✓ a16z → Andreessen Horowitz: VC × DEEP_TECH (OK, 1.00, whitelist)"
        );

        let rejected = classifier.classify("x").await;
        assert_eq!(
            summary_line("x", &rejected),
            "✗ x → REJECTED: Please enter a valid organization name."
        );
    }

    #[tokio::test]
    async fn test_batch_writes_one_row_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");

        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, "name\na16z\nUnknown Holdings\nx").unwrap();
        drop(file);

        let classifier = Classifier::new(
            Whitelist::with_defaults(),
            Arc::new(MemoryCache::new()),
            Arc::new(MockModel::failing()),
        );

        let count = run_batch(&classifier, &input, &output).await.unwrap();
        assert_eq!(count, 3);

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("input,name,type,focus,confidence,status,source"));
        assert!(lines[1].starts_with("a16z,Andreessen Horowitz,VC,DEEP_TECH,1.0,OK,whitelist"));
        assert!(lines[2].contains("UNCERTAIN,generative"));
        assert!(lines[3].starts_with("x,,,,0.0,REJECTED,,"));
    }
}
