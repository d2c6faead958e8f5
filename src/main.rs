use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use notice_merge::config::Config;
use notice_merge::domain::{AgencyId, CaseId, ContactId};
use notice_merge::infra::in_memory::InMemoryStore;
use notice_merge::logging;
use notice_merge::merge::substitute::placeholders;
use notice_merge::{MergeContext, MergeResult, NoticeMergeUseCase, NoticeTemplate, UserProfile};

#[derive(Parser)]
#[command(name = "notice_merge")]
#[command(about = "Resolve merge codes for code-enforcement notice templates")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every merge code a template declares against a fixture store
    Resolve {
        /// JSON fixture backing the in-memory store
        #[arg(long)]
        fixture: PathBuf,
        /// JSON request: agencyId, caseId, template, context, actingUser
        #[arg(long)]
        request: PathBuf,
        /// Also print the template text with tokens substituted
        #[arg(long)]
        render: bool,
    },
    /// Check a template's declarations without touching any data
    ValidateTemplate {
        #[arg(long)]
        template: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoticeRequest {
    agency_id: AgencyId,
    case_id: CaseId,
    template: NoticeTemplate,
    context: MergeContext,
    acting_user: UserProfile,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Rendered body, header and footer, once per recipient when the template is
/// personalized.
fn rendered_preview(template: &NoticeTemplate, result: &MergeResult) -> serde_json::Value {
    let render = |recipient: Option<ContactId>| {
        serde_json::json!({
            "header": template.header_section.as_ref().map(|s| result.render(&s.content, recipient)),
            "content": result.render(&template.content, recipient),
            "footer": template.footer_section.as_ref().map(|s| result.render(&s.content, recipient)),
        })
    };

    match &result.recipients {
        Some(recipients) => {
            let per_recipient: serde_json::Map<String, serde_json::Value> = recipients
                .contact_ids()
                .into_iter()
                .map(|id| (id.to_string(), render(Some(id))))
                .collect();
            serde_json::Value::Object(per_recipient)
        }
        None => render(None),
    }
}

async fn resolve(fixture: &Path, request: &Path, render: bool, config: &Config) -> Result<()> {
    let store = InMemoryStore::from_json_file(fixture)?;
    let request: NoticeRequest = read_json(request)?;
    let use_case = NoticeMergeUseCase::new(Arc::new(store), config.dates.clone());

    let result = use_case
        .resolve(
            request.agency_id,
            request.case_id,
            &request.template,
            &request.context,
            &request.acting_user,
        )
        .await?;

    let mut output = serde_json::to_value(&result)?;
    if render {
        output["rendered"] = rendered_preview(&request.template, &result);
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn validate_template(path: &Path) -> Result<()> {
    let template: NoticeTemplate = read_json(path)?;
    template.validate()?;

    let categories: Vec<String> = template
        .referenced_categories()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut texts = vec![template.content.as_str()];
    texts.extend(template.header_section.iter().map(|s| s.content.as_str()));
    texts.extend(template.footer_section.iter().map(|s| s.content.as_str()));

    // Placeholders in the text that no category declares stay literal at render time
    let undeclared: Vec<String> = texts
        .into_iter()
        .flat_map(placeholders)
        .filter(|name| {
            !template
                .referenced_categories()
                .iter()
                .any(|c| template.declared_tokens(*c).iter().any(|t| t.name() == name.as_str()))
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "valid": true,
            "categories": categories,
            "undeclaredPlaceholders": undeclared,
        }))?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::load()?;
    logging::init_logging(&config.logging);

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Resolve {
            fixture,
            request,
            render,
        } => {
            info!("Resolving {} against fixture {}", request.display(), fixture.display());
            resolve(&fixture, &request, render, &config).await
        }
        Commands::ValidateTemplate { template } => validate_template(&template),
    };

    if let Err(e) = &outcome {
        error!("Command failed: {:#}", e);
    }
    outcome
}
