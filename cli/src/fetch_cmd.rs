use std::io::Write;

use anyhow::Context;
use anyhow::bail;
use clap::Args;
use nudge_backend_client::BackendClient;
use nudge_core::HttpReminderFetcher;
use nudge_core::ReminderFetcher;
use nudge_core::config::NudgeConfig;
use nudge_core::presentation::BadgeView;
use nudge_protocol::ReminderDomain;
use owo_colors::OwoColorize;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Reminder domain: rnr, hrd or dataflow.
    #[arg(value_parser = crate::parse_domain)]
    pub domain: ReminderDomain,

    /// Print the badge view as JSON.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

pub(crate) async fn run(config: &NudgeConfig, args: FetchArgs) -> anyhow::Result<()> {
    let profile = config.profile(args.domain);
    let Some(session) = config.session.to_session() else {
        bail!("no session configured: set session.token or NUDGE_SESSION__TOKEN");
    };
    if !session.grants(profile.role_marker) {
        bail!(
            "session roles {:?} do not grant access to {} reminders",
            session.roles,
            profile.domain
        );
    }

    let client = BackendClient::new(config.server.base_url.clone())
        .context("failed to build HTTP client")?;
    let reminders = HttpReminderFetcher::new(client)
        .fetch(&profile, &session)
        .await
        .with_context(|| format!("failed to fetch {} reminders", profile.domain))?;

    let view = config.badge().render([(&profile, reminders.as_slice())]);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &view)?;
        writeln!(stdout)?;
    } else {
        print_view(&mut stdout, args.domain, &view)?;
    }
    Ok(())
}

fn print_view(
    out: &mut impl Write,
    domain: ReminderDomain,
    view: &BadgeView,
) -> std::io::Result<()> {
    if view.items.is_empty() {
        return writeln!(out, "No active {domain} reminders.");
    }
    writeln!(
        out,
        "{} active {domain} reminder(s), showing {}:",
        view.total,
        view.items.len()
    )?;
    for item in &view.items {
        let sent = item
            .sent_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {} {}  {}",
            item.id.as_str().bold(),
            item.title.yellow(),
            sent.dimmed()
        )?;
        writeln!(out, "      {}", item.body)?;
        writeln!(out, "      {}", item.path.cyan())?;
    }
    Ok(())
}
