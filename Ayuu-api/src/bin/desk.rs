use std::io::{self, BufRead, Write};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use dotenv::dotenv;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ayuu_api::client::DeskClient;
use ayuu_api::config::DeskConfig;
use ayuu_domain::entities::Role;
use ayuu_domain::session::FileSessionStore;

const USAGE: &str = "usage: ayuu_desk <login USERNAME ROLE | whoami | logout | queue [YYYY-MM-DD]>";

/// Front-desk terminal for a running Ayuu API.
///
/// `login` reads the password from `AYUU_PASSWORD` or stdin and keeps the
/// session in `SESSION_FILE` for the other commands.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = DeskConfig::from_env();
    let client = DeskClient::new(config.api_url, FileSessionStore::new(config.session_file));
    client.resume().context("cannot read the stored session")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["login", username, role] => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let password = read_password()?;
            let user = client.sign_in(username, &password, role).await?;
            println!("Signed in as {} ({})", user.full_name, user.role);
        }
        ["whoami"] => match client.current_user() {
            Some(user) => println!("{} ({}, {})", user.full_name, user.username, user.role),
            None => println!("Not signed in"),
        },
        ["logout"] => {
            client.sign_out()?;
            println!("Signed out");
        }
        ["queue", rest @ ..] if rest.len() <= 1 => {
            let date = rest
                .first()
                .map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d"))
                .transpose()
                .context("date must be YYYY-MM-DD")?;
            let queue = client.live_queue(date).await?;

            let summary = &queue.summary;
            println!(
                "{}: {} booked, {} scheduled, {} vitals done, {} with doctor, {} completed",
                queue.date, summary.total, summary.scheduled, summary.vitals_done, summary.with_doctor, summary.completed
            );
            for entry in &queue.entries {
                println!(
                    "#{:<3} {:<24} {:<12} {}",
                    entry.appointment.token(),
                    entry.appointment.patient_name,
                    entry.appointment.status.as_str(),
                    entry.estimated_wait
                );
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = std::env::var("AYUU_PASSWORD") {
        return Ok(password);
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
