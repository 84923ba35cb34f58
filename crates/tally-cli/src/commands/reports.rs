//! One-shot monthly report generation

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use tally_core::mailer::Mailer;
use tally_core::report::previous_month_report;
use tally_server::run_monthly_reports;

use super::core::open_db;

pub fn cmd_report(
    db_path: &Path,
    email: Option<&str>,
    out: Option<&Path>,
    send: bool,
) -> Result<()> {
    let db = open_db(db_path)?;
    let now = Utc::now();

    let Some(email) = email else {
        if out.is_some() {
            bail!("--out requires --email (one report per file)");
        }
        // Whole-user-base run, same path the scheduler takes
        let mailer = if send { Mailer::from_env() } else { None };
        if send && mailer.is_none() {
            bail!("--send requires SMTP configuration (TALLY_SMTP_HOST/USER/PASS)");
        }
        let count = run_monthly_reports(&db, mailer.as_ref(), now)?;
        println!("Generated {} report(s)", count);
        return Ok(());
    };

    let user = db
        .get_user_by_email(email)?
        .with_context(|| format!("No user with email {}", email))?;

    let Some((month, year, pdf)) = previous_month_report(&db, &user, now)? else {
        println!("No activity for {} last month; nothing to report", email);
        return Ok(());
    };

    if send {
        let mailer = Mailer::from_env()
            .context("--send requires SMTP configuration (TALLY_SMTP_HOST/USER/PASS)")?;
        mailer.send_monthly_report(&user.email, &month, year, pdf)?;
        println!("Report for {} {} emailed to {}", month, year, user.email);
        return Ok(());
    }

    let out_path: PathBuf = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("Financial_Report_{}_{}.pdf", month, year)));
    std::fs::write(&out_path, pdf)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!("Report for {} {} written to {}", month, year, out_path.display());

    Ok(())
}
