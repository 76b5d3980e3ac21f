//! Plaintext mail through the local `sendmail`.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

pub const FAILURE_SUBJECT: &str = "Flight alert FAILED";

/// `Flight alert for Mon 2026-12-21 07:30 AM`
pub fn subject_for<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("Flight alert for {}", at.format("%a %Y-%m-%d %I:%M %p"))
}

/// `<user>@<hostname>` of the machine running the scrape
pub fn default_sender() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "flightscout".to_string());
    let host = std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}@{}", user, host)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Mail {
    /// `to` is a comma-separated recipient list
    pub fn new(from: &str, to: &str, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.to_string(),
            to: to
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// RFC 822 message as handed to `sendmail -t`
    pub fn to_message(&self) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\nMIME-Version: 1.0\nContent-Type: text/plain; charset=utf-8\n\n{}",
            self.from,
            self.to.join(", "),
            self.subject,
            self.body
        )
    }

    pub fn send(&self) -> Result<()> {
        if self.to.is_empty() {
            bail!("No mail recipients given");
        }

        let sendmail = find_sendmail()?;
        tracing::debug!("Sending mail via {}", sendmail.display());

        let mut child = Command::new(&sendmail)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to run {}", sendmail.display()))?;

        child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("sendmail stdin unavailable"))?
            .write_all(self.to_message().as_bytes())?;

        let status = child.wait()?;
        if !status.success() {
            bail!("sendmail exited with {}", status);
        }

        tracing::info!("Mailed \"{}\" to {}", self.subject, self.to.join(", "));
        Ok(())
    }
}

fn find_sendmail() -> Result<PathBuf> {
    if let Ok(path) = which::which("sendmail") {
        return Ok(path);
    }
    ["/usr/sbin/sendmail", "/usr/lib/sendmail"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("sendmail not found. Install an MTA or omit --mailto."))
}
