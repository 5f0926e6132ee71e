//! Report delivery.
//!
//! The transport set is closed and chosen by the `report:` settings block:
//!
//! ```text
//! transport: none   -> NoReport         log and drop
//! transport: mail   -> CommandLineMail  <command> -s <subject> [-a <file>] <to>
//! transport: smtp   -> SmtpMail         multipart message over SMTP (lettre)
//! ```

use std::io::Write;
use std::process::{Command, Stdio};

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport as _};

use gitsync_core::{ReportConfig, SmtpConfig};

use crate::error::{io_err, ReportError};
use crate::payload::ReportPayload;

/// SMTP parameters with the password already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpMail {
    pub to: String,
    pub from: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
    pub starttls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    NoReport,
    CommandLineMail { command: String, to: String },
    SmtpMail(SmtpMail),
}

impl Transport {
    /// Build from settings, reading `password_env` from the process environment.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        Self::from_config_with(config, |var| std::env::var(var).ok())
    }

    /// Build from settings with an explicit environment lookup.
    pub fn from_config_with(
        config: &ReportConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ReportError> {
        Ok(match config {
            ReportConfig::None => Transport::NoReport,
            ReportConfig::Mail { to, command } => Transport::CommandLineMail {
                command: command.clone(),
                to: to.clone(),
            },
            ReportConfig::Smtp(smtp) => Transport::SmtpMail(resolve_smtp(smtp, env)?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transport::NoReport => "none",
            Transport::CommandLineMail { .. } => "mail",
            Transport::SmtpMail(_) => "smtp",
        }
    }

    pub fn deliver(&self, payload: &ReportPayload) -> Result<(), ReportError> {
        match self {
            Transport::NoReport => {
                tracing::info!(subject = %payload.subject, "no report transport configured");
                Ok(())
            }
            Transport::CommandLineMail { command, to } => send_with_command(command, to, payload),
            Transport::SmtpMail(smtp) => send_with_smtp(smtp, payload),
        }
    }
}

fn resolve_smtp(
    smtp: &SmtpConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SmtpMail, ReportError> {
    let password = match (&smtp.password, &smtp.password_env) {
        (Some(password), _) => Some(password.clone()),
        (None, Some(var)) => Some(env(var).ok_or_else(|| ReportError::MissingEnv {
            var: var.clone(),
        })?),
        (None, None) => None,
    };
    let credentials = match (&smtp.user, password) {
        (Some(user), Some(password)) => Some((user.clone(), password)),
        _ => None,
    };
    Ok(SmtpMail {
        to: smtp.to.clone(),
        from: smtp.from.clone(),
        host: smtp.host.clone(),
        port: smtp.port,
        credentials,
        starttls: smtp.starttls,
    })
}

// ---------------------------------------------------------------------------
// Local mail command
// ---------------------------------------------------------------------------

fn send_with_command(command: &str, to: &str, payload: &ReportPayload) -> Result<(), ReportError> {
    // Keeps the staged attachment alive until the command has exited.
    let staging = tempfile::Builder::new()
        .prefix("gitsync-report-")
        .tempdir()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;

    let mut cmd = Command::new(command);
    cmd.arg("-s").arg(&payload.subject);
    if let Some(attachment) = &payload.attachment {
        let path = staging.path().join(&attachment.file_name);
        std::fs::write(&path, &attachment.content).map_err(|e| io_err(&path, e))?;
        cmd.arg("-a").arg(path);
    }
    cmd.arg(to)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let spawn_err = |source| ReportError::MailSpawn {
        command: command.to_string(),
        source,
    };
    let mut child = cmd.spawn().map_err(spawn_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(payload.body.as_bytes())
            .map_err(spawn_err)?;
    }
    let output = child.wait_with_output().map_err(spawn_err)?;

    if !output.status.success() {
        return Err(ReportError::MailCommand {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    tracing::info!(%command, %to, "failure report handed to mail command");
    Ok(())
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Build the MIME message for `payload`.
pub fn build_message(smtp: &SmtpMail, payload: &ReportPayload) -> Result<Message, ReportError> {
    let from: Mailbox = smtp.from.parse()?;
    let to: Mailbox = smtp.to.parse()?;
    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(payload.subject.clone());
    let body = SinglePart::plain(payload.body.clone());

    let message = match &payload.attachment {
        Some(attachment) => builder.multipart(
            MultiPart::mixed().singlepart(body).singlepart(
                MailAttachment::new(attachment.file_name.clone())
                    .body(attachment.content.clone(), ContentType::TEXT_PLAIN),
            ),
        )?,
        None => builder.singlepart(body)?,
    };
    Ok(message)
}

fn send_with_smtp(smtp: &SmtpMail, payload: &ReportPayload) -> Result<(), ReportError> {
    let message = build_message(smtp, payload)?;

    let mut builder = if smtp.starttls {
        SmtpTransport::starttls_relay(&smtp.host)?
    } else {
        SmtpTransport::builder_dangerous(&smtp.host)
    };
    builder = builder.port(smtp.port);
    if let Some((user, password)) = &smtp.credentials {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    builder.build().send(&message)?;
    tracing::info!(host = %smtp.host, to = %smtp.to, "failure report sent over smtp");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Attachment;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            to: "ops@example.com".into(),
            from: "sync@example.com".into(),
            host: "mail.example.com".into(),
            port: 587,
            user: Some("sync".into()),
            password: None,
            password_env: Some("GITSYNC_SMTP_PASSWORD".into()),
            starttls: true,
        }
    }

    fn payload(with_attachment: bool) -> ReportPayload {
        ReportPayload {
            subject: "Error during git-sync for demo".into(),
            body: "Manual intervention required for demo.\n".into(),
            attachment: with_attachment.then(|| Attachment {
                file_name: "git-sync-log-20240301-120000.txt".into(),
                content: "=== demo ===\n> git pull\n".into(),
            }),
        }
    }

    #[test]
    fn none_config_is_no_report() {
        let transport = Transport::from_config(&ReportConfig::None).unwrap();
        assert_eq!(transport, Transport::NoReport);
        transport.deliver(&payload(true)).unwrap();
    }

    #[test]
    fn password_env_is_resolved() {
        let config = ReportConfig::Smtp(smtp_config());
        let transport = Transport::from_config_with(&config, |var| {
            (var == "GITSYNC_SMTP_PASSWORD").then(|| "s3cret".to_string())
        })
        .unwrap();
        match transport {
            Transport::SmtpMail(smtp) => {
                assert_eq!(smtp.credentials, Some(("sync".into(), "s3cret".into())));
            }
            other => panic!("expected smtp, got {other:?}"),
        }
    }

    #[test]
    fn unset_password_env_is_an_error() {
        let config = ReportConfig::Smtp(smtp_config());
        let err = Transport::from_config_with(&config, |_| None).unwrap_err();
        assert!(matches!(err, ReportError::MissingEnv { ref var } if var == "GITSYNC_SMTP_PASSWORD"));
    }

    #[test]
    fn message_carries_attachment() {
        let Transport::SmtpMail(smtp) =
            Transport::from_config_with(&ReportConfig::Smtp(smtp_config()), |_| Some("x".into()))
                .unwrap()
        else {
            panic!("expected smtp");
        };
        let raw = String::from_utf8(build_message(&smtp, &payload(true)).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: Error during git-sync for demo"));
        assert!(raw.contains("git-sync-log-20240301-120000.txt"));
        assert!(raw.contains("multipart/mixed"));

        let plain = String::from_utf8(build_message(&smtp, &payload(false)).unwrap().formatted()).unwrap();
        assert!(!plain.contains("multipart/mixed"));
    }

    #[test]
    fn bad_address_rejected() {
        let smtp = SmtpMail {
            to: "not an address".into(),
            from: "sync@example.com".into(),
            host: "localhost".into(),
            port: 25,
            credentials: None,
            starttls: false,
        };
        let err = build_message(&smtp, &payload(false)).unwrap_err();
        assert!(matches!(err, ReportError::Address(_)));
    }

    #[cfg(unix)]
    mod mail_command {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// A fake `mail` that records its arguments, stdin and attachment.
        fn fake_mail(dir: &TempDir, exit: i32) -> String {
            let script = dir.path().join("mail");
            let out = dir.path().display();
            std::fs::write(
                &script,
                format!(
                    "#!/bin/sh\n\
                     echo \"$@\" > {out}/args\n\
                     cat > {out}/body\n\
                     while [ $# -gt 0 ]; do if [ \"$1\" = -a ]; then cp \"$2\" {out}/attached; fi; shift; done\n\
                     exit {exit}\n"
                ),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            script.display().to_string()
        }

        #[test]
        fn body_on_stdin_and_attachment_by_path() {
            let dir = TempDir::new().unwrap();
            let transport = Transport::CommandLineMail {
                command: fake_mail(&dir, 0),
                to: "ops@example.com".into(),
            };

            transport.deliver(&payload(true)).unwrap();

            let args = std::fs::read_to_string(dir.path().join("args")).unwrap();
            assert!(args.starts_with("-s Error during git-sync for demo -a "));
            assert!(args.trim_end().ends_with("git-sync-log-20240301-120000.txt ops@example.com"));
            let body = std::fs::read_to_string(dir.path().join("body")).unwrap();
            assert_eq!(body, "Manual intervention required for demo.\n");
            let attached = std::fs::read_to_string(dir.path().join("attached")).unwrap();
            assert_eq!(attached, "=== demo ===\n> git pull\n");
        }

        #[test]
        fn no_attachment_no_flag() {
            let dir = TempDir::new().unwrap();
            let transport = Transport::CommandLineMail {
                command: fake_mail(&dir, 0),
                to: "ops@example.com".into(),
            };

            transport.deliver(&payload(false)).unwrap();

            let args = std::fs::read_to_string(dir.path().join("args")).unwrap();
            assert!(!args.contains("-a "));
        }

        #[test]
        fn non_zero_exit_is_mail_command_error() {
            let dir = TempDir::new().unwrap();
            let transport = Transport::CommandLineMail {
                command: fake_mail(&dir, 3),
                to: "ops@example.com".into(),
            };
            let err = transport.deliver(&payload(false)).unwrap_err();
            assert!(matches!(err, ReportError::MailCommand { .. }));
        }

        #[test]
        fn missing_command_is_spawn_error() {
            let transport = Transport::CommandLineMail {
                command: "/nonexistent/gitsync-mail".into(),
                to: "ops@example.com".into(),
            };
            let err = transport.deliver(&payload(false)).unwrap_err();
            assert!(matches!(err, ReportError::MailSpawn { .. }));
        }
    }
}
