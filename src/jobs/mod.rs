//! Background jobs processed by the `jobs work` command.

mod email_job;
mod mailer;

pub use email_job::{email_job_handler, EmailJob};
pub use mailer::{Mailer, QueueMailer};

#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
