pub mod email;
pub mod mailer;

pub use email::{EmailContext, EmailMessage, compose};
pub use mailer::SmtpMailer;
