mod form;
mod mailer;

pub use form::{FormClient, GoogleFormsClient};
pub use mailer::{Mailer, ResendMailer};
