//! AJAX submission of account page forms with transient notifications.
//!
//! [`pipeline::submit::FormPipeline`] is the entry point: it busies the
//! triggering control, sends the form, turns whatever comes back into a
//! status-tagged response, shows it as a banner and follows a success
//! redirect. The page it runs in is reached only through
//! [`surface::surface::Surface`].

pub mod account;
pub mod cli;
pub mod form;
pub mod notify;
pub mod pipeline;
pub mod surface;
pub mod trace;
