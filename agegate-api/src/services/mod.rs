//! Business services behind the route handlers

pub mod webhook;

pub use webhook::{ProcessedWebhook, WebhookService};
