//! Scrapes Facebook Marketplace listings by driving the Stagehand
//! browser-automation API against a logged-in browser profile.
//!
//! The crate speaks the Stagehand REST + SSE protocol ([`stagehand`]), wraps a
//! session behind the [`ExtractionAgent`] seam ([`agent`]), runs the
//! Marketplace instruction sequence ([`scout`]) and validates whatever the
//! agent extracted ([`resolver`]) before it is printed ([`display`]).

pub mod agent;
pub mod config;
pub mod display;
pub mod error;
pub mod listing;
pub mod prompt;
pub mod resolver;
pub mod scout;
pub mod stagehand;

pub use agent::{ExtractionAgent, ExtractionResponse};
pub use config::ScoutConfig;
pub use display::render_outcome;
pub use error::{Result, ScoutError, ValidationFault};
pub use listing::{MarketplaceItem, MarketplaceItems, extraction_schema};
pub use resolver::{ParseOutcome, Strategy, resolve};
pub use scout::{MarketplaceScout, ScrapeReport};
pub use stagehand::{
    ActResponseEvent, Credentials, Env, ExtractResponseEvent, LocalBrowserLaunchOptions, Model,
    SessionOptions, Stagehand, TransportChoice,
};
