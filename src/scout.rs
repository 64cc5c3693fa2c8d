//! The Marketplace scraping flow: a fixed sequence of natural-language
//! instructions followed by one schema-constrained extraction.

use crate::agent::ExtractionAgent;
use crate::error::Result;
use crate::listing::extraction_schema;
use crate::resolver::{ParseOutcome, resolve};

pub const STARTING_PAGE: &str = "https://facebook.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub outcome: ParseOutcome,
    /// What the agent claimed about its own payload.
    pub matches_schema: bool,
}

pub struct MarketplaceScout<A> {
    agent: A,
    max_items: usize,
}

impl<A: ExtractionAgent> MarketplaceScout<A> {
    pub fn new(agent: A, max_items: usize) -> Self {
        Self { agent, max_items }
    }

    /// The navigation steps run before extraction, in order.
    pub fn navigation_steps(search_item: &str) -> Vec<String> {
        vec![
            format!("Navigate to {STARTING_PAGE}"),
            "Click on Marketplace in the left sidebar or navigation menu.".to_string(),
            format!("Search for \"{search_item}\"."),
            "Click on 'date de mise en vente ' to open sale date.".to_string(),
            "Select the option to show items posted in the last 24 hours.".to_string(),
        ]
    }

    pub fn extraction_instruction(&self) -> String {
        format!(
            "Get the first {} marketplace items from the search results. For each item, extract the title, \
             price, location, and only the time portion from \"Publié il y a\" (for example: if you see \
             \"Publié il y a une semaine dans Montréal, QC\", extract only \"une semaine\"). \
             If no time is found, use \"Date not specified\".",
            self.max_items
        )
    }

    pub async fn run(&mut self, search_item: &str) -> Result<ScrapeReport> {
        for step in Self::navigation_steps(search_item) {
            log::info!("{step}");
            if !self.agent.act(&step).await? {
                log::warn!("Agent did not report success for: {step}");
            }
        }

        log::info!("Extracting up to {} items", self.max_items);
        let response = self
            .agent
            .extract(&self.extraction_instruction(), extraction_schema())
            .await?;

        let outcome = resolve(
            response.parsed_response.as_ref(),
            response.matches_schema,
            &response.response,
        );
        match &outcome {
            ParseOutcome::Success { items, strategy } => {
                if !response.matches_schema {
                    log::warn!("Agent flagged a schema mismatch; recovered {} items via {strategy:?}", items.len());
                } else {
                    log::debug!("Resolved {} items via {strategy:?}", items.len());
                }
            }
            ParseOutcome::Failure { .. } => log::warn!("Extraction result could not be validated"),
        }

        Ok(ScrapeReport { outcome, matches_schema: response.matches_schema })
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn into_agent(self) -> A {
        self.agent
    }
}
