use async_trait::async_trait;
use marketplace_scout::{
    ExtractionAgent, ExtractionResponse, MarketplaceItem, MarketplaceScout, ParseOutcome,
    Result, ScoutError, Strategy, render_outcome,
};
use serde_json::{Value, json};

/// Records every instruction and answers extract with a canned response.
#[derive(Default)]
struct FakeAgent {
    instructions: Vec<String>,
    schemas: Vec<Value>,
    act_results: Vec<bool>,
    extraction: ExtractionResponse,
    fail_extract: bool,
    closed: bool,
}

#[async_trait]
impl ExtractionAgent for FakeAgent {
    async fn act(&mut self, instruction: &str) -> Result<bool> {
        self.instructions.push(instruction.to_string());
        Ok(self.act_results.pop().unwrap_or(true))
    }

    async fn extract(&mut self, instruction: &str, schema: Value) -> Result<ExtractionResponse> {
        self.instructions.push(instruction.to_string());
        self.schemas.push(schema);
        if self.fail_extract {
            return Err(ScoutError::Api("Unknown error".to_string()));
        }
        Ok(self.extraction.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn listings() -> Value {
    json!({"items": [
        {"title": "LG UltraFine 27\"", "price": "250 $", "location": "Montréal, QC", "time_posted": "3 heures"},
        {"title": "Écran Dell 24\"", "price": "60 $", "location": "Longueuil, QC", "time_posted": "Date not specified"}
    ]})
}

#[tokio::test]
async fn test_runs_navigation_then_extraction() {
    let agent = FakeAgent {
        extraction: ExtractionResponse {
            matches_schema: true,
            parsed_response: Some(listings()),
            response: listings().to_string(),
        },
        ..Default::default()
    };
    let mut scout = MarketplaceScout::new(agent, 5);

    let report = scout.run("écrans").await.unwrap();
    assert!(report.matches_schema);
    assert_eq!(
        report.outcome.items().map(|items| items.len()),
        Some(2)
    );

    let agent = scout.into_agent();
    assert_eq!(
        agent.instructions[..5],
        [
            "Navigate to https://facebook.com".to_string(),
            "Click on Marketplace in the left sidebar or navigation menu.".to_string(),
            "Search for \"écrans\".".to_string(),
            "Click on 'date de mise en vente ' to open sale date.".to_string(),
            "Select the option to show items posted in the last 24 hours.".to_string(),
        ]
    );
    assert!(agent.instructions[5].starts_with("Get the first 5 marketplace items"));
    assert_eq!(agent.instructions.len(), 6);
    assert_eq!(agent.schemas[0]["required"], json!(["items"]));
    assert!(!agent.closed);
}

#[tokio::test]
async fn test_recovers_bare_list_when_agent_reports_mismatch() {
    let bare = listings()["items"].clone();
    let agent = FakeAgent {
        extraction: ExtractionResponse {
            matches_schema: false,
            parsed_response: Some(bare.clone()),
            response: bare.to_string(),
        },
        ..Default::default()
    };
    let mut scout = MarketplaceScout::new(agent, 5);

    let report = scout.run("screens").await.unwrap();
    assert!(!report.matches_schema);
    match report.outcome {
        ParseOutcome::Success { items, strategy } => {
            assert_eq!(strategy, Strategy::BareSequence);
            assert_eq!(items[1], MarketplaceItem::new("Écran Dell 24\"", "60 $", "Longueuil, QC", "Date not specified"));
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsuccessful_steps_do_not_stop_the_flow() {
    let agent = FakeAgent {
        act_results: vec![false, false],
        extraction: ExtractionResponse {
            matches_schema: true,
            parsed_response: Some(json!({"items": []})),
            response: "{\"items\":[]}".to_string(),
        },
        ..Default::default()
    };
    let mut scout = MarketplaceScout::new(agent, 3);

    let report = scout.run("desk").await.unwrap();
    assert_eq!(report.outcome.items(), Some(&[][..]));
    assert!(scout.into_agent().instructions[5].starts_with("Get the first 3 marketplace items"));
}

#[tokio::test]
async fn test_free_text_answer_fails_without_detail() {
    let agent = FakeAgent {
        extraction: ExtractionResponse {
            matches_schema: false,
            parsed_response: Some(json!("I could not find any listings.")),
            response: "I could not find any listings.".to_string(),
        },
        ..Default::default()
    };
    let mut scout = MarketplaceScout::new(agent, 5);

    let report = scout.run("screens").await.unwrap();
    let rendered = render_outcome(&report.outcome, 5);
    assert_eq!(rendered, "Failed to extract items: I could not find any listings.\n");
}

#[tokio::test]
async fn test_extract_errors_propagate() {
    let agent = FakeAgent { fail_extract: true, ..Default::default() };
    let mut scout = MarketplaceScout::new(agent, 5);

    let err = scout.run("screens").await.unwrap_err();
    assert_eq!(err.to_string(), "API error: Unknown error");

    scout.agent_mut().close().await.unwrap();
    assert!(scout.into_agent().closed);
}
