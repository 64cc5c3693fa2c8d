//! Example: feed canned agent responses through the resolver and print them
//! the way the scout does, without a browser session.
//!
//! Run with: `cargo run --example resolve_offline`

use marketplace_scout::{ExtractionResponse, render_outcome, resolve};
use serde_json::json;

fn main() {
    let responses = [
        (
            "keyed items",
            ExtractionResponse::from_payload(
                json!({"items": [
                    {"title": "Moniteur ASUS 24\"", "price": "75 $", "location": "Montréal, QC", "time_posted": "une semaine"},
                    {"title": "Desk", "price": "$20", "location": "City", "time_posted": "2 days"}
                ]}),
                true,
            ),
        ),
        (
            "bare list",
            ExtractionResponse::from_payload(
                json!("[{\"title\": \"TV 55\\\"\", \"price\": \"300 $\", \"location\": \"Laval, QC\", \"time_posted\": \"3 heures\"}]"),
                false,
            ),
        ),
        (
            "record missing a field",
            ExtractionResponse::from_payload(json!({"items": [{"title": "Lamp", "price": "$5"}]}), false),
        ),
        (
            "free text",
            ExtractionResponse::from_payload(json!("The page asked me to log in."), false),
        ),
    ];

    for (label, response) in responses {
        println!("=== {label} ===");
        let outcome = resolve(
            response.parsed_response.as_ref(),
            response.matches_schema,
            &response.response,
        );
        print!("{}", render_outcome(&outcome, 5));
        println!();
    }
}
