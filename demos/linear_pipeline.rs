//! A linear pipeline over a handful of strings.
//!
//! Run with: cargo run --example linear_pipeline

use venturi::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing so the tap and the logged drain are visible.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let shout = Transform::new("shout", |envelope: &mut Envelope<String>| {
        envelope.data = envelope.data.to_uppercase();
        Ok(Verdict::Forward)
    });

    let mut exec = Pipeline::new()
        .linear(IterSource::new([
            "hello".to_string(),
            "pipeline".to_string(),
        ]))
        .linear(shout)
        .linear(Tap::new("shouted"))
        .linear(Drain::logged())
        .build();

    let elapsed = exec.start(CancellationToken::new()).await?;
    println!("pipeline finished in {elapsed:?}");
    Ok(())
}
