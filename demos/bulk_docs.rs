//! Bulk write and change feed example
//!
//! Writes two documents to a local CouchDB, then follows the database's
//! change feed until interrupted.
//!
//! Run with: cargo run --example bulk_docs -- http://localhost:5984 exampledb

use futures::StreamExt;
use serde_json::json;
use settee::{ClientConfig, PutBulkDocsOperation, SetteeClient, TaskState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let server = args.next().unwrap_or_else(|| "http://localhost:5984".to_string());
    let database = args.next().unwrap_or_else(|| "exampledb".to_string());

    println!("Settee Bulk Docs Example");
    println!("========================\n");

    let config = ClientConfig::default()
        .with_back_off(5, 250)
        .with_max_concurrent_operations(4)
        .with_logging(true);
    let client = SetteeClient::new(&server, config)?;

    let docs = vec![
        json!({"_id": "greeting", "text": "hello"}),
        json!({"_id": "farewell", "text": "goodbye"}),
    ];
    let op = PutBulkDocsOperation::new(database.clone(), docs).with_handler(|result| match result {
        Ok(response) => {
            for doc in &response.results {
                println!("  {} -> {:?} {:?}", doc.id, doc.rev, doc.error);
            }
        }
        Err(e) => eprintln!("bulk write failed: {}", e),
    });

    let task = client.add(op);
    if task.wait().await != TaskState::Completed {
        anyhow::bail!("bulk write was cancelled");
    }

    println!("\nFollowing /{}/_changes (Ctrl-C to stop)", database);
    let mut changes =
        client.long_poll_stream(&format!("/{database}/_changes"), &[("feed", "longpoll")])?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = changes.next() => match next {
                Some(Ok(body)) => println!("change: {}", String::from_utf8_lossy(&body)),
                Some(Err(e)) => eprintln!("poll failed: {}", e),
                None => break,
            },
        }
    }

    Ok(())
}
