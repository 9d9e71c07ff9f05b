use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::warn;

use super::error::{MongoDaoError, MongoResult};

const MAX_PING_ATTEMPTS: u32 = 10;
const INITIAL_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(5);

/// Build a client for the trivia database and wait until it answers a ping.
///
/// Deployments usually start this service and the database together, so the
/// first pings tend to land before the database accepts connections; they
/// are retried with backoff before the connection counts as failed.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt = 0;
    let mut delay = INITIAL_DELAY;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(err) => {
                attempt += 1;
                if attempt >= MAX_PING_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source: err,
                    });
                }
                warn!(attempt, database = database_name, error = %err, "trivia database not answering pings yet");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    Ok((client, database))
}
