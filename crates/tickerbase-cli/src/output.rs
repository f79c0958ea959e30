use serde::Serialize;
use tickerbase_web::Envelope;

use crate::error::CliError;

/// Print a command result wrapped in the same envelope the HTTP API uses.
pub fn render<T: Serialize>(result: T, pretty: bool) -> Result<(), CliError> {
    let envelope = Envelope::ok(result);
    let payload = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{payload}");
    Ok(())
}
