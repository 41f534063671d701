//! Line-oriented REPL over stdin/stdout.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::console::commands::Console;
use crate::lifecycle::shutdown::Shutdown;

const PROMPT: &str = "apimock> ";

/// Read commands until `exit`, end of input, or shutdown.
///
/// `exit` triggers the shared shutdown so the server stops too.
pub async fn run(console: Console, shutdown: Shutdown) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut stop = shutdown.subscribe();

    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = stop.recv() => break,
        };
        let Some(line) = line else { break };

        let output = console.execute(&line);
        for text in &output.lines {
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        if output.exit {
            shutdown.trigger();
            break;
        }
    }

    tracing::debug!("Console closed");
    Ok(())
}
