//! Receive an OAuth authorization code on a loopback redirect.
//!
//! Prints the redirect URI to register with your authorization server, reads
//! the consent URL from stdin, then opens the browser and waits for the
//! redirect. Ctrl-C cancels the wait instead of killing the process.
//!
//! Run with: cargo run --example receive_code

use oauth_loopback::{CancellationToken, RedirectReceiver};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== oauth-loopback - receive an authorization code ===\n");

    let mut receiver = RedirectReceiver::new();
    let redirect_uri = receiver.redirect_uri()?;

    println!("Redirect URI for this attempt: {redirect_uri}");
    println!("Register it with your authorization server, then build the consent URL.\n");

    print!("Paste the authorization URL to open: ");
    io::stdout().flush()?;

    let mut authorization_url = String::new();
    io::stdin().read_line(&mut authorization_url)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    println!("\nWaiting for the browser to come back (Ctrl-C to abort)...");
    let response = receiver
        .receive_code(authorization_url.trim(), cancel)
        .await?;

    match (response.code(), response.error()) {
        (Some(code), _) => println!("\nAuthorization code: {code}"),
        (None, Some(error)) => println!("\nAuthorization denied: {error}"),
        _ => println!("\nRedirect carried no code."),
    }

    println!("Tip: exchange the code for tokens with your OAuth client.");
    Ok(())
}
