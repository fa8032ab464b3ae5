//! Basic usage example for birdlime
//!
//! Run with: cargo run --example basic

use std::time::Duration;

use birdlime::{Document, Guard, Result, BLOCKED_EVENT};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("birdlime v{}", birdlime::VERSION);

    // A page with one contact form opted in via data-honeypot
    let doc = Document::new();
    let form = doc.create_element("form");
    doc.set_attribute(form, "data-honeypot", "")?;
    doc.set_attribute(form, "data-honeypot-min-time", "250")?;
    doc.append_child(doc.body(), form)?;

    let email = doc.create_element("input");
    doc.set_attribute(email, "name", "email")?;
    doc.append_child(form, email)?;

    // Arm the guard
    let guard = Guard::new();
    let armed = guard.install(&doc);
    println!("Armed {} form(s)", armed);

    // Watch for blocked submissions
    doc.add_event_listener(form, BLOCKED_EVENT, false, |_, event| {
        println!(
            "  -> honeypot:blocked, detail: {}",
            event.detail().cloned().unwrap_or_default()
        );
    });

    // A bot fills everything it can see (and some things it cannot)
    let honeypot = doc.find_by_name(form, "_hp_field").expect("honeypot field");
    doc.set_value(email, "bot@example.com")?;
    doc.set_value(honeypot, "http://spam.example")?;

    // Instant submit: caught by the timing heuristic
    let event = doc.request_submit(form)?;
    println!("Instant submit cancelled: {}", event.default_prevented());

    // Patient submit: caught by the honeypot heuristic
    std::thread::sleep(Duration::from_millis(300));
    let event = doc.request_submit(form)?;
    println!("Honeypot submit cancelled: {}", event.default_prevented());

    // A human leaves the hidden field alone
    doc.set_value(honeypot, "")?;
    let event = doc.request_submit(form)?;
    println!("Human submit allowed: {}", !event.default_prevented());

    Ok(())
}
