//! Silent-success example for birdlime
//!
//! A blocked bot is shown a pristine form and a success message, so the
//! block decision never leaks. Run with: cargo run --example silent_success

use birdlime::{Document, Guard, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let doc = Document::new();
    let form = doc.create_element("form");
    doc.set_attribute(form, "data-honeypot", "")?;
    doc.set_attribute(form, "data-honeypot-behavior", "silent-success")?;
    doc.set_attribute(form, "data-honeypot-min-time", "0")?;
    doc.append_child(doc.body(), form)?;

    let message = doc.create_element("textarea");
    doc.set_attribute(message, "name", "message")?;
    doc.append_child(form, message)?;

    // Webflow-style result banners
    let done = doc.create_element("div");
    doc.set_attribute(done, "class", "w-form-done")?;
    doc.append_child(form, done)?;
    let fail = doc.create_element("div");
    doc.set_attribute(fail, "class", "w-form-fail")?;
    doc.append_child(form, fail)?;

    let guard = Guard::new();
    guard.install(&doc);

    // The bot fills the visible field and the hidden one
    let honeypot = doc.find_by_name(form, "_hp_field").expect("honeypot field");
    doc.set_value(message, "BUY NOW http://spam.example")?;
    doc.set_value(honeypot, "http://spam.example")?;

    let event = doc.request_submit(form)?;
    println!("Submission cancelled: {}", event.default_prevented());
    println!("Message field after submit: {:?}", doc.value(message)?);
    println!(
        "Success banner visible: {}",
        doc.style(done, "display").as_deref() == Some("block")
    );
    println!(
        "Failure banner hidden: {}",
        doc.style(fail, "display").as_deref() == Some("none")
    );

    Ok(())
}
