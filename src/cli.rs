use std::io::{self, Write};

use clap::Parser;
use lexis::filter::FilterQuery;
use lexis::parser::{self, Command};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Interactive client for the Lexis API", long_about = None)]
struct Args {
    /// Base URL of a running Lexis server
    #[clap(long, env = "LEXIS_SERVER", default_value = "http://127.0.0.1:8080")]
    server: Url,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let client = Client::new();
    print_banner();

    match client.get(strings_url(&args.server, None)).send().await {
        Ok(_) => println!("[\u{2713}] Connected to Lexis at {}!", args.server),
        Err(_) => {
            println!("[\u{2717}] Could not connect to server at {}.", args.server);
            println!("    Make sure to run 'cargo run --release --bin lexis' in another terminal.");
            return;
        }
    }
    println!("Type 'HELP' for supported commands or 'EXIT' to quit.\n");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("lexis> ");
        if io::stdout().flush().is_err() { break; }
        buffer.clear();

        match stdin.read_line(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if buffer.trim().is_empty() { continue; }

        match parser::parse_command(&buffer) {
            Ok(Command::Exit) => break,
            Ok(cmd) => {
                if let Err(e) = execute_command(&client, &args.server, cmd).await {
                    println!("[\u{26a0}\u{fe0f} Error] {}", e);
                }
            }
            Err(e) => {
                println!("[\u{2717} Syntax Error] {}", e);
                if buffer.trim_start().to_uppercase().starts_with("ANALYZE") {
                    println!("    \u{2139}\u{fe0f}  Hint: Values are double-quoted: ANALYZE \"racecar\"");
                } else if buffer.to_uppercase().contains("WHERE") {
                    println!("    \u{2139}\u{fe0f}  Hint: Try 'LIST WHERE PALINDROME AND LENGTH >= 3'");
                }
            }
        }
    }
}

fn print_banner() {
    println!("\n==================================================");
    println!("   Lexis CLI - String Analysis Console");
    println!("==================================================\n");
}

fn print_help() {
    println!("\n--- Available Commands ---");
    println!("1. ANALYZE:  ANALYZE \"some text\"");
    println!("2. GET:      GET \"some text\"");
    println!("3. LIST:     LIST [WHERE PALINDROME | NOT PALINDROME | LENGTH >= n | LENGTH <= n | WORDS = n | CONTAINS 'c' [AND ...]]");
    println!("4. FIND:     FIND all single word palindromic strings");
    println!("5. DELETE:   DELETE \"some text\"");
    println!("6. EXIT:     Quit\n");
}

async fn execute_command(client: &Client, base: &Url, cmd: Command) -> Result<(), String> {
    match cmd {
        Command::Help => { print_help(); Ok(()) },
        Command::Analyze { value } => perform_analyze(client, base, value).await,
        Command::Get { value } => perform_get(client, base, &value).await,
        Command::List { filter } => perform_list(client, base, &filter).await,
        Command::Find { query } => perform_find(client, base, &query).await,
        Command::Delete { value } => perform_delete(client, base, &value).await,
        Command::Exit => Ok(()),
    }
}

// --- URL HELPERS ---

/// `/strings` or `/strings/{segment}`, with the segment escaped by `Url`.
fn strings_url(base: &Url, segment: Option<&str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("strings");
        if let Some(s) = segment {
            segments.push(s);
        }
    }
    url
}

async fn read_json(resp: reqwest::Response) -> Result<(StatusCode, Value), String> {
    let status = resp.status();
    let body = resp.json::<Value>().await.map_err(|e| e.to_string())?;
    Ok((status, body))
}

fn server_error(status: StatusCode, body: &Value) -> String {
    let message = body["error"].as_str().unwrap_or("no details");
    format!("{} ({})", message, status)
}

fn print_record(record: &Value) {
    let props = &record["properties"];
    println!("  \u{2022} \"{}\"", record["value"].as_str().unwrap_or_default());
    println!("      id:          {}", record["id"].as_str().unwrap_or_default());
    println!(
        "      length: {} | words: {} | unique: {} | palindrome: {}",
        props["length"], props["word_count"], props["unique_characters"], props["is_palindrome"]
    );
    println!("      frequency:   {}", props["character_frequency_map"]);
    println!("      created_at:  {}", record["created_at"].as_str().unwrap_or_default());
}

fn print_records(body: &Value) {
    let empty = Vec::new();
    let data = body["data"].as_array().unwrap_or(&empty);
    println!("\nFound {} matches:", body["count"]);
    for record in data {
        print_record(record);
    }
    println!();
}

// --- NETWORK HANDLERS ---

async fn perform_analyze(client: &Client, base: &Url, value: String) -> Result<(), String> {
    let resp = client
    .post(strings_url(base, None))
    .json(&serde_json::json!({ "value": value }))
    .send()
    .await
    .map_err(|e| e.to_string())?;

    let (status, body) = read_json(resp).await?;
    if status == StatusCode::CREATED {
        println!("[\u{2713} OK] Analyzed:");
        print_record(&body);
        Ok(())
    } else {
        Err(server_error(status, &body))
    }
}

async fn perform_get(client: &Client, base: &Url, value: &str) -> Result<(), String> {
    let resp = client.get(strings_url(base, Some(value))).send().await.map_err(|e| e.to_string())?;

    let (status, body) = read_json(resp).await?;
    match status {
        StatusCode::OK => { print_record(&body); Ok(()) },
        StatusCode::NOT_FOUND => { println!("[\u{2717}] Value Not Found."); Ok(()) },
        _ => Err(server_error(status, &body)),
    }
}

async fn perform_list(client: &Client, base: &Url, filter: &FilterQuery) -> Result<(), String> {
    let resp = client
    .get(strings_url(base, None))
    .query(filter)
    .send()
    .await
    .map_err(|e| e.to_string())?;

    let (status, body) = read_json(resp).await?;
    if status == StatusCode::OK {
        println!("Filters: {}", body["filters_applied"]);
        print_records(&body);
        Ok(())
    } else {
        Err(server_error(status, &body))
    }
}

async fn perform_find(client: &Client, base: &Url, query: &str) -> Result<(), String> {
    let resp = client
    .get(strings_url(base, Some("filter-by-natural-language")))
    .query(&[("query", query)])
    .send()
    .await
    .map_err(|e| e.to_string())?;

    let (status, body) = read_json(resp).await?;
    if status == StatusCode::OK {
        println!("Interpreted as: {}", body["interpreted_query"]["parsed_filters"]);
        print_records(&body);
        Ok(())
    } else {
        Err(server_error(status, &body))
    }
}

async fn perform_delete(client: &Client, base: &Url, value: &str) -> Result<(), String> {
    let resp = client.delete(strings_url(base, Some(value))).send().await.map_err(|e| e.to_string())?;

    match resp.status() {
        StatusCode::NO_CONTENT => {
            println!("[\u{2713} OK] Deleted \"{}\"", value);
            Ok(())
        }
        StatusCode::NOT_FOUND => { println!("[\u{2717}] Value Not Found."); Ok(()) },
        status => {
            let (_, body) = read_json(resp).await?;
            Err(server_error(status, &body))
        }
    }
}
