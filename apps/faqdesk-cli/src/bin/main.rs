use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

use faqdesk_assistant::{format_timestamp, OpenAiAssistant, Orchestrator};
use faqdesk_core::catalog::Catalog;
use faqdesk_core::config::{expand_path, Config};
use faqdesk_core::reservation::{Reservation, ReservationBook};
use faqdesk_embed::get_default_embedder;
use faqdesk_retrieval::{KnowledgeBase, RetrievalEngine, RetrievalOptions};
use faqdesk_vector::{build_store, FaqStore};

const USAGE: &str = "Usage: faqdesk <build [qa.json] | query \"<text>\" [reservation_id] | chat <reservation_id>>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "build" => build(&config, args.first().map(String::as_str)),
        "query" => {
            let query = args.first().ok_or_else(|| anyhow!("{USAGE}"))?;
            let reservation_id = args.get(1).map(|s| parse_reservation_id(s)).transpose()?;
            query_once(&config, query, reservation_id)
        }
        "chat" => {
            let id = args.first().ok_or_else(|| anyhow!("{USAGE}"))?;
            chat(&config, parse_reservation_id(id)?)
        }
        _ => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
    }
}

fn parse_reservation_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse().with_context(|| format!("reservation id must be an integer, got '{raw}'"))
}

fn open_store(config: &Config) -> anyhow::Result<(tokio::runtime::Runtime, FaqStore)> {
    let data = config.data()?;
    let store_dir = expand_path(&data.store_dir);
    std::fs::create_dir_all(&store_dir)?;
    let uri = store_dir.to_string_lossy().into_owned();
    let rt = tokio::runtime::Runtime::new()?;
    let store = rt.block_on(FaqStore::open(&uri, &data.table))?;
    Ok((rt, store))
}

fn build(config: &Config, qa_file: Option<&str>) -> anyhow::Result<()> {
    let data = config.data()?;
    let embedding = config.embedding()?;
    let qa_path = expand_path(qa_file.unwrap_or(&data.qa_file));
    let catalog = Catalog::from_json_file(&qa_path)?;
    println!("Building FAQ store from {} ({} entries)", qa_path.display(), catalog.len());

    let embedder = get_default_embedder(&embedding)?;
    let (rt, store) = open_store(config)?;
    let rows = rt.block_on(build_store(&store, &catalog, embedder.as_ref(), embedding.batch_size))?;
    println!("✅ Build complete ({rows} entries in '{}')", data.table);
    Ok(())
}

fn load_engine(config: &Config) -> anyhow::Result<Arc<RetrievalEngine>> {
    let metric = config.index()?.metric;
    let (rt, store) = open_store(config)?;
    if !rt.block_on(store.exists())? {
        return Err(faqdesk_core::error::Error::NotFound("FAQ store; run `faqdesk build` first".into()).into());
    }
    let (catalog, index) = rt.block_on(store.load_index(metric))?;
    let kb = KnowledgeBase::new(catalog, Arc::new(index))?;
    let embedder = Arc::from(get_default_embedder(&config.embedding()?)?);
    let options = RetrievalOptions::from(&config.retrieval()?);
    Ok(Arc::new(RetrievalEngine::new(Arc::new(kb), embedder, options)?))
}

fn load_reservation(config: &Config, reservation_id: i64) -> anyhow::Result<Reservation> {
    let path = expand_path(&config.data()?.reservations_file);
    let book = ReservationBook::from_json_file(&path)?;
    book.get(reservation_id)
        .cloned()
        .ok_or_else(|| faqdesk_core::error::Error::NotFound(format!("reservation {reservation_id}")).into())
}

fn query_once(config: &Config, query: &str, reservation_id: Option<i64>) -> anyhow::Result<()> {
    let engine = load_engine(config)?;
    let filters = reservation_id.map(|id| load_reservation(config, id)).transpose()?.map(|r| r.metadata_filters());

    let retrieval = engine.retrieve_default(query, filters.as_ref())?;
    if retrieval.is_degraded() {
        eprintln!("⚠️  {} index entries had no catalog row; results may be incomplete", retrieval.faults.len());
    }
    println!("🔍 Found {} results for: \"{query}\"", retrieval.results.len());
    for (i, r) in retrieval.results.iter().enumerate() {
        println!("\n  {}. score={:.4}", i + 1, r.similarity_score);
        println!("     Q: {}", r.question);
        println!("     A: {}", r.answer);
    }
    Ok(())
}

fn chat(config: &Config, reservation_id: i64) -> anyhow::Result<()> {
    let reservation = load_reservation(config, reservation_id)?;
    let engine = load_engine(config)?;
    let settings = config.assistant()?;
    let api = OpenAiAssistant::from_settings(&settings)?;
    let orchestrator = Orchestrator::new(api, engine, &settings);

    println!("Reservation {} for {}", reservation.reservation_id, reservation.customer_name);
    for m in reservation.recent_messages(settings.history_messages) {
        let when = format_timestamp(&m.created).unwrap_or_else(|| m.created.clone());
        println!("  [{when}] {}: {}", m.author, m.text);
    }
    let conversation = orchestrator.start(&reservation)?;
    println!("Type a message, or 'exit' to quit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "exit" || message == "quit" {
            break;
        }
        match orchestrator.reply(&conversation, &reservation, message) {
            Ok(reply) => {
                if reply.degraded {
                    eprintln!("⚠️  FAQ lookup is degraded; this answer may be missing relevant entries");
                }
                println!("{}", reply.text);
            }
            Err(e) => {
                tracing::error!(error = %e, "reply failed");
                eprintln!("Error: {e}");
            }
        }
    }
    Ok(())
}
