use std::fs::File;
use std::io::{self, BufReader};

fn usage() -> ! {
    eprintln!("Usage: mapview_emit [input.ndjson]");
    eprintln!();
    eprintln!("Reads one {{\"data\", \"key\", \"extra_keys\"}} object per line (stdin if no");
    eprintln!("path is given) and writes one {{\"key\", \"value\"}} line per emission.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  echo '{{\"data\": {{\"foo\": 1}}, \"key\": [\"a\"]}}' | mapview_emit");
    std::process::exit(2);
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.len() > 1 || args.iter().any(|a| a == "-h" || a == "--help") {
        usage();
    }

    let stdout = io::stdout().lock();
    let result = match args.pop() {
        Some(path) => match File::open(&path) {
            Ok(f) => mapview::ndjson::emit_ndjson(BufReader::new(f), stdout),
            Err(e) => Err(io::Error::new(e.kind(), format!("{path}: {e}"))),
        },
        None => mapview::ndjson::emit_ndjson(io::stdin().lock(), stdout),
    };

    match result {
        Ok(n) => tracing::info!(emitted = n, "done"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
