use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use picshine::{
    Config, GeminiClient, HistoryItem, HistoryStore, InlineImage, OperationKind,
    OperationRequest, UsageTracker, UsageVerdict,
};
use std::env;
use std::fs;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => {}
        Err(_) => eprintln!("No .env file found, using system environment variables"),
    }

    picshine::logger::init_with_config(picshine::logger::LoggerConfig::development())?;
    picshine::logger::log_startup_info("picshine", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    picshine::logger::log_config_info(&config);

    let args: Vec<String> = env::args().collect();
    let (kind, input_path, extra) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            print_usage(&args[0]);
            return Ok(());
        }
    };

    let mut usage = UsageTracker::load(config.usage.clone());
    match usage.try_consume()? {
        UsageVerdict::LimitReached => {
            log::error!(
                "❌ Daily limit of {} enhancements reached; try again tomorrow",
                config.usage.daily_limit
            );
            return Ok(());
        }
        UsageVerdict::NearLimit { remaining } => {
            log::warn!("⚠️  Only {remaining} enhancements left for today");
        }
        UsageVerdict::Allowed { remaining } => {
            log::info!("🔋 {remaining} enhancements remaining today");
        }
    }

    log::info!("🔄 Creating Gemini client...");
    let client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => {
            log::info!("✅ Gemini client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {e}");
            return Err(e.into());
        }
    };

    let request = build_request(kind, input_path, extra)?;

    log::info!("🎨 Running {} on {}...", kind.label(), input_path);
    let response = match client.run(kind, &request).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("❌ {e}");
            return Err(e.into());
        }
    };

    let output_path = write_output(input_path, &response.photo_data_uri)?;
    log::info!("💾 Saved enhanced image to {output_path}");

    let mut history = HistoryStore::load(config.history.clone());
    let file_name = Path::new(input_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    if let Err(e) = history.add(HistoryItem::new(kind, &response.photo_data_uri, file_name)) {
        log::warn!("⚠️  Could not record history: {e}");
    }
    log::info!("🗂️  History now holds {} item(s)", history.items().len());

    Ok(())
}

fn parse_args(args: &[String]) -> Option<(OperationKind, &str, Option<&str>)> {
    let kind = OperationKind::from_arg(args.get(1)?)?;
    let input_path = args.get(2)?;
    Some((kind, input_path, args.get(3).map(String::as_str)))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <operation> <image-path> [filter-or-style]");
    eprintln!("Operations: smart-enhance, colorize, remove-scratches,");
    eprintln!("            focus-enhance-face, sharpen, remove-background, apply-filter");
    eprintln!("Example: {program} apply-filter photo.jpg \"Vintage Film\"");
}

fn build_request(
    kind: OperationKind,
    input_path: &str,
    extra: Option<&str>,
) -> Result<OperationRequest, Box<dyn std::error::Error>> {
    let bytes = fs::read(input_path)?;
    let mime = mime_for_path(input_path);
    let uri = InlineImage::from_bytes(mime, &bytes).to_data_uri();

    let mut request = OperationRequest::from_data_uri(uri);
    match (kind, extra) {
        (OperationKind::ApplyFilter, Some(filter)) => request = request.with_filter(filter),
        (OperationKind::FocusEnhanceFace, Some(style)) => request = request.with_style(style),
        _ => {}
    }
    Ok(request)
}

fn mime_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

fn write_output(input_path: &str, data_uri: &str) -> Result<String, Box<dyn std::error::Error>> {
    let image = InlineImage::parse(data_uri)?;
    let bytes = BASE64.decode(&image.data)?;

    let extension = image.mime_type.strip_prefix("image/").unwrap_or("png");
    let stem = Path::new(input_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let output_path = format!("{stem}_enhanced.{extension}");
    fs::write(&output_path, bytes)?;
    Ok(output_path)
}
