use std::process::ExitCode;
use std::sync::Arc;
use clap::Parser;
use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use orchd::config::BUILTIN_PROVIDERS;
use orchd::{Deadline, Error, Orchestrator, Request, VERSION};

/// orchd - multi-LLM orchestrator
///
/// Reads a JSON request on stdin and writes a JSON response to stdout:
///
///   echo '{"prompt":"...","models":[...]}' | orchd
#[derive(Debug, Parser)]
#[command(name = "orchd", disable_version_flag = true)]
struct Cli
{   /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool
  , /// Print the JSON request / model config schema and exit
    #[arg(long)]
    config: bool
  , /// Run environment / provider checks and exit
    #[arg(long)]
    doctor: bool
  , /// Validate a JSON request from stdin and exit (no API calls)
    #[arg(long)]
    check_request: bool
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("warn")
    )
    .target(env_logger::Target::Stderr)
    .init();

    let cli = Cli::parse_from(normalize_args(std::env::args()));
    debug!("Parsed arguments: {:?}", cli);

    if cli.version
    {   println!("orchd {}", VERSION);
        return ExitCode::SUCCESS;
    }
    if cli.config
    {   print_config_schema();
        return ExitCode::SUCCESS;
    }
    if cli.doctor
    {   run_doctor();
        return ExitCode::SUCCESS;
    }
    if cli.check_request
    {   return run_check_request().await;
    }

    match run().await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(msg) => {
          error!("{}", msg);
          eprintln!("{}", msg);
          ExitCode::FAILURE
        }
    }
}

/// Flags the binary understands, after alias rewriting
const KNOWN_FLAGS: [&str; 7] = [
  "-h", "--help", "-v", "--version", "--config", "--doctor", "--check-request"
];

/// Accept the single-dash spellings older callers use and drop
/// anything unrecognised instead of failing.
fn normalize_args<I>(args: I) -> Vec<String>
where
  I: IntoIterator<Item = String>
{   let mut args = args.into_iter();
    let mut out: Vec<String>
      = args.next().into_iter().collect();

    for arg in args
    {   let arg = match arg.as_str()
        {   "-version" => "--version".to_string()
          , "-config" => "--config".to_string()
          , _ => arg
        };
        if KNOWN_FLAGS.contains(&arg.as_str())
        {   out.push(arg);
        } else
        {   warn!("Ignoring unknown argument: {}", arg);
        }
    }
    out
}

/// Default action: dispatch the request from stdin
async fn run() -> Result<(), String>
{   let request = read_request().await?;
    let timeout = request.effective_timeout();
    let stream = request.stream;
    let request = Arc::new(request);

    let orchestrator = Orchestrator::with_defaults();
    let deadline = Deadline::after(timeout);
    let _guard = deadline.guard();

    if stream
    {   let mut stdout = tokio::io::stdout();
        return orchestrator
          .run_stream(&deadline, request, &mut stdout)
          .await
          .map_err(|e| format!("streaming error: {}", e));
    }

    let response = orchestrator.run(&deadline, request).await;
    info!("Collected {} results", response.results.len());

    let mut out = serde_json::to_vec_pretty(&response)
      .map_err(|e| format!("failed to marshal response: {}", e))?;
    out.push(b'\n');

    write_stdout(&out).await
      .map_err(|e| format!("failed to write response: {}", e))
}

async fn write_stdout(bytes: &[u8]) -> Result<(), Error>
{   let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await?;
    Ok(())
}

async fn read_request() -> Result<Request, String>
{   let data = read_stdin().await
      .map_err(|e| format!("failed to read stdin: {}", e))?;
    parse_request(&data)
}

/// Empty (or blank) input and malformed JSON are both fatal
fn parse_request(data: &[u8]) -> Result<Request, String>
{   if data.iter().all(u8::is_ascii_whitespace)
    {   return Err(
          "no input provided on stdin (see --help for usage)".to_string()
        );
    }

    serde_json::from_slice(data)
      .map_err(|e| format!("invalid JSON input: {}", e))
}

async fn read_stdin() -> Result<Vec<u8>, Error>
{   let mut data = vec![];
    tokio::io::stdin().read_to_end(&mut data).await?;
    debug!("Read {} bytes from stdin", data.len());
    Ok(data)
}

/// Parse and validate stdin without calling any provider
async fn run_check_request() -> ExitCode
{   let request = match read_request().await
    {   Ok(request) => request
      , Err(msg) => {
          eprintln!("[check-request] {}", msg);
          return ExitCode::FAILURE;
        }
    };

    let issues = request.validate();
    if !issues.is_empty()
    {   println!("Request is NOT valid:");
        for issue in issues
        {   println!("  - {}", issue);
        }
        return ExitCode::FAILURE;
    }

    println!("Request looks valid.");
    println!("  prompt length: {}", request.prompt.len());
    println!("  code length:   {}", request.code.len());
    println!("  models:        {}", request.models.len());
    for (i, m) in request.models.iter().enumerate()
    {   println!(
          "    [{}] name={:?} provider={:?} model={:?}",
          i, m.name, m.provider, m.model
        );
    }
    if request.timeout_seconds > 0
    {   println!("  timeout_seconds: {}", request.timeout_seconds);
    } else
    {   println!(
          "  timeout_seconds: (not set, default will be {})",
          orchd::config::DEFAULT_TIMEOUT_SECS
        );
    }
    println!("  stream:         {}", request.stream);
    ExitCode::SUCCESS
}

fn print_config_schema()
{   print!(r#"orchd configuration schema

The orchd daemon expects a JSON document on stdin.

ModelConfig (per model):
{{
  "name":        "short caller-facing label (e.g. 'sonnet')",
  "provider":    "provider ID (e.g. 'anthropic', 'openai', 'ollama')",
  "model":       "provider-specific model ID",

  "api_key":     "optional; overrides the provider's env var",
  "endpoint":    "optional; overrides the provider's default endpoint",

  "temperature": 0.0,
  "max_tokens":  0
}}

Request:
{{
  "prompt":          "string prompt (high-level instruction)",
  "code":            "string containing a code snippet",
  "models":          [ ModelConfig, ... ],
  "timeout_seconds": {},
  "stream":          false
}}

Providers:
"#, orchd::config::DEFAULT_TIMEOUT_SECS);

    for p in BUILTIN_PROVIDERS
    {   println!();
        println!("- provider = {:?}", p.id);
        println!("  - Default endpoint: {}", p.endpoint);
        match p.api_key_env
        {   Some(var) => println!("  - API key:   env {} (or ModelConfig.api_key)", var)
          , None => println!("  - No API key used")
        }
    }
}

fn run_doctor()
{   println!("orchd doctor");
    println!("Version: {}", VERSION);
    println!();
    let orchestrator = Orchestrator::with_defaults();
    println!(
      "Registered providers: {}",
      orchestrator.registry().ids().join(", ")
    );
    println!();
    println!("Environment / provider checks:");

    for p in BUILTIN_PROVIDERS
    {   match p.api_key_env
        {   Some(var) => {
              let set = std::env::var(var)
                .map(|v| !v.is_empty())
                .unwrap_or(false);
              if set
              {   println!("  [OK]   {}: {} is set", p.label, var);
              } else
              {   println!(
                    "  [WARN] {}: {} is NOT set (required for provider={:?} unless api_key is set per-model)",
                    p.label, var, p.id
                  );
              }
            }
          , None => {
              println!(
                "  [INFO] {}: no credential needed, default endpoint {}",
                p.label, p.endpoint
              );
            }
        }
    }
}
