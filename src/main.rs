//! genui CLI binary entry point.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clap::Parser;
use futures::FutureExt;
use genui::cli::{
    describe_event, init_tracing, is_affirmative, parse_action_choice, Cli, Commands, RunArgs,
};
use genui::config::GenUiConfig;
use genui::orchestration::{
    LoopState, Orchestrator, RenderRetryHandler, RenderRetryRequest, RetryDecision, RunController,
    RunStatus, UiEvent, UiEventSink,
};
use genui::tools::{all_declarations, HttpTodoApi, SiteToolExecutor};
use genui::types::ActionSpec;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Tools => handle_tools(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn handle_tools() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&all_declarations())?);
    Ok(())
}

async fn handle_run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GenUiConfig::load_from(args.config.as_deref())?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(model) = args.render_model {
        config = config.with_render_model(model);
    }
    if let Some(url) = args.todo_api_url {
        config = config.with_todo_api_url(url);
    }
    if let Some(dir) = &args.html_dir {
        std::fs::create_dir_all(dir)?;
    }

    let api = Arc::new(HttpTodoApi::new(&config.todo_api_url)?);
    let executor = Arc::new(SiteToolExecutor::new(api));

    let offered: Arc<Mutex<Vec<ActionSpec>>> = Arc::new(Mutex::new(Vec::new()));
    let orchestrator = Orchestrator::from_config(&config, executor)?
        .with_event_sink(terminal_sink(offered.clone(), args.html_dir.clone()))
        .with_retry_handler(terminal_retry_handler());

    let handle = orchestrator.execute(args.prompt);

    let interrupt = handle.controller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.abort_with_reason("interrupted");
        }
    });
    tokio::spawn(prompt_for_actions(handle.controller(), offered));

    let result = handle.wait().await;
    match result.status {
        RunStatus::Completed => Ok(()),
        RunStatus::Aborted => {
            eprintln!("aborted");
            Ok(())
        }
        RunStatus::Errored => Err(result
            .error
            .unwrap_or_else(|| "run failed".to_string())
            .into()),
    }
}

fn terminal_sink(offered: Arc<Mutex<Vec<ActionSpec>>>, html_dir: Option<PathBuf>) -> UiEventSink {
    let step = AtomicUsize::new(0);
    Arc::new(move |event: UiEvent| {
        if let UiEvent::ActionRequired { actions } = &event {
            *offered.lock().unwrap_or_else(|p| p.into_inner()) = actions.clone();
        }
        if let (UiEvent::Ui { html }, Some(dir)) = (&event, &html_dir) {
            if !html.is_empty() {
                let n = step.fetch_add(1, Ordering::SeqCst) + 1;
                let path = dir.join(format!("step-{n}.html"));
                if let Err(err) = std::fs::write(&path, html) {
                    eprintln!("could not write {}: {err}", path.display());
                }
            }
        }
        if let Some(line) = describe_event(&event) {
            match event {
                UiEvent::Response { .. } => println!("{line}"),
                _ => eprintln!("{line}"),
            }
        }
    })
}

fn terminal_retry_handler() -> RenderRetryHandler {
    Arc::new(|request: RenderRetryRequest| {
        async move {
            eprintln!("Rendering failed: {}", request.error);
            let answer = read_line("Retry once? [y/N] ").await.unwrap_or_default();
            if is_affirmative(&answer) {
                RetryDecision::Retry
            } else {
                RetryDecision::Decline
            }
        }
        .boxed()
    })
}

async fn prompt_for_actions(controller: RunController, offered: Arc<Mutex<Vec<ActionSpec>>>) {
    loop {
        let state = controller.wait_for_state(LoopState::AwaitingUserAction).await;
        if state.is_terminal() {
            return;
        }
        let actions = offered.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let Some(line) = read_line("> ").await else {
            return;
        };
        match parse_action_choice(&line, &actions) {
            Some(action) => {
                controller.submit_user_action(action);
                let mut rx = controller.subscribe();
                let _ = rx
                    .wait_for(|state| *state != LoopState::AwaitingUserAction)
                    .await;
            }
            None => eprintln!("Unknown choice '{}'", line.trim()),
        }
    }
}

async fn read_line(prompt: &'static str) -> Option<String> {
    tokio::task::spawn_blocking(move || {
        eprint!("{prompt}");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
    .await
    .ok()
    .flatten()
}
