#![forbid(unsafe_code)]

use viewx::util::{OutputIntegration, output_for};

fn main() {
    viewx::cli::init_tracing();
    let integration = OutputIntegration::detect();
    let Err(error) = viewx::run_from_env() else {
        return;
    };
    let code = error.exit_code();
    if integration.should_emit_json() {
        eprintln!(
            "{}",
            serde_json::json!({
                "command": "viewx",
                "status": "failed",
                "error": error.to_string(),
                "exit_code": code,
                "integration": integration,
            })
        );
    } else {
        output_for(&integration).error(&error.to_string());
    }
    std::process::exit(code);
}
