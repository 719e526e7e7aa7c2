//! wayplan CLI binary.
//!
//! All logic is in the library; main.rs only maps the exit code.

fn main() {
    if let Err(code) = wayplan::cli::run() {
        std::process::exit(code);
    }
}
