use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Top-level progress line.
pub fn step(message: &str) {
    println!("==> {message}");
}

pub fn sub_step(message: &str) {
    println!("  -> {message}");
}

pub fn success(message: &str) {
    println!("{message}");
}

pub fn warning(message: &str) {
    eprintln!("warning: {message}");
}
