use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

type InputResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Deserialise the command input from `--input`, or from JSON piped on
/// stdin. A terminal or an empty pipe counts as no input.
pub fn read_input<T: DeserializeOwned>(path: Option<&str>) -> InputResult<T> {
    let (source, text) = match path {
        Some(path) => {
            let file = resolve_path(path)?;
            let text = fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
            (file.display().to_string(), text)
        }
        None => match piped_stdin()? {
            Some(text) => ("stdin".to_string(), text),
            None => return Err("--input is required (or pipe JSON on stdin)".into()),
        },
    };
    parse(&source, &text)
}

/// Absolute path to an existing regular file.
pub fn resolve_path(path: &str) -> InputResult<PathBuf> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if !resolved.is_file() {
        return Err(format!("Not a readable file: {}", resolved.display()).into());
    }
    Ok(resolved)
}

fn piped_stdin() -> InputResult<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(Some(buffer).filter(|b| !b.trim().is_empty()))
}

fn parse<T: DeserializeOwned>(source: &str, text: &str) -> InputResult<T> {
    serde_json::from_str(text.trim())
        .map_err(|e| format!("Failed to parse {}: {}", source, e).into())
}
