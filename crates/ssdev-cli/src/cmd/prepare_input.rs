use crate::output::print_json;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// `--pr=a --pr=b`
    Pr,
    /// `a b`
    Spaces,
}

pub fn run(text: &str, format: InputFormat, json: bool) -> anyhow::Result<()> {
    let items = list_items(text)?;
    if json {
        print_json(&items)?;
    } else {
        println!("{}", render(&items, format));
    }
    Ok(())
}

/// The entries of a markdown list, one per `- ` line.
fn list_items(text: &str) -> anyhow::Result<Vec<String>> {
    text.trim()
        .lines()
        .map(|line| {
            if !line.starts_with("- ") {
                anyhow::bail!("expected a markdown list; line was '{line}'");
            }
            Ok(line.trim_start_matches(['-', ' ']).trim_end().to_string())
        })
        .collect()
}

fn render(items: &[String], format: InputFormat) -> String {
    match format {
        InputFormat::Pr => items
            .iter()
            .map(|i| format!("--pr={i}"))
            .collect::<Vec<_>>()
            .join(" "),
        InputFormat::Spaces => items.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\n- https://github.com/silverstripe/silverstripe-admin/pull/1\n- silverstripe/silverstripe-cms#2\n";

    #[test]
    fn renders_pr_flags() {
        let items = list_items(LIST).unwrap();
        assert_eq!(
            render(&items, InputFormat::Pr),
            "--pr=https://github.com/silverstripe/silverstripe-admin/pull/1 --pr=silverstripe/silverstripe-cms#2"
        );
    }

    #[test]
    fn renders_spaces() {
        let items = list_items(LIST).unwrap();
        assert_eq!(
            render(&items, InputFormat::Spaces),
            "https://github.com/silverstripe/silverstripe-admin/pull/1 silverstripe/silverstripe-cms#2"
        );
    }

    #[test]
    fn rejects_non_list_lines() {
        let err = list_items("- a\nb").unwrap_err();
        assert!(err.to_string().contains("line was 'b'"));
    }
}
