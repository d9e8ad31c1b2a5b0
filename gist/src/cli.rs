use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::pipeline::Analyzer;

/// Interactive question loop over one file.
///
/// Reads the path (when not given) and then questions from `input`, one per
/// line, writing prompts and answers to `out`. The file is extracted once;
/// each question is summarized against that text. A failed question is
/// reported and the loop continues. `exit` (any case) or end of input stops.
pub async fn ask_loop<R, W>(
    analyzer: &Analyzer,
    path: Option<PathBuf>,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    let path = match path {
        Some(path) => path,
        None => {
            prompt(out, "Enter the path to your file: ")?;
            match lines.next_line().await? {
                Some(line) => PathBuf::from(line.trim().trim_matches(|c| c == '"' || c == '\'')),
                None => return Ok(()),
            }
        }
    };

    if !path.is_file() {
        writeln!(out, "File not found.")?;
        return Ok(());
    }

    let text = match analyzer.extract(&path).await {
        Ok(text) => text,
        Err(e) => {
            writeln!(out, "Error: {e}")?;
            return Ok(());
        }
    };
    writeln!(
        out,
        "Loaded {} ({} characters).",
        path.display(),
        text.chars().count()
    )?;

    loop {
        prompt(out, "\nAsk a question about the file (or type 'exit' to quit): ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }

        match analyzer.summarize_text(question, &text).await {
            Ok(answer) => writeln!(out, "\nAnswer:\n{answer}")?,
            Err(e) => writeln!(out, "\nError: {e}")?,
        }
    }

    Ok(())
}

fn prompt<W: Write>(out: &mut W, message: &str) -> std::io::Result<()> {
    write!(out, "{message}")?;
    out.flush()
}
