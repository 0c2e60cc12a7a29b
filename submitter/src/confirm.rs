use std::io::{BufRead, Write};

/// Ask a yes/no question and wait for the answer.
///
/// Only `y` or `Y` counts as yes. End of input counts as no.
pub fn confirm<R, W>(mut reader: R, mut writer: W, question: &str) -> std::io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(writer, "{question} Press Y/N and then Enter: ")?;
    writer.flush()?;

    let mut answer = String::new();
    reader.read_line(&mut answer)?;

    Ok(matches!(answer.trim(), "y" | "Y"))
}
