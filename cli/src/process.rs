use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::ValueEnum;
use tracing::warn;
use win_sddl::SecurityDescriptor;

/// Line encoding on either side of the conversion.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Base64 of the self-relative bytes.
    Binary,
    /// SDDL text.
    String,
}

/// What [`process`] does with each line.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Encoding of input lines; ignored in file mode.
    pub input: Format,
    /// Encoding of output lines.
    pub output: Format,
    /// Lines are file paths whose descriptors are fetched from the OS.
    pub file_mode: bool,
    /// Indented dump instead of SDDL for string output.
    pub debug: bool,
}

/// Lines seen by [`process`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Lines written to the output.
    pub converted: usize,
    /// Lines reported as failures.
    pub failed: usize,
}

/// Converts every non-blank line of `reader`.
///
/// Results go to `out`, one per line. A line that fails is reported to
/// `err` as `line N: ...` and skipped.
///
/// # Errors
/// Only I/O failures on the three streams.
pub fn process<R, W, E>(reader: R, out: &mut W, err: &mut E, config: &Config) -> Result<Summary>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut summary = Summary::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("error reading input")?;
        let line_number = index + 1;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match convert(input, config) {
            Ok(output) => {
                writeln!(out, "{output}").context("error writing output")?;
                summary.converted += 1;
            }
            Err(error) => {
                warn!(line = line_number, "conversion failed");
                writeln!(err, "line {line_number}: {error:#}").context("error writing diagnostics")?;
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

fn convert(input: &str, config: &Config) -> Result<String> {
    if config.file_mode {
        let bytes = read_file(input).with_context(|| format!("error processing file {input:?}"))?;
        return match config.output {
            Format::Binary => Ok(STANDARD.encode(bytes)),
            Format::String => {
                let sd = SecurityDescriptor::from_bytes(&bytes)
                    .with_context(|| format!("error processing file {input:?}"))?;
                render_string(&sd, config.debug)
            }
        };
    }

    let sd = match config.input {
        Format::Binary => {
            let bytes = STANDARD.decode(input).context("error decoding base64")?;
            SecurityDescriptor::from_bytes(&bytes).context("error parsing security descriptor")?
        }
        Format::String => input
            .parse::<SecurityDescriptor>()
            .context("error parsing security descriptor string")?,
    };
    match config.output {
        Format::Binary => {
            let bytes = sd.to_bytes().context("error encoding security descriptor")?;
            Ok(STANDARD.encode(bytes))
        }
        Format::String => render_string(&sd, config.debug),
    }
}

fn render_string(sd: &SecurityDescriptor, debug: bool) -> Result<String> {
    if debug {
        Ok(sd.to_indented_string(0).trim_end().to_owned())
    } else {
        sd.to_sddl().context("error rendering security descriptor")
    }
}

#[cfg(windows)]
fn read_file(path: &str) -> Result<Vec<u8>> {
    Ok(win_sddl::read_file_security(path)?)
}

#[cfg(not(windows))]
fn read_file(_path: &str) -> Result<Vec<u8>> {
    anyhow::bail!("not supported on this platform")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;

    const SDDL: &str = "O:SYG:BAD:(A;;FA;;;SY)(D;;FR;;;WD)";

    fn config(input: Format, output: Format) -> Config {
        Config {
            input,
            output,
            file_mode: false,
            debug: false,
        }
    }

    fn run(input: &str, config: &Config) -> (String, String, Summary) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let summary = process(input.as_bytes(), &mut out, &mut err, config).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            summary,
        )
    }

    fn encoded() -> String {
        let sd: SecurityDescriptor = SDDL.parse().unwrap();
        STANDARD.encode(sd.to_bytes().unwrap())
    }

    #[test]
    fn binary_to_string() {
        let (out, err, summary) = run(&format!("{}\n", encoded()), &config(Format::Binary, Format::String));
        assert_eq!(out, format!("{SDDL}\n"));
        assert!(err.is_empty(), "unexpected diagnostics: {err}");
        assert_eq!(summary, Summary { converted: 1, failed: 0 });
    }

    #[test]
    fn string_to_binary() {
        let (out, _, _) = run(SDDL, &config(Format::String, Format::Binary));
        assert_eq!(out, format!("{}\n", encoded()));
    }

    #[test]
    fn string_to_string_normalizes() {
        let (out, _, _) = run("D:(D;;FR;;;WD)G:BAO:SY", &config(Format::String, Format::String));
        assert_eq!(out, "O:SYG:BAD:(D;;FR;;;WD)\n");
    }

    #[test]
    fn failures_are_reported_and_skipped() {
        let input = format!("not base64!\n\n{}\nAQA=\n", encoded());
        let (out, err, summary) = run(&input, &config(Format::Binary, Format::String));
        assert_eq!(out, format!("{SDDL}\n"));
        let lines: Vec<&str> = err.lines().collect();
        assert_eq!(lines.len(), 2, "diagnostics: {err}");
        assert!(lines[0].starts_with("line 1: error decoding base64"), "{}", lines[0]);
        assert_eq!(
            lines[1],
            "line 4: error parsing security descriptor: invalid security descriptor: it must be 20 bytes length at minimum, got 2"
        );
        assert_eq!(summary, Summary { converted: 1, failed: 2 });
    }

    #[test]
    fn nested_errors_are_reported_once() {
        let (out, err, summary) = run(
            "O:SYD:(A;;FA;;;SY)(X;;;;;SY)\nO:SYG:S-2-5-18\n",
            &config(Format::String, Format::String),
        );
        assert!(out.is_empty(), "{out}");
        assert_eq!(
            err,
            "line 1: error parsing security descriptor string: error parsing DACL: error parsing ACE 1: invalid ACE type: X\n\
             line 2: error parsing security descriptor string: error parsing group SID: invalid SID revision\n"
        );
        assert_eq!(summary, Summary { converted: 0, failed: 2 });
    }

    #[test]
    fn debug_dumps_structure() {
        let config = Config {
            debug: true,
            ..config(Format::String, Format::String)
        };
        let (out, _, _) = run(SDDL, &config);
        assert!(out.starts_with("SecurityDescriptor:\n"), "{out}");
        assert!(out.contains("Owner: S-1-5-18 (SY)"), "{out}");
        assert!(out.ends_with("SACL: <none>\n"), "{out}");
    }

    #[cfg(not(windows))]
    #[test]
    fn file_mode_is_unsupported_off_windows() {
        let config = Config {
            file_mode: true,
            ..config(Format::Binary, Format::String)
        };
        let (out, err, _) = run("/etc/passwd\n", &config);
        assert!(out.is_empty());
        assert_eq!(
            err,
            "line 1: error processing file \"/etc/passwd\": not supported on this platform\n"
        );
    }
}
