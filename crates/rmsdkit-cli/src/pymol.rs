use regex::Regex;
use rmsdkit::engine::error::AlignError;
use rmsdkit::engine::external::ExternalAligner;
use std::env;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const EXECUTABLE_NAMES: [&str; 2] = ["pymol", "pymol2"];

#[cfg(windows)]
const COMMON_LOCATIONS: &[&str] = &[
    r"C:\Program Files\PyMOL\PyMOL.exe",
    r"C:\Program Files (x86)\PyMOL\PyMOL.exe",
];
#[cfg(not(windows))]
const COMMON_LOCATIONS: &[&str] = &[
    "/usr/bin/pymol",
    "/usr/local/bin/pymol",
    "/opt/homebrew/bin/pymol",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const MARKER: &str = "RMSD_VALUE:";

/// Which PyMOL command produces the deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    /// `cmd.align` with five outlier-rejection cycles.
    Align,
    /// `cmd.pair_fit` over all CA atoms.
    PairFit,
}

/// Runs a headless PyMOL process per comparison and reads the deviation it prints.
#[derive(Debug, Clone)]
pub struct PymolAligner {
    executable: PathBuf,
    timeout: Duration,
}

impl PymolAligner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finds a PyMOL executable on `PATH` or in a common install location.
    pub fn locate() -> Result<Self, AlignError> {
        let search_path = env::var_os("PATH").unwrap_or_default();
        let dirs: Vec<PathBuf> = env::split_paths(&search_path).collect();
        let common: Vec<PathBuf> = COMMON_LOCATIONS.iter().map(PathBuf::from).collect();

        let executable = find_executable(&dirs, &common).ok_or_else(|| {
            AlignError::ExternalMethodUnavailable(
                "PyMOL executable not found; install PyMOL or choose another method".to_string(),
            )
        })?;
        info!("Using PyMOL executable at {:?}", executable);
        Ok(Self::new(executable))
    }

    fn run_fit(&self, fit: Fit, reference: &Path, candidate: &Path) -> Result<String, AlignError> {
        let mut script = tempfile::Builder::new()
            .prefix("rmsdkit-")
            .suffix(".pml")
            .tempfile()
            .map_err(external_io)?;
        script
            .write_all(fit_script(fit, reference, candidate).as_bytes())
            .map_err(external_io)?;
        script.flush().map_err(external_io)?;

        let mut stdout = tempfile::tempfile().map_err(external_io)?;
        let mut stderr = tempfile::tempfile().map_err(external_io)?;

        debug!(executable = ?self.executable, ?fit, "Launching PyMOL.");
        let mut child = Command::new(&self.executable)
            .args(["-Q", "-c", "-r"])
            .arg(script.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone().map_err(external_io)?))
            .stderr(Stdio::from(stderr.try_clone().map_err(external_io)?))
            .spawn()
            .map_err(|e| {
                AlignError::ExternalMethodUnavailable(format!(
                    "failed to launch {}: {e}",
                    self.executable.display()
                ))
            })?;

        let started = Instant::now();
        loop {
            if child.try_wait().map_err(external_io)?.is_some() {
                break;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AlignError::ExternalFailure(format!(
                    "PyMOL did not finish within {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }

        let mut output = read_back(&mut stdout)?;
        output.push('\n');
        output.push_str(&read_back(&mut stderr)?);
        Ok(output)
    }
}

impl ExternalAligner for PymolAligner {
    fn name(&self) -> &str {
        "pymol"
    }

    fn align(&self, reference: &Path, candidate: &Path) -> Result<f64, AlignError> {
        let output = self.run_fit(Fit::Align, reference, candidate)?;
        if let Some(deviation) = parse_deviation(&output) {
            return Ok(deviation);
        }

        warn!(
            candidate = %candidate.display(),
            "PyMOL align printed no deviation; retrying with pair_fit."
        );
        let output = self.run_fit(Fit::PairFit, reference, candidate)?;
        parse_deviation(&output).ok_or_else(|| {
            AlignError::ExternalFailure(format!(
                "could not read a deviation from PyMOL output for {}",
                candidate.display()
            ))
        })
    }
}

/// Returns the first existing `pymol`/`pymol2` in `dirs`, then the first existing
/// path in `common`.
fn find_executable(dirs: &[PathBuf], common: &[PathBuf]) -> Option<PathBuf> {
    EXECUTABLE_NAMES
        .iter()
        .flat_map(|name| {
            let file_name = format!("{name}{}", env::consts::EXE_SUFFIX);
            dirs.iter().map(move |dir| dir.join(&file_name))
        })
        .chain(common.iter().cloned())
        .find(|candidate| candidate.is_file())
}

fn fit_script(fit: Fit, reference: &Path, candidate: &Path) -> String {
    let call = match fit {
        Fit::Align => {
            r#"cmd.align("cand_structure and name CA", "ref_structure and name CA", cycles=5, transform=1)"#
        }
        Fit::PairFit => r#"cmd.pair_fit("cand_structure and name CA", "ref_structure and name CA")"#,
    };
    format!(
        "python\n\
         cmd.load({reference:?}, \"ref_structure\")\n\
         cmd.load({candidate:?}, \"cand_structure\")\n\
         result = {call}\n\
         value = result[0] if isinstance(result, (list, tuple)) else result\n\
         print(\"{MARKER}%f\" % value)\n\
         python end\n",
        reference = reference.to_string_lossy(),
        candidate = candidate.to_string_lossy(),
    )
}

static MARKER_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}([0-9.]+)", regex::escape(MARKER)))
        .expect("Failed to compile marker pattern")
});
static REPORTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RMSD?[ \t]*[=:][ \t]*([0-9.]+)").expect("Failed to compile RMSD report pattern")
});

/// Reads the deviation from PyMOL output: the marker line first, then PyMOL's own
/// `RMSD = x` or `RMS = x` report.
fn parse_deviation(output: &str) -> Option<f64> {
    first_value(&MARKER_VALUE, output).or_else(|| first_value(&REPORTED_VALUE, output))
}

fn first_value(pattern: &Regex, output: &str) -> Option<f64> {
    pattern
        .captures_iter(output)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
}

fn read_back(file: &mut File) -> Result<String, AlignError> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).map_err(external_io)?;
    file.read_to_string(&mut content).map_err(external_io)?;
    Ok(content)
}

fn external_io(e: std::io::Error) -> AlignError {
    AlignError::ExternalFailure(format!("PyMOL I/O error: {e}"))
}
