use crate::cli::CompareArgs;
use crate::config::PartialComparisonConfig;
use crate::error::{CliError, Result};
use crate::pymol::PymolAligner;
use crate::report;
use crate::utils::progress::CliProgressHandler;
use rmsdkit::{
    core::io::file::{StructureFile, StructureFormat},
    engine::{config::Method, external::ExternalAligner, progress::ProgressReporter},
    workflows,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: CompareArgs) -> Result<()> {
    let partial_config = PartialComparisonConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    if !args.reference.is_file() {
        return Err(CliError::Argument(format!(
            "Reference structure file not found: {}",
            args.reference.display()
        )));
    }
    let candidate_paths = collect_candidates(&args)?;
    if candidate_paths.is_empty() {
        return Err(CliError::Argument(
            "No candidate structures specified".to_string(),
        ));
    }

    let reference = StructureFile::new(&args.reference);
    let candidates: Vec<StructureFile> =
        candidate_paths.into_iter().map(StructureFile::new).collect();

    let pymol = if settings.core.method == Method::External {
        match PymolAligner::locate() {
            Ok(aligner) => Some(aligner),
            Err(e) => {
                warn!("{e}; every comparison will be reported as failed.");
                None
            }
        }
    } else {
        None
    };
    let external = pymol.as_ref().map(|a| a as &dyn ExternalAligner);

    println!("Reference structure: {}", args.reference.display());
    println!("Number of candidate structures: {}", candidates.len());
    println!("Calculating RMSD ({} method)...", settings.core.method);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let batch = workflows::compare::compare_batch(
        &reference,
        &candidates,
        &settings.core,
        external,
        &reporter,
    );

    report::write_csv_file(&batch, &settings.output_path)?;
    info!("Report written to {:?}", settings.output_path);

    let rule = "=".repeat(60);
    println!("\nRMSD Results:\n{rule}");
    print!("{}", report::render_table(&batch));
    println!("{rule}");
    println!("\nSummary:");
    print!("{}", report::render_summary(&batch));
    println!("\nResults saved to: {}", settings.output_path.display());

    Ok(())
}

/// Gathers candidate paths from `--candidate`, `--candidates` and `--candidate-dir`,
/// in that order.
fn collect_candidates(args: &CompareArgs) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    if let Some(candidate) = &args.candidate {
        if !candidate.is_file() {
            return Err(CliError::Argument(format!(
                "Candidate structure file not found: {}",
                candidate.display()
            )));
        }
        paths.push(candidate.clone());
    }

    for candidate in &args.candidates {
        if candidate.is_file() {
            paths.push(candidate.clone());
        } else {
            warn!("Candidate structure file not found, skipping: {:?}", candidate);
        }
    }

    if let Some(dir) = &args.candidate_dir {
        paths.extend(structures_in_dir(dir)?);
    }

    Ok(paths)
}

/// Lists the `.pdb` and `.cif` files directly inside `dir`, sorted by file name.
fn structures_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::Argument(format!(
            "Candidate directory not found: {}",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && StructureFormat::is_supported(&path) {
            found.push(path);
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    info!("Found {} candidate structure(s) in {:?}", found.len(), dir);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;

    const TRIPEPTIDE: &str = "\
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  CA  GLY A   2       3.800   0.000   0.000  1.00  0.00           C
ATOM      3  CA  SER A   3       1.900   3.300   0.000  1.00  0.00           C
ATOM      4  CA  LEU A   4       1.900   1.100   3.100  1.00  0.00           C
END
";

    fn compare_args(argv: &[&str]) -> CompareArgs {
        let mut full = vec!["rmsdkit", "compare"];
        full.extend_from_slice(argv);
        let Commands::Compare(args) = Cli::parse_from(full).command;
        args
    }

    #[test]
    fn directory_scan_keeps_supported_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdb", "a.CIF", "notes.txt", "c.ent"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.pdb")).unwrap();

        let found = structures_in_dir(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.CIF", "b.pdb"]);
    }

    #[test]
    fn missing_entries_of_candidate_list_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.pdb");
        fs::write(&present, TRIPEPTIDE).unwrap();
        let missing = dir.path().join("missing.pdb");

        let args = compare_args(&[
            "--reference",
            "ref.pdb",
            "--candidates",
            missing.to_str().unwrap(),
            present.to_str().unwrap(),
        ]);
        assert_eq!(collect_candidates(&args).unwrap(), vec![present]);
    }

    #[test]
    fn missing_single_candidate_is_an_error() {
        let args = compare_args(&["--reference", "ref.pdb", "--candidate", "/nope/x.pdb"]);
        assert!(matches!(
            collect_candidates(&args),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn missing_candidate_directory_is_an_error() {
        let args = compare_args(&["--reference", "ref.pdb", "--candidate-dir", "/nope/dir"]);
        assert!(matches!(
            collect_candidates(&args),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn run_requires_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.pdb");
        fs::write(&reference, TRIPEPTIDE).unwrap();

        let args = compare_args(&["--reference", reference.to_str().unwrap()]);
        assert!(matches!(run(args), Err(CliError::Argument(_))));
    }

    #[test]
    fn run_writes_ranked_report() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.pdb");
        fs::write(&reference, TRIPEPTIDE).unwrap();
        let candidates = dir.path().join("models");
        fs::create_dir(&candidates).unwrap();
        fs::write(candidates.join("same.pdb"), TRIPEPTIDE).unwrap();
        fs::write(candidates.join("empty.pdb"), "END\n").unwrap();
        let outdir = dir.path().join("out");

        let args = compare_args(&[
            "--reference",
            reference.to_str().unwrap(),
            "--candidate-dir",
            candidates.to_str().unwrap(),
            "--method",
            "kabsch",
            "--outdir",
            outdir.to_str().unwrap(),
            "--output",
            "scores.csv",
        ]);
        run(args).unwrap();

        let csv = fs::read_to_string(outdir.join("scores.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2,same.pdb,0.000,Acceptable,1");
        assert!(lines[2].starts_with("1,empty.pdb,,Error: "));
        assert!(lines[2].ends_with(",2"));
    }
}
