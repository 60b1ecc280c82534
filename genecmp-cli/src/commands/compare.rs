//! `genecmp compare`: run the pipeline over two SAM or BAM samples.

use anyhow::{Context, Result};
use genecmp_core::{load_reads, BedReader, CompareOptions, GenomeComparator, ReadSource, RunReport};
use std::path::{Path, PathBuf};

use crate::config::{Config, OutputFormat};
use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default)]
pub struct CompareArgs {
    pub first: PathBuf,
    pub second: PathBuf,
    pub regions: PathBuf,
    pub threads: Option<usize>,
    pub verbose_intermediate: bool,
    pub traceback: bool,
    pub max_region_len: Option<usize>,
    pub format: Option<OutputFormat>,
    pub json: Option<PathBuf>,
}

/// File settings first, then any flag given on the command line.
pub fn resolve_options(config: &Config, args: &CompareArgs) -> CompareOptions {
    let mut options = config.compare_options();
    if args.threads.is_some() {
        options.threads = args.threads;
    }
    if let Some(len) = args.max_region_len {
        options.max_region_len = Some(len).filter(|&len| len > 0);
    }
    options.traceback |= args.traceback;
    options.verbose_intermediate |= args.verbose_intermediate;
    options
}

fn require_file(path: &Path) -> CliResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::file_not_found(path.to_path_buf()))
    }
}

pub fn execute(config: &Config, args: CompareArgs) -> Result<RunReport> {
    for path in [&args.first, &args.second, &args.regions] {
        require_file(path)?;
    }
    let options = resolve_options(config, &args);
    log::debug!("Comparison options: {:?}", options);

    let first = load_reads(&args.first)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to load sample {}", args.first.display()))?;
    let second = load_reads(&args.second)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to load sample {}", args.second.display()))?;
    let regions = BedReader::new(&args.regions);

    let verbose = options.verbose_intermediate;
    let sink = GenomeComparator::new(&first, &second)
        .with_options(options)
        .run(&regions)
        .map_err(CliError::from)?;
    let report = RunReport::from_sink(first.name(), second.name(), &sink);

    let format = args.format.unwrap_or(config.output.format);
    match (&args.json, format) {
        (Some(path), _) => {
            let json = report.to_json().context("Failed to serialize report")?;
            std::fs::write(path, json)
                .map_err(CliError::from)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            log::info!("Report written to {}", path.display());
            print!("{}", report.render_text(verbose));
        }
        (None, OutputFormat::Json) => {
            println!("{}", report.to_json().context("Failed to serialize report")?);
        }
        (None, OutputFormat::Text) => print!("{}", report.render_text(verbose)),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_file(suffix: &str, lines: &[&str]) -> NamedTempFile {
        let mut f = Builder::new().suffix(suffix).tempfile().unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.compare.max_region_len = 100;
        config.general.threads = 3;

        let args = CompareArgs {
            threads: Some(2),
            max_region_len: Some(0),
            traceback: true,
            ..CompareArgs::default()
        };
        let options = resolve_options(&config, &args);
        assert_eq!(options.threads, Some(2));
        assert_eq!(options.max_region_len, None);
        assert!(options.traceback);

        let options = resolve_options(&config, &CompareArgs::default());
        assert_eq!(options.threads, Some(3));
        assert_eq!(options.max_region_len, Some(100));
    }

    #[test]
    fn test_missing_input_is_reported() {
        let args = CompareArgs {
            first: PathBuf::from("/nonexistent/father.sam"),
            ..CompareArgs::default()
        };
        let err = execute(&Config::default(), args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_execute_writes_json_report() {
        let father = write_file(".sam", &[
            "@SQ\tSN:chr1\tLN:100",
            "f1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGT\t*",
        ]);
        let son = write_file(".sam", &[
            "@SQ\tSN:chr1\tLN:100",
            "s1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGA\t*",
        ]);
        let regions = write_file(".bed", &["chr1\t0\t8\tGENE1"]);
        let out = Builder::new().suffix(".json").tempfile().unwrap();

        let args = CompareArgs {
            first: father.path().to_path_buf(),
            second: son.path().to_path_buf(),
            regions: regions.path().to_path_buf(),
            threads: Some(2),
            json: Some(out.path().to_path_buf()),
            ..CompareArgs::default()
        };
        let report = execute(&Config::default(), args).unwrap();
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].total_distance, 1);

        let written = std::fs::read_to_string(out.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["summaries"][0]["gene"], "GENE1");
    }

    #[test]
    fn test_unsupported_sample_format() {
        let vcf = write_file(".vcf", &["##fileformat=VCFv4.3"]);
        let regions = write_file(".bed", &["chr1\t0\t8\tGENE1"]);
        let args = CompareArgs {
            first: vcf.path().to_path_buf(),
            second: vcf.path().to_path_buf(),
            regions: regions.path().to_path_buf(),
            ..CompareArgs::default()
        };
        let err = execute(&Config::default(), args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_malformed_record_names_the_record() {
        let father = write_file(".sam", &[
            "@SQ\tSN:chr1\tLN:100",
            "f1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGT\t*",
            "f2\t0\tchr1\t1\t60\t9M\t*\t0\t0\tACGTACGT\t*",
        ]);
        let regions = write_file(".bed", &["chr1\t0\t8\tGENE1"]);
        let args = CompareArgs {
            first: father.path().to_path_buf(),
            second: father.path().to_path_buf(),
            regions: regions.path().to_path_buf(),
            ..CompareArgs::default()
        };
        let err = execute(&Config::default(), args).unwrap_err();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert!(matches!(cli_err, CliError::InvalidFormat { .. }));
        assert!(cli_err.to_string().contains("record 2"));
    }
}
