use anyhow::Context as _;

use crate::{
    BuildArgs,
    build::{Builder, FailurePolicy},
    config::{SiteConfig, discover_config_file},
};

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = discover_config_file(args.config_file.as_deref(), &args.input);
    let config = SiteConfig::load_from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    };

    let builder = Builder::new(config, args.input.clone(), args.output.clone()).with_policy(policy);
    let report = builder.build()?;

    println!(
        "Built site to {} ({} pages in {} folders, {} media files)",
        report.output_dir.display(),
        report.pages,
        report.folders + 1,
        report.media_files
    );

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("  skipped {}: {}", failure.path.display(), failure.error);
        }
        anyhow::bail!("{} document(s) could not be built", report.failures.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn site(untitled: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path();
        write(input, "site.yaml", "name: Test Site\n");
        write(input, "org/index.org", "#+TITLE: Home\n");
        if untitled {
            write(input, "org/notes/untitled.org", "* No title\n");
        }
        write(input, "templates/default.html", "{{ page.title }}");
        std::fs::create_dir_all(input.join("media")).unwrap();
        dir
    }

    fn args(input: &Path, output: &Path, keep_going: bool) -> BuildArgs {
        BuildArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            config_file: None,
            keep_going,
        }
    }

    #[test]
    fn test_build_succeeds() {
        let input = site(false);
        let output = tempfile::tempdir().unwrap();

        run(&args(input.path(), output.path(), false)).unwrap();

        let index = std::fs::read_to_string(output.path().join("index.html")).unwrap();
        assert_eq!(index, "Home");
    }

    #[test]
    fn test_keep_going_with_skipped_documents_fails() {
        let input = site(true);
        let output = tempfile::tempdir().unwrap();

        let err = run(&args(input.path(), output.path(), true)).unwrap_err();

        assert!(err.to_string().contains("1 document(s) could not be built"));
        // the rest of the site is still written
        assert!(output.path().join("index.html").is_file());
        assert!(!output.path().join("notes/untitled.html").exists());
    }

    #[test]
    fn test_fail_fast_writes_nothing() {
        let input = site(true);
        let output = tempfile::tempdir().unwrap();

        assert!(run(&args(input.path(), output.path(), false)).is_err());
        assert!(!output.path().join("index.html").exists());
    }

    #[test]
    fn test_missing_config_file() {
        let input = site(false);
        std::fs::remove_file(input.path().join("site.yaml")).unwrap();
        let output = tempfile::tempdir().unwrap();

        let err = run(&args(input.path(), output.path(), false)).unwrap_err();
        assert!(format!("{err:#}").contains("could not find configuration file"));
    }
}
