//! Tests for argument parsing and command execution

#[cfg(test)]
mod tests {
    use clap::Parser;
    use partcurate::io::cli::{Cli, Command, CurationRunner};
    use partcurate::io::error::CurationError;
    use std::path::Path;

    fn write_catalog(dir: &Path) -> Option<std::path::PathBuf> {
        let path = dir.join("catalog.json");
        let catalog = r#"[
            {"id": "p1", "category": "Brakes", "image": "/img/missing.png"},
            {"id": "p2", "category": "Brakes"},
            {"id": "p3", "category": "Filters"}
        ]"#;
        std::fs::write(&path, catalog).ok().map(|()| path)
    }

    // Tests distribute overrides parse into the subcommand
    // Verified by removing the short flag for max_consecutive
    #[test]
    fn test_parse_distribute_arguments() {
        let cli = Cli::try_parse_from([
            "partcurate",
            "distribute",
            "catalog.json",
            "-k",
            "3",
            "--seed",
            "7",
        ]);

        let Ok(cli) = cli else {
            panic!("distribute arguments should parse");
        };
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Distribute {
                max_consecutive: Some(3),
                seed: Some(7),
                switch_probability: None,
                ..
            }
        ));
    }

    // Tests conflicting image sources are rejected at parse time
    // Verified by dropping conflicts_with on root
    #[test]
    fn test_root_conflicts_with_base_url() {
        let cli = Cli::try_parse_from([
            "partcurate",
            "resolve",
            "catalog.json",
            "--root",
            "assets",
            "--base-url",
            "https://shop.test",
        ]);

        assert!(cli.is_err());
        assert!(Cli::try_parse_from(["partcurate", "filter"]).is_err());
    }

    // Tests an out-of-range override fails validation before loading the catalog
    // Verified by applying overrides after validation
    #[test]
    fn test_zero_limit_is_rejected() {
        let cli = Cli::try_parse_from(["partcurate", "distribute", "missing.json", "-k", "0"]);
        let Ok(cli) = cli else {
            panic!("arguments should parse");
        };

        let result = CurationRunner::new(cli).run();
        assert!(matches!(
            result,
            Err(CurationError::InvalidParameter { .. })
        ));
    }

    // Tests distribute and filter run end to end on a small catalog
    // Verified by returning an error for missing image fields
    #[test]
    fn test_run_distribute_and_filter() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let Some(catalog) = write_catalog(dir.path()) else {
            return;
        };
        let catalog = catalog.to_string_lossy().into_owned();

        let distribute = Cli::try_parse_from(["partcurate", "distribute", &catalog, "-s", "1"]);
        assert!(distribute.is_ok());
        if let Ok(cli) = distribute {
            assert!(CurationRunner::new(cli).run().is_ok());
        }

        let filter = Cli::try_parse_from([
            "partcurate",
            "filter",
            "https://cdn.shop.test/a.jpg",
            "https://via.placeholder.com/150",
        ]);
        assert!(filter.is_ok());
        if let Ok(cli) = filter {
            assert!(CurationRunner::new(cli).run().is_ok());
        }
    }

    // Tests resolve against a local asset root reports unresolved items
    // Verified by failing the run when an image is missing
    #[test]
    fn test_run_resolve_with_asset_root() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let Some(catalog) = write_catalog(dir.path()) else {
            return;
        };
        let catalog = catalog.to_string_lossy().into_owned();
        let root = dir.path().to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "partcurate",
            "resolve",
            &catalog,
            "--root",
            &root,
            "--quiet",
            "--stats",
        ]);
        assert!(cli.is_ok());
        if let Ok(cli) = cli {
            assert!(CurationRunner::new(cli).run().is_ok());
        }
    }

    // Tests a missing configuration file surfaces as a load error
    // Verified by falling back to defaults silently
    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from([
            "partcurate",
            "--config",
            "/nonexistent/curation.json",
            "filter",
            "https://cdn.shop.test/a.jpg",
        ]);
        let Ok(cli) = cli else {
            panic!("arguments should parse");
        };

        assert!(matches!(
            CurationRunner::new(cli).run(),
            Err(CurationError::ConfigLoad { .. })
        ));
    }
}
