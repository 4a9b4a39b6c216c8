// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cli.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TENANCY: &str = "ocid1.tenancy.oc1..root";

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["zonemigrate", "acme", "migrator"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--zone-name", "example.com"]).unwrap();

        assert_eq!(cli.dynect_customer, "acme");
        assert_eq!(cli.dynect_username, "migrator");
        assert_eq!(cli.oci_config_file, "~/.oci/config");
        assert_eq!(cli.oci_config_profile, "DEFAULT");
        assert_eq!(cli.transfer_server, "xfrout1.dynect.net");
        assert!(!cli.skip_existing);
        assert_eq!(cli.failure_policy(), FailurePolicy::StopOnFailure);
    }

    #[test]
    fn test_zone_selection_is_required() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_zone_name_and_file_conflict() {
        let err = parse(&["--zone-name", "a.example", "--zone-names-file", "zones.txt"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_ignore_failures_flags() {
        let cli = parse(&["--zone-name", "a.example", "--ignore-failures"]).unwrap();
        assert_eq!(cli.failure_policy(), FailurePolicy::ContinueOnFailure);

        let cli = parse(&["--zone-name", "a.example", "--no-ignore-failures"]).unwrap();
        assert_eq!(cli.failure_policy(), FailurePolicy::StopOnFailure);

        let err = parse(&[
            "--zone-name",
            "a.example",
            "--ignore-failures",
            "--no-ignore-failures",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_single_zone_name_is_trimmed() {
        let cli = parse(&["--zone-name", " example.com "]).unwrap();
        assert_eq!(cli.zone_names().unwrap(), vec!["example.com"]);
    }

    #[test]
    fn test_zone_names_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# batch 1\nexample.com\nexample.org").unwrap();
        let path = file.path().display().to_string();

        let cli = parse(&["--zone-names-file", &path]).unwrap();
        assert_eq!(cli.zone_names().unwrap(), vec!["example.com", "example.org"]);
    }

    #[test]
    fn test_compartments_default_to_tenancy() {
        let cli = parse(&["--zone-name", "a.example"]).unwrap();
        let config = cli.migration_config(TENANCY);

        assert_eq!(config.target_compartment, TENANCY);
        assert_eq!(config.tsig_key_compartment, TENANCY);
        assert_eq!(config.source.customer, "acme");
        assert_eq!(config.source.username, "migrator");
    }

    #[test]
    fn test_tsig_compartment_defaults_to_zone_compartment() {
        let cli = parse(&["--zone-name", "a.example", "--oci-compartment", "ocid1.compartment.oc1..dns"])
            .unwrap();
        let config = cli.migration_config(TENANCY);

        assert_eq!(config.target_compartment, "ocid1.compartment.oc1..dns");
        assert_eq!(config.tsig_key_compartment, "ocid1.compartment.oc1..dns");
    }

    #[test]
    fn test_blank_compartments_fall_back() {
        let cli = parse(&[
            "--zone-name",
            "a.example",
            "--oci-compartment",
            "  ",
            "--tsig-key-compartment",
            "",
        ])
        .unwrap();
        let config = cli.migration_config(TENANCY);

        assert_eq!(config.target_compartment, TENANCY);
        assert_eq!(config.tsig_key_compartment, TENANCY);
    }

    #[test]
    fn test_explicit_tsig_compartment_and_skip_existing() {
        let cli = parse(&[
            "--zone-name",
            "a.example",
            "--tsig-key-compartment",
            "ocid1.compartment.oc1..keys",
            "--skip-existing",
        ])
        .unwrap();
        let config = cli.migration_config(TENANCY);

        assert_eq!(config.target_compartment, TENANCY);
        assert_eq!(config.tsig_key_compartment, "ocid1.compartment.oc1..keys");
        assert!(config.skip_existing);
    }
}
