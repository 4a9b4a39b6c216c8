// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for OCI config file parsing.

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = "\
# OCI CLI configuration
[DEFAULT]
user=ocid1.user.oc1..default
fingerprint=20:3b:97:13:55:1c:aa:bb
key_file=/keys/default.pem
tenancy=ocid1.tenancy.oc1..tenancy
region=us-ashburn-1

; migration account
[MIGRATION]
user = ocid1.user.oc1..migration
key_file = /keys/migration.pem
region = eu-frankfurt-1
pass_phrase =
";

    #[test]
    fn test_default_profile() {
        let profile = parse_profile(CONFIG, "DEFAULT").unwrap();

        assert_eq!(profile.user, "ocid1.user.oc1..default");
        assert_eq!(profile.key_file, PathBuf::from("/keys/default.pem"));
        assert_eq!(profile.region, "us-ashburn-1");
        assert_eq!(
            profile.key_id(),
            "ocid1.tenancy.oc1..tenancy/ocid1.user.oc1..default/20:3b:97:13:55:1c:aa:bb"
        );
    }

    #[test]
    fn test_named_profile_inherits_default() {
        let profile = parse_profile(CONFIG, "MIGRATION").unwrap();

        assert_eq!(profile.user, "ocid1.user.oc1..migration");
        assert_eq!(profile.fingerprint, "20:3b:97:13:55:1c:aa:bb");
        assert_eq!(profile.tenancy, "ocid1.tenancy.oc1..tenancy");
        assert_eq!(profile.region, "eu-frankfurt-1");
        assert_eq!(profile.key_file, PathBuf::from("/keys/migration.pem"));
    }

    #[test]
    fn test_missing_profile() {
        let err = parse_profile(CONFIG, "PROD").unwrap_err();
        assert_eq!(err.to_string(), "Profile 'PROD' not found");
    }

    #[test]
    fn test_missing_required_key() {
        let text = "[DEFAULT]\nuser=u\nfingerprint=f\nkey_file=/k.pem\nregion=r\n";
        let err = parse_profile(text, "DEFAULT").unwrap_err();
        assert_eq!(err.to_string(), "Profile 'DEFAULT' is missing 'tenancy'");
    }

    #[test]
    fn test_key_outside_section() {
        let err = parse_profile("user=u\n[DEFAULT]\n", "DEFAULT").unwrap_err();
        assert!(err.to_string().contains("outside of a [section]"));
    }

    #[test]
    fn test_line_without_equals() {
        let err = parse_profile("[DEFAULT]\nnonsense\n", "DEFAULT").unwrap_err();
        assert_eq!(err.to_string(), "line 2: expected 'key=value'");
    }

    #[test]
    fn test_pass_phrase_is_not_kept() {
        let text = format!("{CONFIG}\n[SECURE]\npass_phrase=open-sesame\n");
        let profile = parse_profile(&text, "SECURE").unwrap();
        assert_eq!(profile.user, "ocid1.user.oc1..default");
        assert!(!format!("{profile:?}").contains("open-sesame"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/etc/oci/config"), PathBuf::from("/etc/oci/config"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/.oci/config"), home.join(".oci/config"));
            assert_eq!(expand_tilde("~"), home);
        }
    }

    #[test]
    fn test_load_profile_and_signer_from_files() {
        let mut key = NamedTempFile::new().unwrap();
        key.write_all(include_bytes!("../../tests/fixtures/oci_test_key.pem"))
            .unwrap();

        let mut config = NamedTempFile::new().unwrap();
        write!(
            config,
            "[DEFAULT]\nuser=u\nfingerprint=f\nkey_file={}\ntenancy=t\nregion=r\n",
            key.path().display()
        )
        .unwrap();

        let profile = load_profile(&config.path().display().to_string(), "DEFAULT").unwrap();
        let signer = profile.signer().unwrap();
        assert_eq!(signer.key_id(), "t/u/f");
    }

    #[test]
    fn test_load_profile_missing_file() {
        let err = load_profile("/nonexistent/oci/config", "DEFAULT").unwrap_err();
        assert!(err.to_string().contains("Failed to read OCI config file"));
    }

    #[test]
    fn test_signer_missing_key_file() {
        let text = "[DEFAULT]\nuser=u\nfingerprint=f\nkey_file=/nonexistent/key.pem\ntenancy=t\nregion=r\n";
        let profile = parse_profile(text, "DEFAULT").unwrap();
        let err = profile.signer().unwrap_err();
        assert!(err.to_string().contains("Failed to read OCI API key"));
    }
}
