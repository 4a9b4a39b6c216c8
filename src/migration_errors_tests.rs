// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for migration error types.

#[cfg(test)]
mod tests {
    use crate::migration_errors::*;

    #[test]
    fn test_provider_error_display_with_request_id() {
        let error = ProviderError::http(409, Some("abc123".to_string()), "conflict");
        assert_eq!(error.to_string(), "conflict (HTTP 409, opc-request-id: abc123)");
    }

    #[test]
    fn test_provider_error_display_without_context() {
        assert_eq!(ProviderError::transport("connection reset").to_string(), "connection reset");
        assert_eq!(
            ProviderError::http(500, None, "boom").to_string(),
            "boom (HTTP 500)"
        );
    }

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::http(401, None, "").is_unauthorized());
        assert!(!ProviderError::http(403, None, "").is_unauthorized());

        assert!(ProviderError::http(403, None, "").is_permission_denied());
        assert!(ProviderError::http(400, None, "")
            .with_code("PERMISSION_DENIED")
            .is_permission_denied());
        assert!(!ProviderError::http(401, None, "").is_permission_denied());

        assert!(ProviderError::http(404, None, "").is_not_found());
        assert!(ProviderError::http(400, None, "")
            .with_code("NOT_FOUND")
            .is_not_found());
        assert!(!ProviderError::transport("x").is_not_found());
    }

    #[test]
    fn test_transfer_refused_mentions_allow_listing() {
        let error = RetrievalError::TransferRefused {
            zone: "example.com".to_string(),
            server: "xfrout1.dynect.net".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("example.com"));
        assert!(message.contains("xfrout1.dynect.net"));
        assert!(message.contains("public IP address"));
    }

    #[test]
    fn test_permission_denied_names_permission() {
        let error = RetrievalError::PermissionDenied {
            zone: "example.com".to_string(),
            permission: "TSIGGet".to_string(),
            reason: "not allowed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing Dyn permission 'TSIGGet' for zone 'example.com': not allowed"
        );
    }

    #[test]
    fn test_record_set_rejected_reports_partial_progress() {
        let error = WriteError::RecordSetRejected {
            zone: "example.com".to_string(),
            owner: "www.example.com".to_string(),
            rtype: "A".to_string(),
            written: 3,
            reason: "invalid rdata".to_string(),
        };
        assert_eq!(error.records_written(), 3);
        assert!(error.to_string().contains("3 record sets written before the failure"));

        let migration = MigrationError::from(error);
        assert_eq!(migration.records_written(), 3);
        assert_eq!(migration.stage(), Stage::Write);
        assert_eq!(migration.kind(), "RecordSetRejected");
    }

    #[test]
    fn test_records_written_zero_outside_write_stage() {
        let error = MigrationError::from(TranslationError::CnameConflict {
            owner: "www.example.com".to_string(),
        });
        assert_eq!(error.records_written(), 0);
        assert_eq!(error.stage(), Stage::Translation);
        assert_eq!(error.kind(), "CnameConflict");
    }

    #[test]
    fn test_migration_error_is_transparent() {
        let inner = TsigError::KeyNotActive {
            key: "xfer-key".to_string(),
            state: "DELETING".to_string(),
        };
        let expected = inner.to_string();
        let error = MigrationError::from(inner);
        assert_eq!(error.to_string(), expected);
        assert_eq!(error.kind(), "TsigKeyNotActive");
        assert_eq!(error.stage(), Stage::Tsig);
    }

    #[test]
    fn test_api_error_kind_and_source() {
        use std::error::Error as _;

        let error = RetrievalError::Api {
            zone: "example.com".to_string(),
            source: ProviderError::http(500, None, "internal"),
        };
        assert!(error.source().is_some());
        assert_eq!(MigrationError::from(error).kind(), "SourceApiError");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Retrieval.to_string(), "retrieval");
        assert_eq!(Stage::Tsig.to_string(), "tsig");
        assert_eq!(Stage::Translation.to_string(), "translation");
        assert_eq!(Stage::Write.to_string(), "write");
    }
}
