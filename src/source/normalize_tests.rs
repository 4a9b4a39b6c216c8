// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for record normalization.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::{raw, soa};

    #[test]
    fn test_soa_sorts_first_and_trailing_soa_is_dropped() {
        let raw = vec![
            soa("example.com."),
            raw("www.example.com.", Some(300), RecordData::A("192.0.2.1".parse().unwrap())),
            raw("a.example.com.", Some(300), RecordData::A("192.0.2.9".parse().unwrap())),
            soa("example.com."),
        ];

        let records = normalize_records("example.com", raw).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].rtype(), "SOA");
        assert_eq!(records[1].owner, "a.example.com");
        assert_eq!(records[2].owner, "www.example.com");
    }

    #[test]
    fn test_names_are_canonicalized() {
        let raw = vec![
            soa("Example.COM."),
            raw("@", Some(3600), RecordData::Mx {
                preference: 10,
                exchange: "Mail.Example.COM.".to_string(),
            }),
            raw("WWW.example.com.", Some(60), RecordData::Cname("LB.Example.NET.".to_string())),
        ];

        let records = normalize_records("example.com.", raw).unwrap();

        assert_eq!(
            records[0].data,
            RecordData::Soa {
                mname: "ns1.example.com".to_string(),
                rname: "hostmaster.example.com".to_string(),
                serial: 2_024_010_101,
                refresh: 3600,
                retry: 600,
                expire: 604_800,
                minimum: 300,
            }
        );
        assert_eq!(records[1].owner, "example.com");
        assert_eq!(
            records[1].data,
            RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com".to_string()
            }
        );
        assert_eq!(records[2].owner, "www.example.com");
        assert_eq!(records[2].data, RecordData::Cname("lb.example.net".to_string()));
    }

    #[test]
    fn test_missing_ttl_defaults_to_soa_minimum() {
        let raw = vec![
            raw("example.com", None, RecordData::Txt(vec![b"hello".to_vec()])),
            soa("example.com"),
        ];

        let records = normalize_records("example.com", raw).unwrap();
        let txt = records.iter().find(|r| r.rtype() == "TXT").unwrap();
        assert_eq!(txt.ttl, 300);
    }

    #[test]
    fn test_missing_ttl_without_soa_fails() {
        let raw = vec![raw("example.com", None, RecordData::Txt(vec![b"hello".to_vec()]))];

        let err = normalize_records("example.com", raw).unwrap_err();
        assert!(matches!(err, RetrievalError::MissingSoa { ref zone } if zone == "example.com"));
    }

    #[test]
    fn test_records_without_soa_are_fine_when_ttls_are_present() {
        let raw = vec![raw("www.example.com", Some(60), RecordData::A("192.0.2.1".parse().unwrap()))];
        assert_eq!(normalize_records("example.com", raw).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicates_keep_largest_ttl() {
        let a = RecordData::A("192.0.2.1".parse().unwrap());
        let raw = vec![
            soa("example.com"),
            raw("www.example.com", Some(60), a.clone()),
            raw("www.example.com.", Some(600), a.clone()),
            raw("WWW.example.com", Some(300), a),
        ];

        let records = normalize_records("example.com", raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ttl, 600);
    }

    #[test]
    fn test_owner_outside_zone_is_rejected() {
        let raw = vec![
            soa("example.com"),
            raw("www.notexample.com", Some(60), RecordData::A("192.0.2.1".parse().unwrap())),
        ];

        let err = normalize_records("example.com", raw).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::MalformedRecord { ref owner, .. } if owner == "www.notexample.com"
        ));
    }

    #[test]
    fn test_output_is_independent_of_input_order() {
        let records = vec![
            soa("example.com"),
            raw("b.example.com", Some(60), RecordData::A("192.0.2.2".parse().unwrap())),
            raw("a.example.com", Some(60), RecordData::Txt(vec![b"x".to_vec()])),
            raw("a.example.com", Some(60), RecordData::A("192.0.2.1".parse().unwrap())),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(
            normalize_records("example.com", records).unwrap(),
            normalize_records("example.com", reversed).unwrap()
        );
    }

    #[test]
    fn test_canonical_data_leaves_text_alone() {
        let txt = RecordData::Txt(vec![b"Mixed Case".to_vec()]);
        assert_eq!(canonical_data(txt.clone()), txt);
    }
}
