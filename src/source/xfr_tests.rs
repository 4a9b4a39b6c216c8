// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for AXFR retrieval.

#[cfg(test)]
mod tests {
    use super::super::*;
    use hickory_client::rr::rdata::{A, MX, TXT};
    use hickory_client::rr::RecordType;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_response_code_noerror() {
        assert!(response_code_error("example.com", "xfr", 0).is_none());
    }

    #[test]
    fn test_response_code_refused_and_notauth() {
        for code in [5, 9] {
            let err = response_code_error("example.com", "xfrout1.dynect.net", code).unwrap();
            assert!(matches!(
                err,
                RetrievalError::TransferRefused { ref server, .. } if server == "xfrout1.dynect.net"
            ));
        }
    }

    #[test]
    fn test_response_code_tsig_failures() {
        for code in [16, 17, 18] {
            let err = response_code_error("example.com", "xfr", code).unwrap();
            assert!(matches!(err, RetrievalError::AuthenticationFailed { .. }));
        }
    }

    #[test]
    fn test_response_code_other() {
        let err = response_code_error("example.com", "xfr", 2).unwrap();
        assert!(err.to_string().contains("server answered rcode 2"));
    }

    #[test]
    fn test_classify_client_error() {
        assert!(matches!(
            classify_client_error("example.com", "xfr", "response code: Refused"),
            RetrievalError::TransferRefused { .. }
        ));
        assert!(matches!(
            classify_client_error("example.com", "xfr", "tsig error: BADKEY"),
            RetrievalError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            classify_client_error("example.com", "xfr", "connection reset by peer"),
            RetrievalError::TransferFailed { .. }
        ));
    }

    #[test]
    fn test_convert_address_record() {
        let record = Record::from_rdata(name("www.example.com."), 300, RData::A(A::new(192, 0, 2, 1)));

        let converted = convert_record("example.com", &record).unwrap();

        assert_eq!(converted.owner, "www.example.com.");
        assert_eq!(converted.ttl, Some(300));
        assert_eq!(converted.data, RecordData::A("192.0.2.1".parse().unwrap()));
    }

    #[test]
    fn test_convert_mx_record() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::MX(MX::new(10, name("mail.example.com."))),
        );

        let converted = convert_record("example.com", &record).unwrap();

        assert_eq!(
            converted.data,
            RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com.".to_string()
            }
        );
    }

    #[test]
    fn test_convert_txt_keeps_character_strings() {
        let record = Record::from_rdata(
            name("example.com."),
            300,
            RData::TXT(TXT::new(vec!["v=spf1".to_string(), "-all".to_string()])),
        );

        let converted = convert_record("example.com", &record).unwrap();

        assert_eq!(
            converted.data,
            RecordData::Txt(vec![b"v=spf1".to_vec(), b"-all".to_vec()])
        );
    }

    #[test]
    fn test_convert_txt_keeps_non_utf8_octets() {
        let record = Record::from_rdata(
            name("example.com."),
            300,
            RData::TXT(TXT::from_bytes(vec![&[0x61, 0xc8][..], "caf\u{e9}".as_bytes()])),
        );

        let converted = convert_record("example.com", &record).unwrap();

        assert_eq!(
            converted.data,
            RecordData::Txt(vec![vec![0x61, 0xc8], vec![b'c', b'a', b'f', 0xc3, 0xa9]])
        );
    }

    #[test]
    fn test_convert_record_without_data() {
        let record = Record::with(name("www.example.com."), RecordType::A, 300);
        let err = convert_record("example.com", &record).unwrap_err();
        assert!(matches!(err, RetrievalError::MalformedRecord { .. }));
    }

    #[tokio::test]
    async fn test_resolve_literal_socket_address() {
        let client = ZoneTransferClient::new("192.0.2.53:5353");
        let addr = client.resolve("example.com").await.unwrap();
        assert_eq!(addr, "192.0.2.53:5353".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_host_without_port_uses_dns_port() {
        let client = ZoneTransferClient::new("127.0.0.1");
        let addr = client.resolve("example.com").await.unwrap();
        assert_eq!(addr, "127.0.0.1:53".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_builder() {
        let client = ZoneTransferClient::new("xfrout1.dynect.net").with_timeout(Duration::from_secs(5));
        assert_eq!(client.server(), "xfrout1.dynect.net");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert!(client.tsig.is_none());
    }
}
