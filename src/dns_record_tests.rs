// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `dns_record.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{DKIMKeySpec, KeyLength, KeyType};
    use crate::dns_record::*;

    fn spec(key_type: KeyType) -> DKIMKeySpec {
        DKIMKeySpec {
            secret_name: "example-com-s1".into(),
            selector: "s1".into(),
            domain: "example.com".into(),
            ttl: 3600,
            key_length: KeyLength::Bits2048,
            key_type,
        }
    }

    #[test]
    fn test_policy_value_rsa() {
        assert_eq!(
            build_policy_value("QUJD", KeyType::Rsa),
            "v=DKIM1; h=sha256; k=rsa;p=QUJD"
        );
    }

    #[test]
    fn test_policy_value_ed25519() {
        assert_eq!(
            build_policy_value("QUJD", KeyType::Ed25519),
            "v=DKIM1; k=ed25519;p=QUJD"
        );
    }

    #[test]
    fn test_chunk_400_bytes() {
        let value = "a".repeat(400);

        let pieces = chunk(&value);

        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].len(), 255);
        assert_eq!(pieces[1].len(), 145);
        assert_eq!(pieces.concat(), value);
    }

    #[test]
    fn test_chunk_short_value_is_single_piece() {
        assert_eq!(chunk("abc"), vec!["abc".to_string()]);
        assert_eq!(chunk(""), vec![String::new()]);
    }

    #[test]
    fn test_chunk_exact_multiple_has_no_empty_tail() {
        let value = "b".repeat(510);

        let pieces = chunk(&value);

        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.len() == 255));
    }

    #[test]
    fn test_chunk_boundary_lengths() {
        for len in [254usize, 255, 256, 764, 765, 766] {
            let value: String = (0..len).map(|i| char::from(b'A' + (i % 26) as u8)).collect();

            let pieces = chunk(&value);

            assert_eq!(pieces.concat(), value, "len {len}");
            assert!(pieces.iter().all(|p| p.len() <= 255), "len {len}");
            assert_eq!(pieces.len(), len.div_ceil(255), "len {len}");
        }
    }

    #[test]
    fn test_chunk_never_splits_multibyte_char() {
        // 254 ASCII bytes followed by a 2-byte character straddling the boundary
        let value = format!("{}é{}", "x".repeat(254), "y".repeat(10));

        let pieces = chunk(&value);

        assert_eq!(pieces[0].len(), 254);
        assert!(pieces.iter().all(|p| p.len() <= 255));
        assert_eq!(pieces.concat(), value);
    }

    #[test]
    fn test_record_from_spec() {
        let record = DnsRecord::new(&spec(KeyType::Ed25519), "QUJD");

        assert_eq!(record.dns_name, "s1._domainkey.example.com");
        assert_eq!(record.ttl, 3600);
        assert_eq!(record.segments, vec!["v=DKIM1; k=ed25519;p=QUJD".to_string()]);
        assert_eq!(record.target(), "\"v=DKIM1; k=ed25519;p=QUJD\"");
    }

    #[test]
    fn test_record_target_quotes_each_segment() {
        let key = "k".repeat(300);
        let record = DnsRecord::new(&spec(KeyType::Rsa), &key);

        let target = record.target();

        assert_eq!(record.segments.len(), 2);
        assert!(target.starts_with("\"v=DKIM1; h=sha256; k=rsa;p=kkk"));
        assert_eq!(target.matches('"').count(), 4);
        assert!(target.contains("\" \""));
    }

    #[test]
    fn test_endpoint() {
        let record = DnsRecord::new(&spec(KeyType::Rsa), "QUJD");

        let endpoint = record.to_endpoint();

        assert_eq!(endpoint.dns_name, "s1._domainkey.example.com");
        assert_eq!(endpoint.record_type, "TXT");
        assert_eq!(endpoint.record_ttl, Some(3600));
        assert_eq!(endpoint.targets.len(), 1);
    }
}
