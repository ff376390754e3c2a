//! Fixed-length identifiers used throughout the wire format.

fixed_length_bytes!(
    /// A 32-byte transaction id: the SHA-256 of the signed transaction bytes.
    TxId,
    32
);

fixed_length_bytes!(
    /// A 32-byte asset id, identifying a fungible token class.
    AssetId,
    32
);

fixed_length_bytes!(
    /// A 32-byte blockchain id.
    BlockchainId,
    32
);

fixed_length_bytes!(
    /// A 20-byte address identifying a spending key. Addresses are totally ordered by byte
    /// comparison.
    Address,
    20
);

impl BlockchainId {
    /// The id of the platform chain: 32 zero bytes, `11111111111111111111111111111111LpoYY`.
    pub const PLATFORM: BlockchainId = BlockchainId([0u8; 32]);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{enc::bases::EncodingError, ser::{ByteFormat, SerError}};

    #[test]
    fn it_displays_ids_as_cb58() {
        assert_eq!(BlockchainId::PLATFORM.to_string(), "11111111111111111111111111111111LpoYY");
        assert_eq!(
            "11111111111111111111111111111111LpoYY".parse::<BlockchainId>().unwrap(),
            BlockchainId::default()
        );
        let addr = Address::new(core::array::from_fn(|i| i as u8));
        assert_eq!(addr.to_cb58(), "12D2adLM3UKy4Z4giRbReR6gjWsUiMiw");
    }

    #[test]
    fn it_reads_from_offsets() {
        let bytes: Vec<u8> = (0u8..40).collect();
        let addr = Address::from_bytes(&bytes, 20).unwrap();
        assert_eq!(addr.as_bytes()[0], 20);
        assert_eq!(addr.as_bytes()[19], 39);

        match Address::from_bytes(&bytes, 21) {
            Err(SerError::BufferSize { need, offset, got }) => {
                assert_eq!((need, offset, got), (20, 21, 19));
            }
            other => panic!("expected buffer size error, got {:?}", other),
        }
        assert!(Address::from_bytes(&bytes, 400).is_err());
    }

    #[test]
    fn it_rejects_payloads_of_the_wrong_length() {
        // a valid cb58 string carrying a 32-byte payload
        match Address::from_cb58("11111111111111111111111111111111LpoYY") {
            Err(EncodingError::BadLength { expected, got }) => assert_eq!((expected, got), (20, 32)),
            other => panic!("expected bad length, got {:?}", other),
        }
        assert!(matches!(
            TxId::from_cb58("11111111111111111111111111111111LpoYZ"),
            Err(EncodingError::Checksum)
        ));
    }

    #[test]
    fn it_orders_addresses_bytewise() {
        let mut a = [0u8; 20];
        let mut b = [0u8; 20];
        a[0] = 1;
        b[19] = 0xff;
        assert!(Address::new(b) < Address::new(a));
    }

    #[test]
    fn it_serializes_with_serde_as_cb58() {
        let json = serde_json::to_string(&BlockchainId::PLATFORM).unwrap();
        assert_eq!(json, "\"11111111111111111111111111111111LpoYY\"");
        let id: BlockchainId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, BlockchainId::PLATFORM);
        assert_eq!(TxId::default().serialize_hex(), "00".repeat(32));
    }
}
