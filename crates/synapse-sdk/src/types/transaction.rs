use num_bigint::BigUint;
use serde::{Serialize, Serializer};

use super::address::Address;

/// A contract call ready to be handed to a signer.
///
/// Gas, nonce and fee fields are left for the signer to fill in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub chain_id: u64,
    pub to: Address,
    #[serde(serialize_with = "serialize_hex_bytes")]
    pub data: Vec<u8>,
    #[serde(serialize_with = "serialize_quantity")]
    pub value: BigUint,
}

impl UnsignedTransaction {
    pub fn new(chain_id: u64, to: Address, data: Vec<u8>) -> Self {
        Self {
            chain_id,
            to,
            data,
            value: BigUint::default(),
        }
    }

    pub fn with_value(mut self, value: BigUint) -> Self {
        self.value = value;
        self
    }

    /// The 4-byte function selector this transaction calls.
    pub fn selector(&self) -> Option<[u8; 4]> {
        let head = self.data.get(..4)?;
        Some([head[0], head[1], head[2], head[3]])
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_hex_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

fn serialize_quantity<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", value.to_str_radix(16)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let tx = UnsignedTransaction::new(1, Address::ZERO, vec![0xde, 0xad, 0xbe, 0xef])
            .with_value(BigUint::from(255u32));
        let json: serde_json::Value = serde_json::from_str(&tx.to_json().unwrap()).unwrap();
        assert_eq!(json["chainId"], 1);
        assert_eq!(json["data"], "0xdeadbeef");
        assert_eq!(json["value"], "0xff");
        assert_eq!(json["to"], "0x0000000000000000000000000000000000000000");
        assert_eq!(tx.selector(), Some([0xde, 0xad, 0xbe, 0xef]));
    }
}
