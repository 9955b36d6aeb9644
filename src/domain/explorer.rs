//! Block explorer links for user-facing reference

use alloy_primitives::{Address, B256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explorer {
    base_url: String,
}

impl Explorer {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{:?}", self.base_url, hash)
    }

    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{}", self.base_url, address.to_checksum(None))
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new("https://basescan.org")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links() {
        let explorer = Explorer::new("https://sepolia.basescan.org/");
        let hash = B256::repeat_byte(0xab);
        assert_eq!(
            explorer.tx_url(&hash),
            format!("https://sepolia.basescan.org/tx/0x{}", "ab".repeat(32))
        );

        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(
            explorer.address_url(&address),
            "https://sepolia.basescan.org/address/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }
}
