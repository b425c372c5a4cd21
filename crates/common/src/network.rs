use serde::Serialize;

use crate::{Error, Result};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Chain, contract and backend settings for one supported deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub slug: &'static str,
    pub rpc_url: &'static str,
    pub explorer_name: &'static str,
    /// Always ends with `/`.
    pub explorer_url: &'static str,
    pub native_currency: NativeCurrency,
    pub router: &'static str,
    pub gas_price_gwei: &'static str,
    pub api_base_url: &'static str,
}

pub const MANTLE_SEPOLIA: Network = Network {
    chain_id: 5003,
    chain_name: "Mantle Sepolia",
    slug: "mantle-sepolia",
    rpc_url: "https://rpc.sepolia.mantle.xyz/",
    explorer_name: "Mantle Sepolia Explorer",
    explorer_url: "https://sepolia.mantlescan.xyz/",
    native_currency: NativeCurrency {
        name: "Mantle",
        symbol: "MNT",
        decimals: 18,
    },
    router: "0x3e7504d1D69F6F19D6596Ecb0712544831F61f18",
    gas_price_gwei: "0.02",
    api_base_url: "https://verdict-server-1.onrender.com",
};

pub const ARBITRUM_SEPOLIA: Network = Network {
    chain_id: 421614,
    chain_name: "Arbitrum Sepolia",
    slug: "arbitrum-sepolia",
    rpc_url: "https://sepolia-rollup.arbitrum.io/rpc",
    explorer_name: "Arbiscan Sepolia",
    explorer_url: "https://sepolia.arbiscan.io/",
    native_currency: NativeCurrency {
        name: "Sepolia Ether",
        symbol: "ETH",
        decimals: 18,
    },
    router: "0x7C2b85130e5c2A51058773e7932245DF9b4A4D34",
    gas_price_gwei: "0.1",
    api_base_url: "https://verdict-server-2.onrender.com",
};

impl Network {
    /// Every supported deployment, in display order.
    pub fn available() -> [&'static Network; 2] {
        [&MANTLE_SEPOLIA, &ARBITRUM_SEPOLIA]
    }

    /// Look up a deployment by slug, e.g. `"mantle-sepolia"`.
    pub fn from_slug(slug: &str) -> Result<&'static Network> {
        let wanted = slug.trim().to_lowercase();
        Self::available()
            .into_iter()
            .find(|n| n.slug == wanted)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown network '{slug}', expected 'mantle-sepolia' or 'arbitrum-sepolia'"
                ))
            })
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}tx/{tx_hash}", self.explorer_url)
    }

    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}address/{address}", self.explorer_url)
    }

    /// False until a router contract is deployed on this chain.
    pub fn is_ready(&self) -> bool {
        !self.router.eq_ignore_ascii_case(ZERO_ADDRESS)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.chain_name, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lookup_is_case_insensitive() {
        let net = Network::from_slug(" Arbitrum-Sepolia ").unwrap();
        assert_eq!(net.chain_id, 421614);
        assert!(Network::from_slug("mainnet").is_err());
    }

    #[test]
    fn explorer_urls() {
        assert_eq!(
            MANTLE_SEPOLIA.explorer_tx_url("0xdead"),
            "https://sepolia.mantlescan.xyz/tx/0xdead"
        );
        assert_eq!(
            ARBITRUM_SEPOLIA.explorer_address_url("0xbeef"),
            "https://sepolia.arbiscan.io/address/0xbeef"
        );
    }

    #[test]
    fn zero_router_is_not_ready() {
        let undeployed = Network {
            router: ZERO_ADDRESS,
            ..MANTLE_SEPOLIA
        };
        assert!(!undeployed.is_ready());
        assert!(MANTLE_SEPOLIA.is_ready());
    }
}
