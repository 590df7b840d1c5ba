/// Ledger monetary constants
///
/// All amounts are atomic units. These are the defaults; the issuance bounds
/// and the genesis allocation can be overridden through configuration.
///
/// Issuance policy starting point, before any learned adjustment
pub const BASE_SUBSIDY: u64 = 50_000_000;

/// Lowest subsidy the issuance policy may grant
pub const MIN_SUBSIDY: u64 = 1_000_000;

/// Highest subsidy the issuance policy may grant
pub const MAX_SUBSIDY: u64 = 200_000_000;

/// Amount credited by the genesis coinbase
pub const GENESIS_ALLOCATION: u64 = 100_000_000_000;

/// Address receiving the genesis allocation
pub const GENESIS_ADDRESS: &str = "genesis";

/// Fee used by the CLI `send` command when none is given
pub const DEFAULT_TRANSACTION_FEE: u64 = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monetary_constants() {
        const _: () = assert!(MIN_SUBSIDY <= BASE_SUBSIDY);
        const _: () = assert!(BASE_SUBSIDY <= MAX_SUBSIDY);
        assert!(GENESIS_ALLOCATION > MAX_SUBSIDY);
    }
}
