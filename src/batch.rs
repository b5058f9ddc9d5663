//! Recipient list to `batchTransfer` arguments

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use crate::amount::{scale_amount, AmountError};
use crate::error::{DistributionError, Result};
use crate::recipients::RecipientList;

/// Parallel `addresses[i]` / `amounts[i]` arrays for one `batchTransfer` call,
/// amounts already scaled to the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    addresses: Vec<Address>,
    amounts: Vec<U256>,
    total: U256,
}

impl TransferBatch {
    pub fn from_parts(addresses: Vec<Address>, amounts: Vec<U256>) -> Result<Self> {
        if addresses.len() != amounts.len() {
            return Err(DistributionError::Submission(format!(
                "Batch length mismatch: {} addresses, {} amounts",
                addresses.len(),
                amounts.len()
            )));
        }

        let total = amounts
            .iter()
            .try_fold(U256::ZERO, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| DistributionError::Submission("Batch total overflows uint256".to_string()))?;

        Ok(Self { addresses, amounts, total })
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn amounts(&self) -> &[U256] {
        &self.amounts
    }

    /// Sum of all amounts, what the treasury must hold
    pub fn total(&self) -> U256 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Address>, Vec<U256>) {
        (self.addresses, self.amounts)
    }
}

/// Scales every recipient amount by `10^decimals`, keeping input order.
///
/// The first invalid amount aborts the whole batch.
pub fn normalize(recipients: &RecipientList, decimals: u8) -> Result<TransferBatch> {
    let mut addresses = Vec::with_capacity(recipients.len());
    let mut amounts = Vec::with_capacity(recipients.len());
    let mut total = U256::ZERO;

    for entry in recipients.iter() {
        let amount_error = |source: AmountError| DistributionError::Amount {
            recipient: entry.address.to_string(),
            source,
        };

        let scaled = scale_amount(&entry.amount, decimals).map_err(amount_error)?;
        total = total
            .checked_add(scaled)
            .ok_or_else(|| amount_error(AmountError::Overflow(format!("batch total + {}", entry.amount))))?;

        if scaled.is_zero() {
            warn!("Recipient {} has a zero amount ({:?})", entry.address, entry.amount);
        }
        debug!("Recipient {}: {} -> {}", entry.address, entry.amount, scaled);

        addresses.push(entry.address);
        amounts.push(scaled);
    }

    Ok(TransferBatch { addresses, amounts, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipients::RecipientEntry;

    fn list(entries: &[(&str, &str)]) -> RecipientList {
        RecipientList::from_entries(
            entries
                .iter()
                .map(|(a, v)| RecipientEntry::new(a.parse().unwrap(), *v))
                .collect(),
        )
        .unwrap()
    }

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2";
    const C: &str = "0xccccccccccccccccccccccccccccccccccccccc3";

    #[test]
    fn test_normalize_scales_to_wei() {
        let batch = normalize(&list(&[(A, "2.5"), (B, "1.0")]), 18).unwrap();

        assert_eq!(batch.addresses(), &[A.parse::<Address>().unwrap(), B.parse().unwrap()]);
        let amounts: Vec<String> = batch.amounts().iter().map(|a| a.to_string()).collect();
        assert_eq!(amounts, vec!["2500000000000000000", "1000000000000000000"]);
        assert_eq!(batch.total().to_string(), "3500000000000000000");
    }

    #[test]
    fn test_normalize_lengths_match_input() {
        let input = list(&[(A, "1"), (B, "0"), (C, "0.000000000000000001")]);
        let batch = normalize(&input, 18).unwrap();

        assert_eq!(batch.len(), input.len());
        assert_eq!(batch.amounts().len(), batch.addresses().len());
        assert_eq!(batch.amounts()[2], U256::from(1));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = list(&[(C, "7"), (A, "0.25"), (B, "3")]);
        assert_eq!(normalize(&input, 6).unwrap(), normalize(&input, 6).unwrap());
    }

    #[test]
    fn test_normalize_rejects_negative() {
        let err = normalize(&list(&[(C, "-1")]), 18).unwrap_err();

        match err {
            DistributionError::Amount { recipient, source } => {
                assert_eq!(recipient.to_lowercase(), C);
                assert!(matches!(source, AmountError::Negative(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_aborts_on_first_bad_entry() {
        let err = normalize(&list(&[(A, "1"), (B, "abc"), (C, "-1")]), 18).unwrap_err();
        assert!(matches!(
            err,
            DistributionError::Amount { source: AmountError::Malformed(_), .. }
        ));
    }

    #[test]
    fn test_from_parts_requires_equal_lengths() {
        let result = TransferBatch::from_parts(vec![A.parse().unwrap()], vec![]);
        assert!(matches!(result, Err(DistributionError::Submission(_))));

        let batch = TransferBatch::from_parts(vec![A.parse().unwrap()], vec![U256::from(5)]).unwrap();
        assert_eq!(batch.total(), U256::from(5));
    }
}
